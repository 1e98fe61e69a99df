//! Sections
//!
//! The analyses a profile can run, and the fixed-shape data payload a
//! section renders its results into.
use crate::analyzers::{self, AnalysisContext, DriftOptions, UtilityColumns};
use crate::errors::DriftLensError;
use crate::utils::items_to_strings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// One analysis part of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Feature distribution drift between the datasets.
    DataDrift,
    /// Drift of the target and prediction label distributions.
    CatTargetDrift,
    /// Error profile of a regression model.
    RegressionPerformance,
    /// Quality of a classifier logging hard labels.
    ClassificationPerformance,
    /// Quality of a classifier logging class probabilities.
    ProbClassificationPerformance,
}

impl FromStr for Section {
    type Err = DriftLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data_drift" => Ok(Section::DataDrift),
            "cat_target_drift" => Ok(Section::CatTargetDrift),
            "regression_performance" => Ok(Section::RegressionPerformance),
            "classification_performance" => Ok(Section::ClassificationPerformance),
            "prob_classification_performance" => Ok(Section::ProbClassificationPerformance),
            _ => Err(DriftLensError::ParseString(
                s.to_string(),
                "Section".to_string(),
                items_to_strings(vec![
                    "data_drift",
                    "cat_target_drift",
                    "regression_performance",
                    "classification_performance",
                    "prob_classification_performance",
                ]),
            )),
        }
    }
}

/// Payload of one profile part. Every section carries the same frame
/// around its metrics; only the data drift section adds the options it
/// was calculated with.
#[derive(Serialize)]
struct SectionData<'a, M: Serialize> {
    utility_columns: UtilityColumns,
    cat_feature_names: &'a [String],
    num_feature_names: &'a [String],
    target_names: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a DriftOptions>,
    metrics: M,
}

impl Section {
    /// Key of the section's part in the rendered profile json.
    pub(crate) fn part_key(&self) -> &'static str {
        match self {
            Section::DataDrift => "data_drift",
            Section::CatTargetDrift => "cat_target_drift",
            Section::RegressionPerformance => "regression_performance",
            Section::ClassificationPerformance => "classification_performance",
            Section::ProbClassificationPerformance => "probabilistic_classification_performance",
        }
    }

    /// Run the section's analysis and render its data payload.
    pub(crate) fn build_data(&self, ctx: &AnalysisContext) -> Result<Value, DriftLensError> {
        match self {
            Section::DataDrift => {
                let metrics = analyzers::data_drift::calculate(ctx)?;
                section_value(ctx, Some(ctx.options), metrics)
            }
            Section::CatTargetDrift => {
                let metrics = analyzers::target_drift::calculate(ctx)?;
                section_value(ctx, None, metrics)
            }
            Section::RegressionPerformance => {
                let metrics = analyzers::regression::calculate(ctx)?;
                section_value(ctx, None, metrics)
            }
            Section::ClassificationPerformance => {
                let metrics = analyzers::classification::calculate(ctx)?;
                section_value(ctx, None, metrics)
            }
            Section::ProbClassificationPerformance => {
                let metrics = analyzers::prob_classification::calculate(ctx)?;
                section_value(ctx, None, metrics)
            }
        }
    }
}

fn section_value<M: Serialize>(
    ctx: &AnalysisContext,
    options: Option<&DriftOptions>,
    metrics: M,
) -> Result<Value, DriftLensError> {
    let data = SectionData {
        utility_columns: UtilityColumns::from_resolved(ctx.columns),
        cat_feature_names: &ctx.columns.cat_features,
        num_feature_names: &ctx.columns.num_features,
        target_names: ctx.columns.target_names.as_deref(),
        options,
        metrics,
    };
    serde_json::to_value(&data).map_err(|e| DriftLensError::UnableToWrite(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(Section::from_str("data_drift").unwrap(), Section::DataDrift);
        assert_eq!(
            Section::from_str("classification_performance").unwrap(),
            Section::ClassificationPerformance
        );
    }

    #[test]
    fn test_from_str_rejects_unknown_names() {
        let res = Section::from_str("data_quality");
        assert!(matches!(res, Err(DriftLensError::ParseString(_, _, _))));
    }

    #[test]
    fn test_part_keys() {
        assert_eq!(Section::DataDrift.part_key(), "data_drift");
        assert_eq!(
            Section::ProbClassificationPerformance.part_key(),
            "probabilistic_classification_performance"
        );
    }
}
