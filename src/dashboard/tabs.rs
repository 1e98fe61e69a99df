//! Tabs
//!
//! The analyses a dashboard can run, and the mapping from each tab to
//! its widget layout.
use crate::analyzers::{self, AnalysisContext};
use crate::dashboard::widgets::{self, WidgetInfo};
use crate::errors::DriftLensError;
use crate::utils::items_to_strings;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One analysis view of a dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
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

impl FromStr for Tab {
    type Err = DriftLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data_drift" => Ok(Tab::DataDrift),
            "cat_target_drift" => Ok(Tab::CatTargetDrift),
            "regression_performance" => Ok(Tab::RegressionPerformance),
            "classification_performance" => Ok(Tab::ClassificationPerformance),
            "prob_classification_performance" => Ok(Tab::ProbClassificationPerformance),
            _ => Err(DriftLensError::ParseString(
                s.to_string(),
                "Tab".to_string(),
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

impl Tab {
    /// Run the tab's analysis and lay out its widgets.
    pub(crate) fn build_widgets(
        &self,
        ctx: &AnalysisContext,
    ) -> Result<Vec<WidgetInfo>, DriftLensError> {
        match self {
            Tab::DataDrift => {
                let metrics = analyzers::data_drift::calculate(ctx)?;
                widgets::data_drift::build(ctx, &metrics)
            }
            Tab::CatTargetDrift => {
                let metrics = analyzers::target_drift::calculate(ctx)?;
                widgets::target_drift::build(ctx, &metrics)
            }
            Tab::RegressionPerformance => {
                let metrics = analyzers::regression::calculate(ctx)?;
                widgets::regression::build(ctx, &metrics)
            }
            Tab::ClassificationPerformance => {
                let metrics = analyzers::classification::calculate(ctx)?;
                widgets::classification::build(ctx, &metrics)
            }
            Tab::ProbClassificationPerformance => {
                let metrics = analyzers::prob_classification::calculate(ctx)?;
                widgets::prob_classification::build(ctx, &metrics)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(Tab::from_str("data_drift").unwrap(), Tab::DataDrift);
        assert_eq!(
            Tab::from_str("regression_performance").unwrap(),
            Tab::RegressionPerformance
        );
        assert_eq!(
            Tab::from_str("prob_classification_performance").unwrap(),
            Tab::ProbClassificationPerformance
        );
    }

    #[test]
    fn test_from_str_rejects_unknown_names() {
        let res = Tab::from_str("num_target_drift");
        assert!(matches!(res, Err(DriftLensError::ParseString(_, _, _))));
    }
}
