//! Categorical Target Drift
//!
//! Detects distribution change in the model output columns: the ground
//! truth labels and, when logged, the predicted labels. Also profiles
//! how each numerical feature behaves per target label, which is what
//! usually explains a detected output drift.
use crate::analyzers::AnalysisContext;
use crate::analyzers::data_drift::frequency_drift_test;
use crate::data::DataFrame;
use crate::errors::DriftLensError;
use crate::stats::{mean, value_counts, LabelCount};
use serde::{Deserialize, Serialize};

/// Drift assessment of a single output column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputDrift {
    /// Name of the assessed column.
    pub name: String,
    /// P-value of the chi-square test between the label tables.
    pub drift_score: f64,
    pub drift_detected: bool,
    pub reference_distribution: Vec<LabelCount>,
    pub current_distribution: Vec<LabelCount>,
}

/// Mean of one numerical feature over the rows of one target label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureBehaviorRow {
    pub feature: String,
    pub label: String,
    pub reference_mean: f64,
    pub current_mean: f64,
}

/// Output drift summary plus per label feature behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatTargetDriftMetrics {
    pub target_drift: OutputDrift,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction_drift: Option<OutputDrift>,
    pub target_behavior: Vec<FeatureBehaviorRow>,
}

/// Run the categorical target drift analysis. Requires a current
/// dataset and a target column, prediction drift is added when a single
/// prediction column is available.
pub fn calculate(ctx: &AnalysisContext) -> Result<CatTargetDriftMetrics, DriftLensError> {
    let current = ctx.current.ok_or_else(|| {
        DriftLensError::CurrentDatasetRequired("categorical target drift".to_string())
    })?;
    let target = ctx.columns.target.as_deref().ok_or_else(|| {
        DriftLensError::MissingRole(
            "target".to_string(),
            "categorical target drift".to_string(),
        )
    })?;

    let target_drift = output_drift(ctx, current, target)?;
    let prediction_drift = match ctx.columns.prediction_name() {
        Some(name) => Some(output_drift(ctx, current, name)?),
        None => None,
    };

    let target_behavior = feature_behavior(ctx, current, target)?;

    Ok(CatTargetDriftMetrics {
        target_drift,
        prediction_drift,
        target_behavior,
    })
}

fn output_drift(
    ctx: &AnalysisContext,
    current: &DataFrame,
    name: &str,
) -> Result<OutputDrift, DriftLensError> {
    let reference_distribution = value_counts(&ctx.reference.labels(name)?);
    let current_distribution = value_counts(&current.labels(name)?);
    let test = frequency_drift_test(&reference_distribution, &current_distribution);
    Ok(OutputDrift {
        name: name.to_string(),
        drift_score: test.p_value,
        drift_detected: test.p_value < ctx.options.significance(),
        reference_distribution,
        current_distribution,
    })
}

// Mean of every numerical feature per target label, for both
// partitions. Labels follow their first appearance in the reference
// target, a label absent from a partition yields NaN means.
fn feature_behavior(
    ctx: &AnalysisContext,
    current: &DataFrame,
    target: &str,
) -> Result<Vec<FeatureBehaviorRow>, DriftLensError> {
    let ref_labels = ctx.reference.labels(target)?;
    let cur_labels = current.labels(target)?;
    let mut label_order: Vec<String> = Vec::new();
    for label in ref_labels.iter().chain(cur_labels.iter()) {
        if !label_order.contains(label) {
            label_order.push(label.clone());
        }
    }

    let mut rows = Vec::with_capacity(ctx.columns.num_features.len() * label_order.len());
    for feature in &ctx.columns.num_features {
        let ref_values = ctx.reference.numeric(feature)?;
        let cur_values = current.numeric(feature)?;
        for label in &label_order {
            let ref_group: Vec<f64> = ref_values
                .iter()
                .zip(&ref_labels)
                .filter(|(_, l)| *l == label)
                .map(|(v, _)| *v)
                .collect();
            let cur_group: Vec<f64> = cur_values
                .iter()
                .zip(&cur_labels)
                .filter(|(_, l)| *l == label)
                .map(|(v, _)| *v)
                .collect();
            rows.push(FeatureBehaviorRow {
                feature: feature.clone(),
                label: label.clone(),
                reference_mean: mean(&ref_group),
                current_mean: mean(&cur_group),
            });
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::DriftOptions;
    use crate::mapping::{ColumnMapping, ResolvedColumns};

    fn labeled_frame(targets: &[u8], with_prediction: bool) -> DataFrame {
        let mut frame = DataFrame::new();
        frame
            .push_numeric("f1", targets.iter().map(|t| *t as f64 * 10.0).collect())
            .unwrap();
        frame
            .push_numeric("target", targets.iter().map(|t| *t as f64).collect())
            .unwrap();
        if with_prediction {
            frame
                .push_numeric("prediction", targets.iter().map(|t| (1 - *t) as f64).collect())
                .unwrap();
        }
        frame
    }

    fn run(reference: &DataFrame, current: &DataFrame) -> CatTargetDriftMetrics {
        let mapping = ColumnMapping::default();
        let columns = ResolvedColumns::resolve(reference, Some(current), &mapping).unwrap();
        let options = DriftOptions::default();
        let ctx = AnalysisContext {
            reference,
            current: Some(current),
            columns: &columns,
            options: &options,
        };
        calculate(&ctx).unwrap()
    }

    #[test]
    fn test_stable_target_is_not_drifted() {
        let labels: Vec<u8> = (0..60).map(|i| (i % 2) as u8).collect();
        let reference = labeled_frame(&labels, false);
        let current = labeled_frame(&labels, false);
        let res = run(&reference, &current);
        assert!(!res.target_drift.drift_detected);
        assert!(res.prediction_drift.is_none());
    }

    #[test]
    fn test_flipped_target_balance_is_drifted() {
        let ref_labels: Vec<u8> = (0..80).map(|i| u8::from(i % 4 == 0)).collect();
        let cur_labels: Vec<u8> = (0..80).map(|i| u8::from(i % 4 != 0)).collect();
        let reference = labeled_frame(&ref_labels, false);
        let current = labeled_frame(&cur_labels, false);
        let res = run(&reference, &current);
        assert!(res.target_drift.drift_detected);
        assert!(res.target_drift.drift_score < 0.05);
    }

    #[test]
    fn test_prediction_drift_present_with_prediction_column() {
        let labels: Vec<u8> = (0..40).map(|i| (i % 2) as u8).collect();
        let reference = labeled_frame(&labels, true);
        let current = labeled_frame(&labels, true);
        let res = run(&reference, &current);
        let prediction = res.prediction_drift.unwrap();
        assert_eq!(prediction.name, "prediction");
        assert!(!prediction.drift_detected);
    }

    #[test]
    fn test_feature_behavior_rows() {
        let labels: Vec<u8> = (0..40).map(|i| (i % 2) as u8).collect();
        let reference = labeled_frame(&labels, false);
        let current = labeled_frame(&labels, false);
        let res = run(&reference, &current);
        // One numerical feature, two labels.
        assert_eq!(res.target_behavior.len(), 2);
        let row = &res.target_behavior[0];
        assert_eq!(row.feature, "f1");
        assert_eq!(row.label, "0");
        assert_eq!(row.reference_mean, 0.0);
        let row = &res.target_behavior[1];
        assert_eq!(row.label, "1");
        assert_eq!(row.reference_mean, 10.0);
    }

    #[test]
    fn test_target_is_required() {
        let labels: Vec<u8> = (0..10).map(|i| (i % 2) as u8).collect();
        let reference = labeled_frame(&labels, false);
        let current = labeled_frame(&labels, false);
        let mapping = ColumnMapping {
            target: None,
            ..ColumnMapping::default()
        };
        let columns = ResolvedColumns::resolve(&reference, Some(&current), &mapping).unwrap();
        let options = DriftOptions::default();
        let ctx = AnalysisContext {
            reference: &reference,
            current: Some(&current),
            columns: &columns,
            options: &options,
        };
        assert!(matches!(
            calculate(&ctx),
            Err(DriftLensError::MissingRole(_, _))
        ));
    }
}
