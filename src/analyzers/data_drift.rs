//! Data Drift
//!
//! Compares the feature distributions of a current dataset against the
//! reference dataset, feature by feature. Numerical features run through
//! a two sample Kolmogorov-Smirnov test, categorical features through a
//! chi-square test over their frequency tables.
use crate::analyzers::{AnalysisContext, DriftOptions};
use crate::data::DataFrame;
use crate::errors::DriftLensError;
use crate::stats::{chi_square_test, histogram, ks_test, value_counts, Histogram, LabelCount};
use hashbrown::HashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of a monitored feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    #[serde(rename = "num")]
    Num,
    #[serde(rename = "cat")]
    Cat,
}

/// Distribution summary of one feature in one partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureDistribution {
    Numeric(Histogram),
    Categorical(Vec<LabelCount>),
}

/// Drift assessment of a single feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureDrift {
    pub feature_type: FeatureType,
    /// P-value of the two sample test.
    pub drift_score: f64,
    pub drift_detected: bool,
    pub reference_distribution: FeatureDistribution,
    pub current_distribution: FeatureDistribution,
}

/// Dataset level drift summary plus per feature detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataDriftMetrics {
    pub n_features: usize,
    pub n_drifted_features: usize,
    pub share_drifted_features: f64,
    pub dataset_drift: bool,
    pub features: HashMap<String, FeatureDrift>,
}

/// Run the data drift analysis. Requires a current dataset.
pub fn calculate(ctx: &AnalysisContext) -> Result<DataDriftMetrics, DriftLensError> {
    let current = ctx
        .current
        .ok_or_else(|| DriftLensError::CurrentDatasetRequired("data drift".to_string()))?;

    let mut kinds: Vec<(String, FeatureType)> = Vec::new();
    kinds.extend(
        ctx.columns
            .num_features
            .iter()
            .map(|n| (n.clone(), FeatureType::Num)),
    );
    kinds.extend(
        ctx.columns
            .cat_features
            .iter()
            .map(|n| (n.clone(), FeatureType::Cat)),
    );

    let computed = kinds
        .par_iter()
        .map(|(name, kind)| {
            let drift = match kind {
                FeatureType::Num => {
                    numeric_feature_drift(ctx.reference, current, name, ctx.options)?
                }
                FeatureType::Cat => {
                    categorical_feature_drift(ctx.reference, current, name, ctx.options)?
                }
            };
            Ok((name.to_string(), drift))
        })
        .collect::<Result<Vec<(String, FeatureDrift)>, DriftLensError>>()?;

    let n_features = computed.len();
    let n_drifted_features = computed.iter().filter(|(_, f)| f.drift_detected).count();
    let share_drifted_features = if n_features > 0 {
        n_drifted_features as f64 / n_features as f64
    } else {
        0.0
    };
    let dataset_drift = n_features > 0 && share_drifted_features >= ctx.options.drift_share;

    let mut features = HashMap::with_capacity(n_features);
    for (name, drift) in computed {
        features.insert(name, drift);
    }

    Ok(DataDriftMetrics {
        n_features,
        n_drifted_features,
        share_drifted_features,
        dataset_drift,
        features,
    })
}

fn numeric_feature_drift(
    reference: &DataFrame,
    current: &DataFrame,
    name: &str,
    options: &DriftOptions,
) -> Result<FeatureDrift, DriftLensError> {
    let ref_values = reference.numeric(name)?;
    let cur_values = current.numeric(name)?;
    let test = ks_test(ref_values, cur_values);
    Ok(FeatureDrift {
        feature_type: FeatureType::Num,
        drift_score: test.p_value,
        drift_detected: test.p_value < options.significance(),
        reference_distribution: FeatureDistribution::Numeric(histogram(
            ref_values,
            options.n_bins,
        )),
        current_distribution: FeatureDistribution::Numeric(histogram(
            cur_values,
            options.n_bins,
        )),
    })
}

fn categorical_feature_drift(
    reference: &DataFrame,
    current: &DataFrame,
    name: &str,
    options: &DriftOptions,
) -> Result<FeatureDrift, DriftLensError> {
    let ref_counts = value_counts(&reference.labels(name)?);
    let cur_counts = value_counts(&current.labels(name)?);
    let test = frequency_drift_test(&ref_counts, &cur_counts);
    Ok(FeatureDrift {
        feature_type: FeatureType::Cat,
        drift_score: test.p_value,
        drift_detected: test.p_value < options.significance(),
        reference_distribution: FeatureDistribution::Categorical(ref_counts),
        current_distribution: FeatureDistribution::Categorical(cur_counts),
    })
}

/// Chi-square test between two frequency tables, aligned over the union
/// of their labels. Reference counts play the expected frequencies.
pub(crate) fn frequency_drift_test(
    reference: &[LabelCount],
    current: &[LabelCount],
) -> crate::stats::ChiSquareTest {
    let mut labels: Vec<&str> = reference.iter().map(|c| c.label.as_str()).collect();
    for entry in current {
        if !labels.contains(&entry.label.as_str()) {
            labels.push(entry.label.as_str());
        }
    }
    let count_of = |table: &[LabelCount], label: &str| -> f64 {
        table
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.count as f64)
            .unwrap_or(0.0)
    };
    let expected: Vec<f64> = labels.iter().map(|l| count_of(reference, l)).collect();
    let observed: Vec<f64> = labels.iter().map(|l| count_of(current, l)).collect();
    chi_square_test(&observed, &expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{ColumnMapping, ResolvedColumns};

    fn frame(f1: Vec<f64>, seg: Vec<&str>) -> DataFrame {
        let mut frame = DataFrame::new();
        frame.push_numeric("f1", f1).unwrap();
        frame
            .push_categorical("segment", seg.iter().map(|s| s.to_string()).collect())
            .unwrap();
        frame
    }

    fn run(reference: &DataFrame, current: &DataFrame) -> DataDriftMetrics {
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
    fn test_no_drift_on_identical_data() {
        let values: Vec<f64> = (0..60).map(|i| (i % 10) as f64).collect();
        let seg: Vec<&str> = (0..60).map(|i| if i % 2 == 0 { "a" } else { "b" }).collect();
        let reference = frame(values.clone(), seg.clone());
        let current = frame(values, seg);
        let res = run(&reference, &current);
        assert_eq!(res.n_features, 2);
        assert_eq!(res.n_drifted_features, 0);
        assert!(!res.dataset_drift);
        assert!(res.features["f1"].drift_score > 0.95);
    }

    #[test]
    fn test_shifted_numeric_feature_drifts() {
        let values: Vec<f64> = (0..60).map(|i| (i % 10) as f64).collect();
        let shifted: Vec<f64> = values.iter().map(|v| v + 100.0).collect();
        let seg: Vec<&str> = (0..60).map(|_| "a").collect();
        let reference = frame(values, seg.clone());
        let current = frame(shifted, seg);
        let res = run(&reference, &current);
        let f1 = &res.features["f1"];
        assert_eq!(f1.feature_type, FeatureType::Num);
        assert!(f1.drift_detected);
        assert!(f1.drift_score < 0.05);
    }

    #[test]
    fn test_category_shift_drifts() {
        let values: Vec<f64> = (0..80).map(|i| (i % 10) as f64).collect();
        let ref_seg: Vec<&str> = (0..80).map(|i| if i % 4 == 0 { "a" } else { "b" }).collect();
        let cur_seg: Vec<&str> = (0..80).map(|i| if i % 4 == 0 { "b" } else { "a" }).collect();
        let reference = frame(values.clone(), ref_seg);
        let current = frame(values, cur_seg);
        let res = run(&reference, &current);
        let segment = &res.features["segment"];
        assert_eq!(segment.feature_type, FeatureType::Cat);
        assert!(segment.drift_detected);
    }

    #[test]
    fn test_dataset_drift_share() {
        let values: Vec<f64> = (0..60).map(|i| (i % 10) as f64).collect();
        let shifted: Vec<f64> = values.iter().map(|v| v + 100.0).collect();
        let seg: Vec<&str> = (0..60).map(|i| if i % 2 == 0 { "a" } else { "b" }).collect();
        // One drifted feature out of two meets the default 0.5 share.
        let reference = frame(values, seg.clone());
        let current = frame(shifted, seg);
        let res = run(&reference, &current);
        assert_eq!(res.n_drifted_features, 1);
        assert!((res.share_drifted_features - 0.5).abs() < 1e-12);
        assert!(res.dataset_drift);
    }

    #[test]
    fn test_current_dataset_is_required() {
        let reference = frame(vec![1.0, 2.0], vec!["a", "b"]);
        let mapping = ColumnMapping::default();
        let columns = ResolvedColumns::resolve(&reference, None, &mapping).unwrap();
        let options = DriftOptions::default();
        let ctx = AnalysisContext {
            reference: &reference,
            current: None,
            columns: &columns,
            options: &options,
        };
        let res = calculate(&ctx);
        assert!(matches!(
            res,
            Err(DriftLensError::CurrentDatasetRequired(_))
        ));
    }
}
