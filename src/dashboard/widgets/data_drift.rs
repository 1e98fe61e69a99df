//! Data drift tab: one big table with a row per monitored feature.
use crate::analyzers::data_drift::{DataDriftMetrics, FeatureDistribution, FeatureType};
use crate::analyzers::AnalysisContext;
use crate::dashboard::widgets::{value_of, WidgetInfo, WidgetType};
use crate::errors::DriftLensError;
use serde::Serialize;

#[derive(Serialize)]
struct DriftTableRow<'a> {
    feature: &'a str,
    feature_type: FeatureType,
    p_value: f64,
    drift_detected: bool,
    reference_distribution: &'a FeatureDistribution,
    current_distribution: &'a FeatureDistribution,
}

#[derive(Serialize)]
struct DriftTableParams<'a> {
    n_features: usize,
    n_drifted_features: usize,
    share_drifted_features: f64,
    dataset_drift: bool,
    rows: Vec<DriftTableRow<'a>>,
}

pub fn build(
    ctx: &AnalysisContext,
    metrics: &DataDriftMetrics,
) -> Result<Vec<WidgetInfo>, DriftLensError> {
    // Rows keep the resolution order, numerical features first.
    let mut rows = Vec::with_capacity(metrics.n_features);
    for name in ctx
        .columns
        .num_features
        .iter()
        .chain(&ctx.columns.cat_features)
    {
        if let Some(drift) = metrics.features.get(name) {
            rows.push(DriftTableRow {
                feature: name,
                feature_type: drift.feature_type,
                p_value: drift.drift_score,
                drift_detected: drift.drift_detected,
                reference_distribution: &drift.reference_distribution,
                current_distribution: &drift.current_distribution,
            });
        }
    }
    let params = DriftTableParams {
        n_features: metrics.n_features,
        n_drifted_features: metrics.n_drifted_features,
        share_drifted_features: metrics.share_drifted_features,
        dataset_drift: metrics.dataset_drift,
        rows,
    };
    Ok(vec![WidgetInfo::new(
        "Data Drift",
        WidgetType::BigTable,
        2,
        value_of(&params),
    )])
}
