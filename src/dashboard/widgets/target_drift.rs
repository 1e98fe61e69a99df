//! Categorical target drift tab: a drift graph per output column plus
//! the feature behavior table.
use crate::analyzers::target_drift::{CatTargetDriftMetrics, FeatureBehaviorRow, OutputDrift};
use crate::analyzers::AnalysisContext;
use crate::dashboard::widgets::{value_of, WidgetInfo, WidgetType};
use crate::errors::DriftLensError;
use crate::utils::precision_round;
use serde::Serialize;

#[derive(Serialize)]
struct BehaviorTableParams<'a> {
    rows: &'a [FeatureBehaviorRow],
}

fn drift_widget(kind: &str, drift: &OutputDrift) -> WidgetInfo {
    let state = if drift.drift_detected {
        "detected"
    } else {
        "not detected"
    };
    let title = format!(
        "{} Drift: {}, p_value={}",
        kind,
        state,
        precision_round(drift.drift_score, 6)
    );
    WidgetInfo::new(&title, WidgetType::BigGraph, 2, value_of(drift))
}

pub fn build(
    _ctx: &AnalysisContext,
    metrics: &CatTargetDriftMetrics,
) -> Result<Vec<WidgetInfo>, DriftLensError> {
    let mut widgets = vec![drift_widget("Target", &metrics.target_drift)];
    if let Some(prediction_drift) = &metrics.prediction_drift {
        widgets.push(drift_widget("Prediction", prediction_drift));
    }
    widgets.push(WidgetInfo::new(
        "Target Behavior by Feature",
        WidgetType::BigTable,
        2,
        value_of(&BehaviorTableParams {
            rows: &metrics.target_behavior,
        }),
    ));
    Ok(widgets)
}
