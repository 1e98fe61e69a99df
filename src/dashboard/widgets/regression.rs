//! Regression performance tab: summary tables shared by both
//! partitions plus a per partition block of quality graphs.
use crate::analyzers::regression::{
    paired_series, qq_points, ErrorBiasEntry, GroupStats, RegressionMetrics,
};
use crate::analyzers::{AnalysisContext, PerfMetrics};
use crate::dashboard::widgets::{pair_size, partition_title, value_of, WidgetInfo, WidgetType};
use crate::data::DataFrame;
use crate::errors::DriftLensError;
use serde::Serialize;

#[derive(Serialize)]
struct ReportParams<'a> {
    target: &'a str,
    prediction: &'a str,
    reference_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_rows: Option<usize>,
}

#[derive(Serialize)]
struct QualityRow<'a> {
    partition: &'a str,
    mean_error: f64,
    error_std: f64,
    mean_abs_error: f64,
    abs_error_std: f64,
    mean_abs_perc_error: f64,
    abs_perc_error_std: f64,
}

impl<'a> QualityRow<'a> {
    fn new(partition: &'a str, m: &RegressionMetrics) -> Self {
        QualityRow {
            partition,
            mean_error: m.mean_error,
            error_std: m.error_std,
            mean_abs_error: m.mean_abs_error,
            abs_error_std: m.abs_error_std,
            mean_abs_perc_error: m.mean_abs_perc_error,
            abs_perc_error_std: m.abs_perc_error_std,
        }
    }
}

#[derive(Serialize)]
struct QualitySummaryParams<'a> {
    rows: Vec<QualityRow<'a>>,
}

#[derive(Serialize, Clone)]
#[serde(untagged)]
enum Axis {
    Index(Vec<usize>),
    Timestamps(Vec<String>),
}

#[derive(Serialize)]
struct ScatterParams<'a> {
    actual: &'a [f64],
    predicted: &'a [f64],
}

#[derive(Serialize)]
struct InTimeParams<'a> {
    x_title: &'static str,
    x: Axis,
    actual: &'a [f64],
    predicted: &'a [f64],
}

#[derive(Serialize)]
struct ErrorInTimeParams {
    x_title: &'static str,
    x: Axis,
    error: Vec<f64>,
}

#[derive(Serialize)]
struct NormalityParams {
    theoretical_quantiles: Vec<f64>,
    observed_quantiles: Vec<f64>,
    slope: f64,
    intercept: f64,
    r: f64,
}

#[derive(Serialize)]
struct UnderperformanceRow<'a> {
    partition: &'a str,
    majority: GroupStats,
    underestimation: GroupStats,
    overestimation: GroupStats,
}

#[derive(Serialize)]
struct UnderperformanceParams<'a> {
    rows: Vec<UnderperformanceRow<'a>>,
}

#[derive(Serialize)]
struct ErrorBiasRow<'a> {
    feature: &'a str,
    reference: ErrorBiasEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    current: Option<ErrorBiasEntry>,
}

#[derive(Serialize)]
struct ErrorBiasParams<'a> {
    rows: Vec<ErrorBiasRow<'a>>,
}

pub fn build(
    ctx: &AnalysisContext,
    metrics: &PerfMetrics<RegressionMetrics>,
) -> Result<Vec<WidgetInfo>, DriftLensError> {
    let target = ctx.columns.target.as_deref().ok_or_else(|| {
        DriftLensError::MissingRole("target".to_string(), "regression performance".to_string())
    })?;
    let prediction = ctx.columns.prediction_name().ok_or_else(|| {
        DriftLensError::MissingRole(
            "prediction".to_string(),
            "regression performance".to_string(),
        )
    })?;

    let mut partitions: Vec<(&str, &DataFrame, &RegressionMetrics)> =
        vec![("reference", ctx.reference, &metrics.reference)];
    if let (Some(frame), Some(m)) = (ctx.current, metrics.current.as_ref()) {
        partitions.push(("current", frame, m));
    }
    let size = pair_size(metrics.current.is_some());

    let mut widgets = vec![
        WidgetInfo::new(
            "Regression Model Performance Report",
            WidgetType::Counter,
            2,
            value_of(&ReportParams {
                target,
                prediction,
                reference_rows: ctx.reference.n_rows(),
                current_rows: ctx.current.map(|f| f.n_rows()),
            }),
        ),
        WidgetInfo::new(
            "Model Quality Summary",
            WidgetType::Table,
            2,
            value_of(&QualitySummaryParams {
                rows: partitions
                    .iter()
                    .map(|(p, _, m)| QualityRow::new(p, m))
                    .collect(),
            }),
        ),
    ];

    for (partition, frame, m) in &partitions {
        widgets.extend(partition_widgets(
            ctx, partition, frame, m, size, target, prediction,
        )?);
    }

    widgets.push(WidgetInfo::new(
        "Underperformance Summary",
        WidgetType::Table,
        2,
        value_of(&UnderperformanceParams {
            rows: partitions
                .iter()
                .map(|(p, _, m)| UnderperformanceRow {
                    partition: p,
                    majority: m.underperformance.majority,
                    underestimation: m.underperformance.underestimation,
                    overestimation: m.underperformance.overestimation,
                })
                .collect(),
        }),
    ));

    // One row per feature, group means of both partitions side by side.
    let current_bias = metrics.current.as_ref().map(|m| &m.error_bias);
    let rows: Vec<ErrorBiasRow> = ctx
        .columns
        .num_features
        .iter()
        .filter_map(|feature| {
            metrics
                .reference
                .error_bias
                .get(feature)
                .map(|reference| ErrorBiasRow {
                    feature,
                    reference: *reference,
                    current: current_bias.and_then(|b| b.get(feature)).copied(),
                })
        })
        .collect();
    widgets.push(WidgetInfo::new(
        "Error Bias per Feature",
        WidgetType::BigTable,
        2,
        value_of(&ErrorBiasParams { rows }),
    ));

    Ok(widgets)
}

fn partition_widgets(
    ctx: &AnalysisContext,
    partition: &str,
    frame: &DataFrame,
    m: &RegressionMetrics,
    size: u8,
    target: &str,
    prediction: &str,
) -> Result<Vec<WidgetInfo>, DriftLensError> {
    let actual = frame.numeric(target)?;
    let predicted = frame.numeric(prediction)?;
    let error: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| p - a).collect();
    let (x_title, x) = match &ctx.columns.datetime {
        Some(name) => ("Timestamp", Axis::Timestamps(frame.labels(name)?)),
        None => ("Index", Axis::Index((0..frame.n_rows()).collect())),
    };

    let (filtered_actual, filtered_predicted) = paired_series(frame, target, prediction)?;
    let filtered_error: Vec<f64> = filtered_actual
        .iter()
        .zip(&filtered_predicted)
        .map(|(a, p)| p - a)
        .collect();
    let (theoretical_quantiles, observed_quantiles) = qq_points(&filtered_error);

    Ok(vec![
        WidgetInfo::new(
            &partition_title(partition, "Model Quality (+/- std)"),
            WidgetType::Counter,
            size,
            value_of(&QualityRow::new(partition, m)),
        ),
        WidgetInfo::new(
            &partition_title(partition, "Predicted vs Actual"),
            WidgetType::BigGraph,
            size,
            value_of(&ScatterParams { actual, predicted }),
        ),
        WidgetInfo::new(
            &partition_title(partition, "Predicted vs Actual in Time"),
            WidgetType::BigGraph,
            size,
            value_of(&InTimeParams {
                x_title,
                x: x.clone(),
                actual,
                predicted,
            }),
        ),
        WidgetInfo::new(
            &partition_title(partition, "Error (Predicted - Actual)"),
            WidgetType::BigGraph,
            size,
            value_of(&ErrorInTimeParams { x_title, x, error }),
        ),
        WidgetInfo::new(
            &partition_title(partition, "Error Distribution"),
            WidgetType::BigGraph,
            size,
            value_of(&m.error_buckets),
        ),
        WidgetInfo::new(
            &partition_title(partition, "Error Normality"),
            WidgetType::BigGraph,
            size,
            value_of(&NormalityParams {
                theoretical_quantiles,
                observed_quantiles,
                slope: m.error_normality.slope,
                intercept: m.error_normality.intercept,
                r: m.error_normality.r,
            }),
        ),
        WidgetInfo::new(
            &partition_title(partition, "Mean Error per Group (+/- std)"),
            WidgetType::BigGraph,
            size,
            value_of(&m.underperformance),
        ),
        WidgetInfo::new(
            &partition_title(partition, "Error Bias per Group"),
            WidgetType::BigGraph,
            size,
            value_of(&m.error_bias),
        ),
    ])
}
