//! Probabilistic classification tab: a block of score based quality
//! graphs per partition plus the per feature quality table.
use crate::analyzers::prob_classification::{
    predicted_labels, PrPoint, PrTableRow, ProbClassificationMetrics, ProbabilitySummary,
    RocPoint,
};
use crate::analyzers::{AnalysisContext, PerfMetrics};
use crate::dashboard::widgets::classification::feature_quality_widget;
use crate::dashboard::widgets::{pair_size, partition_title, value_of, WidgetInfo, WidgetType};
use crate::errors::DriftLensError;
use crate::stats::Histogram;
use serde::Serialize;

#[derive(Serialize)]
struct ReportParams<'a> {
    target: &'a str,
    n_classes: usize,
    classes: &'a [String],
    reference_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_rows: Option<usize>,
}

#[derive(Serialize)]
struct QualityParams {
    accuracy: f64,
    precision: f64,
    recall: f64,
    f1: f64,
    roc_auc: f64,
    log_loss: f64,
}

#[derive(Serialize)]
struct RepresentationParams<'a> {
    classes: Vec<&'a str>,
    counts: Vec<usize>,
}

#[derive(Serialize)]
struct ConfusionParams<'a> {
    labels: &'a [String],
    values: &'a [Vec<usize>],
}

#[derive(Serialize)]
struct ClassRow<'a> {
    label: &'a str,
    precision: f64,
    recall: f64,
    f1: f64,
    roc_auc: f64,
    support: usize,
}

#[derive(Serialize)]
struct ClassTableParams<'a> {
    rows: Vec<ClassRow<'a>>,
}

#[derive(Serialize)]
struct SeparationEntry<'a> {
    label: &'a str,
    positive: ProbabilitySummary,
    negative: ProbabilitySummary,
}

#[derive(Serialize)]
struct HistEntry<'a> {
    label: &'a str,
    histogram: &'a Histogram,
}

#[derive(Serialize)]
struct CurveEntry<'a, P> {
    label: &'a str,
    points: &'a [P],
}

#[derive(Serialize)]
struct PrTableEntry<'a> {
    label: &'a str,
    rows: &'a [PrTableRow],
}

#[derive(Serialize)]
struct ClassListParams<T> {
    classes: Vec<T>,
}

pub fn build(
    ctx: &AnalysisContext,
    metrics: &PerfMetrics<ProbClassificationMetrics>,
) -> Result<Vec<WidgetInfo>, DriftLensError> {
    let target = ctx.columns.target.as_deref().ok_or_else(|| {
        DriftLensError::MissingRole(
            "target".to_string(),
            "probabilistic classification performance".to_string(),
        )
    })?;
    let prob_cols = ctx.columns.probability_names().ok_or_else(|| {
        DriftLensError::MissingRole(
            "prediction".to_string(),
            "probabilistic classification performance".to_string(),
        )
    })?;

    let mut widgets = vec![WidgetInfo::new(
        "Probabilistic Classification Performance Report",
        WidgetType::Counter,
        2,
        value_of(&ReportParams {
            target,
            n_classes: prob_cols.len(),
            classes: prob_cols,
            reference_rows: ctx.reference.n_rows(),
            current_rows: ctx.current.map(|f| f.n_rows()),
        }),
    )];

    let size = pair_size(metrics.current.is_some());
    for (partition, m) in metrics.partitions() {
        widgets.extend(partition_widgets(partition, m, prob_cols, size));
    }

    widgets.push(feature_quality_widget(ctx, target, |frame| {
        predicted_labels(frame, prob_cols)
    })?);

    Ok(widgets)
}

fn partition_widgets(
    partition: &str,
    m: &ProbClassificationMetrics,
    prob_cols: &[String],
    size: u8,
) -> Vec<WidgetInfo> {
    let detail_of = |class: &String| m.classes.get(class);

    let mut class_rows = Vec::with_capacity(m.metrics_matrix.len());
    for row in &m.metrics_matrix {
        class_rows.push(ClassRow {
            label: &row.label,
            precision: row.precision,
            recall: row.recall,
            f1: row.f1,
            roc_auc: detail_of(&row.label)
                .map(|d| d.roc_auc)
                .unwrap_or(f64::NAN),
            support: row.support,
        });
    }

    let separation: Vec<SeparationEntry> = prob_cols
        .iter()
        .filter_map(|class| {
            detail_of(class).map(|d| SeparationEntry {
                label: class,
                positive: d.separation.positive,
                negative: d.separation.negative,
            })
        })
        .collect();
    let histograms: Vec<HistEntry> = prob_cols
        .iter()
        .filter_map(|class| {
            detail_of(class).map(|d| HistEntry {
                label: class,
                histogram: &d.probability_hist,
            })
        })
        .collect();
    let roc: Vec<CurveEntry<RocPoint>> = prob_cols
        .iter()
        .filter_map(|class| {
            detail_of(class).map(|d| CurveEntry {
                label: class,
                points: d.roc_curve.as_slice(),
            })
        })
        .collect();
    let pr: Vec<CurveEntry<PrPoint>> = prob_cols
        .iter()
        .filter_map(|class| {
            detail_of(class).map(|d| CurveEntry {
                label: class,
                points: d.pr_curve.as_slice(),
            })
        })
        .collect();
    let pr_tables: Vec<PrTableEntry> = prob_cols
        .iter()
        .filter_map(|class| {
            detail_of(class).map(|d| PrTableEntry {
                label: class,
                rows: d.pr_table.as_slice(),
            })
        })
        .collect();

    vec![
        WidgetInfo::new(
            &partition_title(partition, "Model Quality With Macro-average Metrics"),
            WidgetType::Counter,
            size,
            value_of(&QualityParams {
                accuracy: m.accuracy,
                precision: m.precision,
                recall: m.recall,
                f1: m.f1,
                roc_auc: m.roc_auc,
                log_loss: m.log_loss,
            }),
        ),
        WidgetInfo::new(
            &partition_title(partition, "Class Representation"),
            WidgetType::BigGraph,
            size,
            value_of(&RepresentationParams {
                classes: m.metrics_matrix.iter().map(|r| r.label.as_str()).collect(),
                counts: m.metrics_matrix.iter().map(|r| r.support).collect(),
            }),
        ),
        WidgetInfo::new(
            &partition_title(partition, "Confusion Matrix"),
            WidgetType::BigGraph,
            size,
            value_of(&ConfusionParams {
                labels: &m.confusion_matrix.labels,
                values: &m.confusion_matrix.values,
            }),
        ),
        WidgetInfo::new(
            &partition_title(partition, "Quality Metrics by Class"),
            WidgetType::Table,
            size,
            value_of(&ClassTableParams { rows: class_rows }),
        ),
        WidgetInfo::new(
            &partition_title(partition, "Class Separation Quality"),
            WidgetType::BigGraph,
            size,
            value_of(&ClassListParams {
                classes: separation,
            }),
        ),
        WidgetInfo::new(
            &partition_title(partition, "Probability Distribution"),
            WidgetType::BigGraph,
            size,
            value_of(&ClassListParams {
                classes: histograms,
            }),
        ),
        WidgetInfo::new(
            &partition_title(partition, "ROC Curve"),
            WidgetType::BigGraph,
            size,
            value_of(&ClassListParams { classes: roc }),
        ),
        WidgetInfo::new(
            &partition_title(partition, "Precision-Recall Curve"),
            WidgetType::BigGraph,
            size,
            value_of(&ClassListParams { classes: pr }),
        ),
        WidgetInfo::new(
            &partition_title(partition, "Precision-Recall Table"),
            WidgetType::BigTable,
            size,
            value_of(&ClassListParams { classes: pr_tables }),
        ),
    ]
}
