//! Classification performance tab: quality counters, class level
//! breakdowns and the per feature quality table.
use crate::analyzers::classification::{ClassificationMetrics, ConfusionMatrix};
use crate::analyzers::{AnalysisContext, PerfMetrics};
use crate::dashboard::widgets::{display_label, partition_title, value_of, WidgetInfo, WidgetType};
use crate::data::DataFrame;
use crate::errors::DriftLensError;
use crate::stats::{mean, value_counts, LabelCount};
use serde::Serialize;

#[derive(Serialize)]
struct ReportParams<'a> {
    target: &'a str,
    prediction: &'a str,
    n_classes: usize,
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
}

impl QualityParams {
    fn new(m: &ClassificationMetrics) -> Self {
        QualityParams {
            accuracy: m.accuracy,
            precision: m.precision,
            recall: m.recall,
            f1: m.f1,
        }
    }
}

#[derive(Serialize)]
struct RepresentationParams {
    classes: Vec<String>,
    counts: Vec<usize>,
}

#[derive(Serialize)]
struct MatrixParams {
    labels: Vec<String>,
    values: Vec<Vec<usize>>,
}

#[derive(Serialize)]
struct NormalizedMatrixParams {
    labels: Vec<String>,
    values: Vec<Vec<f64>>,
}

#[derive(Serialize)]
struct ClassRow {
    label: String,
    precision: f64,
    recall: f64,
    f1: f64,
    support: usize,
}

#[derive(Serialize)]
struct ClassTableParams {
    rows: Vec<ClassRow>,
}

#[derive(Serialize)]
struct QualitySummaryRow<'a> {
    partition: &'a str,
    accuracy: f64,
    precision: f64,
    recall: f64,
    f1: f64,
}

#[derive(Serialize)]
struct QualitySummaryParams<'a> {
    rows: Vec<QualitySummaryRow<'a>>,
}

#[derive(Serialize)]
struct DistributionPartition<'a> {
    partition: &'a str,
    distribution: Vec<LabelCount>,
}

#[derive(Serialize)]
struct DistributionParams<'a> {
    partitions: Vec<DistributionPartition<'a>>,
}

#[derive(Serialize)]
pub(crate) struct FeatureQualityEntry {
    pub correct_mean: f64,
    pub wrong_mean: f64,
}

#[derive(Serialize)]
pub(crate) struct FeatureQualityRow<'a> {
    pub feature: &'a str,
    pub reference: FeatureQualityEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<FeatureQualityEntry>,
}

pub fn build(
    ctx: &AnalysisContext,
    metrics: &PerfMetrics<ClassificationMetrics>,
) -> Result<Vec<WidgetInfo>, DriftLensError> {
    let target = ctx.columns.target.as_deref().ok_or_else(|| {
        DriftLensError::MissingRole(
            "target".to_string(),
            "classification performance".to_string(),
        )
    })?;
    let prediction = ctx.columns.prediction_name().ok_or_else(|| {
        DriftLensError::MissingRole(
            "prediction".to_string(),
            "classification performance".to_string(),
        )
    })?;
    let names = ctx.columns.target_names.as_ref();
    let reference = &metrics.reference;

    let mut widgets = vec![
        WidgetInfo::new(
            "Classification Model Performance Report",
            WidgetType::Counter,
            2,
            value_of(&ReportParams {
                target,
                prediction,
                n_classes: reference.confusion_matrix.labels.len(),
                reference_rows: ctx.reference.n_rows(),
                current_rows: ctx.current.map(|f| f.n_rows()),
            }),
        ),
        WidgetInfo::new(
            &partition_title("reference", "Model Quality With Macro-average Metrics"),
            WidgetType::Counter,
            2,
            value_of(&QualityParams::new(reference)),
        ),
    ];
    if let Some(current) = &metrics.current {
        widgets.push(WidgetInfo::new(
            &partition_title("current", "Model Quality With Macro-average Metrics"),
            WidgetType::Counter,
            2,
            value_of(&QualityParams::new(current)),
        ));
    }

    widgets.push(WidgetInfo::new(
        &partition_title("reference", "Class Representation"),
        WidgetType::BigGraph,
        2,
        value_of(&RepresentationParams {
            classes: reference
                .metrics_matrix
                .iter()
                .map(|row| display_label(&row.label, names))
                .collect(),
            counts: reference.metrics_matrix.iter().map(|row| row.support).collect(),
        }),
    ));
    widgets.push(confusion_widget("reference", &reference.confusion_matrix, names));
    widgets.push(WidgetInfo::new(
        &partition_title("reference", "Confusion Matrix (Normalized)"),
        WidgetType::BigGraph,
        2,
        value_of(&NormalizedMatrixParams {
            labels: display_labels(&reference.confusion_matrix, names),
            values: reference.confusion_matrix.normalized(),
        }),
    ));
    widgets.push(WidgetInfo::new(
        &partition_title("reference", "Quality Metrics by Class"),
        WidgetType::Table,
        2,
        value_of(&ClassTableParams {
            rows: reference
                .metrics_matrix
                .iter()
                .map(|row| ClassRow {
                    label: display_label(&row.label, names),
                    precision: row.precision,
                    recall: row.recall,
                    f1: row.f1,
                    support: row.support,
                })
                .collect(),
        }),
    ));

    let mut summary_rows = vec![QualitySummaryRow {
        partition: "reference",
        accuracy: reference.accuracy,
        precision: reference.precision,
        recall: reference.recall,
        f1: reference.f1,
    }];
    if let Some(current) = &metrics.current {
        summary_rows.push(QualitySummaryRow {
            partition: "current",
            accuracy: current.accuracy,
            precision: current.precision,
            recall: current.recall,
            f1: current.f1,
        });
    }
    widgets.push(WidgetInfo::new(
        "Model Quality Summary",
        WidgetType::Table,
        2,
        value_of(&QualitySummaryParams { rows: summary_rows }),
    ));

    let mut distribution = vec![DistributionPartition {
        partition: "reference",
        distribution: display_counts(ctx.reference, prediction, names)?,
    }];
    if let Some(current) = ctx.current {
        distribution.push(DistributionPartition {
            partition: "current",
            distribution: display_counts(current, prediction, names)?,
        });
    }
    widgets.push(WidgetInfo::new(
        "Prediction Distribution",
        WidgetType::BigGraph,
        2,
        value_of(&DistributionParams {
            partitions: distribution,
        }),
    ));

    let predicted_of = |frame: &DataFrame| frame.labels(prediction);
    widgets.push(feature_quality_widget(ctx, target, predicted_of)?);

    Ok(widgets)
}

fn confusion_widget(
    partition: &str,
    matrix: &ConfusionMatrix,
    names: Option<&Vec<String>>,
) -> WidgetInfo {
    WidgetInfo::new(
        &partition_title(partition, "Confusion Matrix"),
        WidgetType::BigGraph,
        2,
        value_of(&MatrixParams {
            labels: display_labels(matrix, names),
            values: matrix.values.clone(),
        }),
    )
}

fn display_labels(matrix: &ConfusionMatrix, names: Option<&Vec<String>>) -> Vec<String> {
    matrix
        .labels
        .iter()
        .map(|label| display_label(label, names))
        .collect()
}

fn display_counts(
    frame: &DataFrame,
    column: &str,
    names: Option<&Vec<String>>,
) -> Result<Vec<LabelCount>, DriftLensError> {
    Ok(value_counts(&frame.labels(column)?)
        .into_iter()
        .map(|entry| LabelCount {
            label: display_label(&entry.label, names),
            count: entry.count,
        })
        .collect())
}

/// Mean value of every numerical feature among the correctly and the
/// wrongly classified rows, for both partitions. Shared with the
/// probabilistic tab, which derives its hard labels from the score
/// columns first.
pub(crate) fn feature_quality_widget<F>(
    ctx: &AnalysisContext,
    target: &str,
    predicted_of: F,
) -> Result<WidgetInfo, DriftLensError>
where
    F: Fn(&DataFrame) -> Result<Vec<String>, DriftLensError>,
{
    #[derive(Serialize)]
    struct Params<'a> {
        rows: Vec<FeatureQualityRow<'a>>,
    }

    let entry_of = |frame: &DataFrame,
                    feature: &str,
                    predicted: &[String]|
     -> Result<FeatureQualityEntry, DriftLensError> {
        let actual = frame.labels(target)?;
        let values = frame.numeric(feature)?;
        let mut correct = Vec::new();
        let mut wrong = Vec::new();
        for ((value, a), p) in values.iter().zip(&actual).zip(predicted) {
            if a == p {
                correct.push(*value);
            } else {
                wrong.push(*value);
            }
        }
        Ok(FeatureQualityEntry {
            correct_mean: mean(&correct),
            wrong_mean: mean(&wrong),
        })
    };

    let reference_predicted = predicted_of(ctx.reference)?;
    let current_predicted = match ctx.current {
        Some(frame) => Some(predicted_of(frame)?),
        None => None,
    };

    let mut rows = Vec::with_capacity(ctx.columns.num_features.len());
    for feature in &ctx.columns.num_features {
        let reference = entry_of(ctx.reference, feature, &reference_predicted)?;
        let current = match (ctx.current, &current_predicted) {
            (Some(frame), Some(predicted)) => Some(entry_of(frame, feature, predicted)?),
            _ => None,
        };
        rows.push(FeatureQualityRow {
            feature,
            reference,
            current,
        });
    }
    Ok(WidgetInfo::new(
        "Classification Quality by Feature",
        WidgetType::BigTable,
        2,
        value_of(&Params { rows }),
    ))
}
