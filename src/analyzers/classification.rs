//! Classification Performance
//!
//! Quality of a classifier that logs hard labels: accuracy, macro
//! averaged precision, recall and F1, the same metrics per class, and
//! the confusion matrix. Works on string labels, numeric columns are
//! read as integer coded classes.
use crate::analyzers::{AnalysisContext, PerfMetrics};
use crate::errors::DriftLensError;
use serde::{Deserialize, Serialize};

/// Quality metrics of a single class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassMetricsRow {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of rows with this actual label.
    pub support: usize,
}

/// Row major confusion matrix, rows are actual labels, columns are
/// predicted labels, both in `labels` order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Shares per row instead of counts. Rows without support come out
    /// as zeros.
    pub fn normalized(&self) -> Vec<Vec<f64>> {
        self.values
            .iter()
            .map(|row| {
                let total: usize = row.iter().sum();
                row.iter()
                    .map(|v| {
                        if total > 0 {
                            *v as f64 / total as f64
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

/// Classification quality of one partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    /// Macro averaged precision.
    pub precision: f64,
    /// Macro averaged recall.
    pub recall: f64,
    /// Macro averaged F1.
    pub f1: f64,
    pub metrics_matrix: Vec<ClassMetricsRow>,
    pub confusion_matrix: ConfusionMatrix,
}

/// Run the classification performance analysis on the reference dataset
/// and, when given, the current dataset.
pub fn calculate(
    ctx: &AnalysisContext,
) -> Result<PerfMetrics<ClassificationMetrics>, DriftLensError> {
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

    // One shared label list keeps the matrices of both partitions
    // aligned. Labels appear in first seen order across the reference
    // target, reference prediction, then the current columns.
    let mut labels: Vec<String> = Vec::new();
    let mut extend_labels = |column: Vec<String>| {
        for label in column {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
    };
    extend_labels(ctx.reference.labels(target)?);
    extend_labels(ctx.reference.labels(prediction)?);
    if let Some(current) = ctx.current {
        extend_labels(current.labels(target)?);
        extend_labels(current.labels(prediction)?);
    }

    let reference = label_metrics(
        &ctx.reference.labels(target)?,
        &ctx.reference.labels(prediction)?,
        &labels,
    );
    let current = match ctx.current {
        Some(frame) => Some(label_metrics(
            &frame.labels(target)?,
            &frame.labels(prediction)?,
            &labels,
        )),
        None => None,
    };
    Ok(PerfMetrics::new(reference, current))
}

/// Confusion matrix and derived quality metrics for one pair of label
/// columns, over a fixed class list.
pub(crate) fn label_metrics(
    actual: &[String],
    predicted: &[String],
    labels: &[String],
) -> ClassificationMetrics {
    let k = labels.len();
    let index_of = |label: &str| labels.iter().position(|l| l == label);
    let mut values = vec![vec![0usize; k]; k];
    let mut correct = 0usize;
    let mut total = 0usize;
    for (a, p) in actual.iter().zip(predicted) {
        if let (Some(ai), Some(pi)) = (index_of(a), index_of(p)) {
            values[ai][pi] += 1;
            total += 1;
            if ai == pi {
                correct += 1;
            }
        }
    }

    let mut metrics_matrix = Vec::with_capacity(k);
    for (ci, label) in labels.iter().enumerate() {
        let support: usize = values[ci].iter().sum();
        let tp = values[ci][ci];
        let predicted_count: usize = values.iter().map(|row| row[ci]).sum();
        let precision = ratio(tp, predicted_count);
        let recall = ratio(tp, support);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        metrics_matrix.push(ClassMetricsRow {
            label: label.clone(),
            precision,
            recall,
            f1,
            support,
        });
    }

    let macro_of = |f: fn(&ClassMetricsRow) -> f64| -> f64 {
        if metrics_matrix.is_empty() {
            f64::NAN
        } else {
            metrics_matrix.iter().map(f).sum::<f64>() / metrics_matrix.len() as f64
        }
    };

    ClassificationMetrics {
        accuracy: if total > 0 {
            correct as f64 / total as f64
        } else {
            f64::NAN
        },
        precision: macro_of(|m| m.precision),
        recall: macro_of(|m| m.recall),
        f1: macro_of(|m| m.f1),
        metrics_matrix,
        confusion_matrix: ConfusionMatrix {
            labels: labels.to_vec(),
            values,
        },
    }
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom > 0 {
        num as f64 / denom as f64
    } else {
        0.0
    }
}
