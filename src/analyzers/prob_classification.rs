//! Probabilistic Classification Performance
//!
//! Quality of a classifier that logs one probability column per class.
//! On top of the hard label metrics this adds ROC AUC, log loss, the
//! score curves per class and a view of how well the predicted
//! probabilities separate each class from the rest.
use crate::analyzers::classification::{label_metrics, ClassMetricsRow, ConfusionMatrix};
use crate::analyzers::{AnalysisContext, PerfMetrics};
use crate::data::DataFrame;
use crate::errors::DriftLensError;
use crate::stats::{histogram, mean, quantile, std_dev, Histogram};
use crate::utils::argsort_desc;
use hashbrown::HashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

// Predicted probabilities are clipped away from 0 and 1 before taking
// logs, matching the usual log loss convention.
const PROBABILITY_CLIP: f64 = 1e-15;

/// Five number summary of a probability sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProbabilitySummary {
    pub mean: f64,
    pub std: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
}

impl ProbabilitySummary {
    fn summarize(values: &[f64]) -> Self {
        ProbabilitySummary {
            mean: mean(values),
            std: std_dev(values),
            q25: quantile(values, 0.25),
            median: quantile(values, 0.5),
            q75: quantile(values, 0.75),
        }
    }
}

/// Predicted probabilities of one class, split by whether the row
/// actually belongs to the class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassSeparation {
    pub positive: ProbabilitySummary,
    pub negative: ProbabilitySummary,
}

/// One point of a ROC curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RocPoint {
    pub threshold: f64,
    pub fpr: f64,
    pub tpr: f64,
}

/// One point of a precision recall curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PrPoint {
    pub threshold: f64,
    pub precision: f64,
    pub recall: f64,
}

/// Quality of the top scored rows of one class, at one share cutoff.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PrTableRow {
    /// Share of rows taken from the top of the score ranking.
    pub top_share: f64,
    pub count: usize,
    /// Lowest predicted probability inside the selection.
    pub probability: f64,
    pub tp: usize,
    pub fp: usize,
    pub precision: f64,
    pub recall: f64,
}

/// Score based detail of one class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDetail {
    pub roc_auc: f64,
    pub separation: ClassSeparation,
    pub probability_hist: Histogram,
    pub roc_curve: Vec<RocPoint>,
    pub pr_curve: Vec<PrPoint>,
    pub pr_table: Vec<PrTableRow>,
}

/// Probabilistic classification quality of one partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Macro averaged one versus rest ROC AUC.
    pub roc_auc: f64,
    pub log_loss: f64,
    pub metrics_matrix: Vec<ClassMetricsRow>,
    pub confusion_matrix: ConfusionMatrix,
    pub classes: HashMap<String, ClassDetail>,
}

/// Run the probabilistic classification performance analysis on the
/// reference dataset and, when given, the current dataset.
pub fn calculate(
    ctx: &AnalysisContext,
) -> Result<PerfMetrics<ProbClassificationMetrics>, DriftLensError> {
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

    let reference = partition_metrics(ctx, ctx.reference, target, prob_cols, "reference")?;
    let current = match ctx.current {
        Some(frame) => Some(partition_metrics(ctx, frame, target, prob_cols, "current")?),
        None => None,
    };
    Ok(PerfMetrics::new(reference, current))
}

/// Hard labels implied by the probability columns: the column with the
/// highest score names the predicted class, ties go to the first
/// column.
pub(crate) fn predicted_labels(
    frame: &DataFrame,
    prob_cols: &[String],
) -> Result<Vec<String>, DriftLensError> {
    let columns: Vec<&[f64]> = prob_cols
        .iter()
        .map(|c| frame.numeric(c))
        .collect::<Result<_, _>>()?;
    let n = columns.first().map_or(0, |c| c.len());
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let mut best = 0;
        for ci in 1..columns.len() {
            if columns[ci][i] > columns[best][i] {
                best = ci;
            }
        }
        labels.push(prob_cols[best].clone());
    }
    Ok(labels)
}

fn partition_metrics(
    ctx: &AnalysisContext,
    frame: &DataFrame,
    target: &str,
    prob_cols: &[String],
    partition: &str,
) -> Result<ProbClassificationMetrics, DriftLensError> {
    let actual = frame.labels(target)?;
    let class_of = |label: &String| -> Result<usize, DriftLensError> {
        prob_cols.iter().position(|c| c == label).ok_or_else(|| {
            DriftLensError::UnknownLabel(label.clone(), format!("the {} target", partition))
        })
    };
    for label in &actual {
        class_of(label)?;
    }

    let columns: Vec<&[f64]> = prob_cols
        .iter()
        .map(|c| frame.numeric(c))
        .collect::<Result<_, _>>()?;
    let predicted = predicted_labels(frame, prob_cols)?;
    let base = label_metrics(&actual, &predicted, prob_cols);

    let mut loss = 0.0;
    for (i, label) in actual.iter().enumerate() {
        let p = columns[class_of(label)?][i].clamp(PROBABILITY_CLIP, 1.0 - PROBABILITY_CLIP);
        loss -= p.ln();
    }
    let log_loss = loss / actual.len() as f64;

    let details: Vec<(String, ClassDetail)> = prob_cols
        .par_iter()
        .enumerate()
        .map(|(ci, class)| {
            let scores = columns[ci];
            let y: Vec<bool> = actual.iter().map(|l| l == class).collect();
            let positive: Vec<f64> = scores
                .iter()
                .zip(&y)
                .filter(|(_, member)| **member)
                .map(|(s, _)| *s)
                .collect();
            let negative: Vec<f64> = scores
                .iter()
                .zip(&y)
                .filter(|(_, member)| !**member)
                .map(|(s, _)| *s)
                .collect();
            let (roc_curve, pr_curve) = score_curves(&y, scores);
            (
                class.clone(),
                ClassDetail {
                    roc_auc: roc_auc(&y, scores),
                    separation: ClassSeparation {
                        positive: ProbabilitySummary::summarize(&positive),
                        negative: ProbabilitySummary::summarize(&negative),
                    },
                    probability_hist: histogram(scores, ctx.options.n_bins),
                    roc_curve,
                    pr_curve,
                    pr_table: pr_table(&y, scores),
                },
            )
        })
        .collect();

    let finite_aucs: Vec<f64> = details
        .iter()
        .map(|(_, d)| d.roc_auc)
        .filter(|v| v.is_finite())
        .collect();

    Ok(ProbClassificationMetrics {
        accuracy: base.accuracy,
        precision: base.precision,
        recall: base.recall,
        f1: base.f1,
        roc_auc: mean(&finite_aucs),
        log_loss,
        metrics_matrix: base.metrics_matrix,
        confusion_matrix: base.confusion_matrix,
        classes: details.into_iter().collect(),
    })
}

/// One versus rest ROC AUC by summing trapezoids over the ranked
/// scores. `NaN` when the partition holds only one of the two sides.
pub(crate) fn roc_auc(y: &[bool], scores: &[f64]) -> f64 {
    let order = argsort_desc(scores);
    let mut auc = 0.0;
    let (mut tp, mut fp) = (0.0f64, 0.0f64);
    let (mut last_tp, mut last_fp) = (0.0f64, 0.0f64);
    for (i, idx) in order.iter().enumerate() {
        if i > 0 && scores[*idx] != scores[order[i - 1]] {
            auc += trapezoid_area(last_fp, fp, last_tp, tp);
            last_tp = tp;
            last_fp = fp;
        }
        if y[*idx] {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
    }
    auc += trapezoid_area(last_fp, fp, last_tp, tp);
    if tp <= 0.0 || fp <= 0.0 {
        f64::NAN
    } else {
        auc / (tp * fp)
    }
}

fn trapezoid_area(x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    (x1 - x0).abs() * (y0 + y1) * 0.5
}

// ROC and precision recall curves over the distinct score thresholds,
// highest threshold first.
fn score_curves(y: &[bool], scores: &[f64]) -> (Vec<RocPoint>, Vec<PrPoint>) {
    let order = argsort_desc(scores);
    let positives = y.iter().filter(|v| **v).count() as f64;
    let negatives = y.len() as f64 - positives;
    let mut roc = Vec::new();
    let mut pr = Vec::new();
    let mut tp = 0.0f64;
    let mut fp = 0.0f64;
    let mut i = 0;
    while i < order.len() {
        let threshold = scores[order[i]];
        while i < order.len() && scores[order[i]] == threshold {
            if y[order[i]] {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            i += 1;
        }
        roc.push(RocPoint {
            threshold,
            fpr: if negatives > 0.0 { fp / negatives } else { 0.0 },
            tpr: if positives > 0.0 { tp / positives } else { 0.0 },
        });
        pr.push(PrPoint {
            threshold,
            precision: if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 },
            recall: if positives > 0.0 { tp / positives } else { 0.0 },
        });
    }
    (roc, pr)
}

// Selection quality when taking the top scored rows, in five percent
// steps of the row count.
fn pr_table(y: &[bool], scores: &[f64]) -> Vec<PrTableRow> {
    let order = argsort_desc(scores);
    let n = order.len();
    if n == 0 {
        return Vec::new();
    }
    let positives = y.iter().filter(|v| **v).count();
    let mut rows = Vec::with_capacity(20);
    for step in 1..=20usize {
        let top_share = step as f64 * 0.05;
        let count = ((top_share * n as f64).round() as usize).clamp(1, n);
        let tp = order[..count].iter().filter(|i| y[**i]).count();
        let fp = count - tp;
        rows.push(PrTableRow {
            top_share,
            count,
            probability: scores[order[count - 1]],
            tp,
            fp,
            precision: tp as f64 / count as f64,
            recall: if positives > 0 {
                tp as f64 / positives as f64
            } else {
                0.0
            },
        });
    }
    rows
}
