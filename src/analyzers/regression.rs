//! Regression Performance
//!
//! Error profile of a regression model: aggregate error statistics, a
//! normality check of the error distribution, and a breakdown of the
//! rows the model underestimates and overestimates most, traced back to
//! the feature values of those rows.
use crate::analyzers::{AnalysisContext, PerfMetrics};
use crate::data::DataFrame;
use crate::errors::DriftLensError;
use crate::stats::{histogram, linear_fit, mean, normal_ppf, quantile, std_dev, Histogram};
use crate::utils::cmp_f64;
use hashbrown::HashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Straight line fit of the error quantiles against the quantiles of a
/// normal distribution. A correlation near one means normal errors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ErrorNormality {
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
}

/// Error statistics of one error group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GroupStats {
    pub mean_error: f64,
    pub std_error: f64,
}

/// Error statistics split into the majority of rows and the extreme
/// five percent tails on both sides.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Underperformance {
    pub majority: GroupStats,
    pub underestimation: GroupStats,
    pub overestimation: GroupStats,
}

/// Mean value of one feature inside each error group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ErrorBiasEntry {
    pub majority: f64,
    pub underestimation: f64,
    pub overestimation: f64,
}

/// Regression quality of one partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mean_error: f64,
    pub mean_abs_error: f64,
    /// Mean absolute percentage error over the rows with a non zero
    /// actual value, so a single zero target cannot blow it up.
    pub mean_abs_perc_error: f64,
    pub error_std: f64,
    pub abs_error_std: f64,
    pub abs_perc_error_std: f64,
    pub error_normality: ErrorNormality,
    pub underperformance: Underperformance,
    pub error_buckets: Histogram,
    /// Per feature mean values inside each error group.
    pub error_bias: HashMap<String, ErrorBiasEntry>,
}

/// Run the regression performance analysis on the reference dataset
/// and, when given, the current dataset.
pub fn calculate(ctx: &AnalysisContext) -> Result<PerfMetrics<RegressionMetrics>, DriftLensError> {
    let target = ctx.columns.target.as_deref().ok_or_else(|| {
        DriftLensError::MissingRole("target".to_string(), "regression performance".to_string())
    })?;
    let prediction = ctx.columns.prediction_name().ok_or_else(|| {
        DriftLensError::MissingRole(
            "prediction".to_string(),
            "regression performance".to_string(),
        )
    })?;

    let reference = partition_metrics(ctx, ctx.reference, target, prediction, "reference")?;
    let current = match ctx.current {
        Some(frame) => Some(partition_metrics(ctx, frame, target, prediction, "current")?),
        None => None,
    };
    Ok(PerfMetrics::new(reference, current))
}

/// Actual and predicted values of the rows where both are finite.
pub(crate) fn paired_series(
    frame: &DataFrame,
    target: &str,
    prediction: &str,
) -> Result<(Vec<f64>, Vec<f64>), DriftLensError> {
    let actual = frame.numeric(target)?;
    let predicted = frame.numeric(prediction)?;
    let mut a = Vec::with_capacity(actual.len());
    let mut p = Vec::with_capacity(predicted.len());
    for (x, y) in actual.iter().zip(predicted) {
        if x.is_finite() && y.is_finite() {
            a.push(*x);
            p.push(*y);
        }
    }
    Ok((a, p))
}

/// Quantile-quantile points of the errors against a standard normal:
/// theoretical quantiles paired with the sorted observed errors.
pub(crate) fn qq_points(errors: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = errors.len();
    if n < 2 {
        return (Vec::new(), Vec::new());
    }
    let mut observed = errors.to_vec();
    observed.sort_unstable_by(cmp_f64);
    // Uniform order statistic medians, Filliben's estimate.
    let tail = 0.5f64.powf(1.0 / n as f64);
    let theoretical: Vec<f64> = (0..n)
        .map(|i| {
            let m = if i == 0 {
                1.0 - tail
            } else if i == n - 1 {
                tail
            } else {
                ((i + 1) as f64 - 0.3175) / (n as f64 + 0.365)
            };
            normal_ppf(m)
        })
        .collect();
    (theoretical, observed)
}

fn partition_metrics(
    ctx: &AnalysisContext,
    frame: &DataFrame,
    target: &str,
    prediction: &str,
    partition: &str,
) -> Result<RegressionMetrics, DriftLensError> {
    let actual_all = frame.numeric(target)?;
    let predicted_all = frame.numeric(prediction)?;
    let rows: Vec<usize> = (0..frame.n_rows())
        .filter(|i| actual_all[*i].is_finite() && predicted_all[*i].is_finite())
        .collect();
    if rows.is_empty() {
        return Err(DriftLensError::EmptyDataset(format!(
            "{} (no rows with finite target and prediction)",
            partition
        )));
    }

    let error: Vec<f64> = rows.iter().map(|i| predicted_all[*i] - actual_all[*i]).collect();
    let abs_error: Vec<f64> = error.iter().map(|e| e.abs()).collect();
    let abs_perc_error: Vec<f64> = rows
        .iter()
        .filter(|i| actual_all[**i] != 0.0)
        .map(|i| ((predicted_all[*i] - actual_all[*i]) / actual_all[*i]).abs() * 100.0)
        .collect();

    let (theoretical, observed) = qq_points(&error);
    let (slope, intercept, r) = linear_fit(&theoretical, &observed);

    let lower_cut = quantile(&error, 0.05);
    let upper_cut = quantile(&error, 0.95);
    let group_of = |e: f64| -> ErrorGroup {
        if e <= lower_cut {
            ErrorGroup::Underestimation
        } else if e >= upper_cut {
            ErrorGroup::Overestimation
        } else {
            ErrorGroup::Majority
        }
    };
    let groups: Vec<ErrorGroup> = error.iter().map(|e| group_of(*e)).collect();
    let group_errors = |g: ErrorGroup| -> Vec<f64> {
        error
            .iter()
            .zip(&groups)
            .filter(|(_, gg)| **gg == g)
            .map(|(e, _)| *e)
            .collect()
    };
    let group_stats = |g: ErrorGroup| -> GroupStats {
        let values = group_errors(g);
        GroupStats {
            mean_error: mean(&values),
            std_error: std_dev(&values),
        }
    };
    let underperformance = Underperformance {
        majority: group_stats(ErrorGroup::Majority),
        underestimation: group_stats(ErrorGroup::Underestimation),
        overestimation: group_stats(ErrorGroup::Overestimation),
    };

    let error_bias = ctx
        .columns
        .num_features
        .par_iter()
        .map(|feature| {
            let values = frame.numeric(feature)?;
            let group_mean = |g: ErrorGroup| -> f64 {
                let group: Vec<f64> = rows
                    .iter()
                    .zip(&groups)
                    .filter(|(_, gg)| **gg == g)
                    .map(|(i, _)| values[*i])
                    .collect();
                mean(&group)
            };
            Ok((
                feature.clone(),
                ErrorBiasEntry {
                    majority: group_mean(ErrorGroup::Majority),
                    underestimation: group_mean(ErrorGroup::Underestimation),
                    overestimation: group_mean(ErrorGroup::Overestimation),
                },
            ))
        })
        .collect::<Result<Vec<(String, ErrorBiasEntry)>, DriftLensError>>()?;

    Ok(RegressionMetrics {
        mean_error: mean(&error),
        mean_abs_error: mean(&abs_error),
        mean_abs_perc_error: mean(&abs_perc_error),
        error_std: std_dev(&error),
        abs_error_std: std_dev(&abs_error),
        abs_perc_error_std: std_dev(&abs_perc_error),
        error_normality: ErrorNormality {
            slope,
            intercept,
            r,
        },
        underperformance,
        error_buckets: histogram(&error, ctx.options.n_bins),
        error_bias: error_bias.into_iter().collect(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorGroup {
    Majority,
    Underestimation,
    Overestimation,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::DriftOptions;
    use crate::mapping::{ColumnMapping, ResolvedColumns};

    fn regression_frame(n: usize, noise: f64) -> DataFrame {
        let mut frame = DataFrame::new();
        let feature: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let target: Vec<f64> = feature.iter().map(|v| 2.0 * v + 1.0).collect();
        let prediction: Vec<f64> = target
            .iter()
            .enumerate()
            .map(|(i, v)| v + if i % 2 == 0 { noise } else { -noise })
            .collect();
        frame.push_numeric("f1", feature).unwrap();
        frame.push_numeric("target", target).unwrap();
        frame.push_numeric("prediction", prediction).unwrap();
        frame
    }

    fn run(reference: &DataFrame, current: Option<&DataFrame>) -> PerfMetrics<RegressionMetrics> {
        let mapping = ColumnMapping::default();
        let columns = ResolvedColumns::resolve(reference, current, &mapping).unwrap();
        let options = DriftOptions::default();
        let ctx = AnalysisContext {
            reference,
            current,
            columns: &columns,
            options: &options,
        };
        calculate(&ctx).unwrap()
    }

    #[test]
    fn test_single_partition() {
        let reference = regression_frame(50, 1.0);
        let res = run(&reference, None);
        assert!(res.current.is_none());
        let m = &res.reference;
        // Symmetric +/- 1 noise: zero mean error, unit absolute error.
        assert!(m.mean_error.abs() < 1e-12);
        assert!((m.mean_abs_error - 1.0).abs() < 1e-12);
        assert!(m.mean_abs_perc_error > 0.0);
        assert_eq!(m.error_buckets.counts.iter().sum::<usize>(), 50);
        assert!(m.error_bias.contains_key("f1"));
    }

    #[test]
    fn test_both_partitions() {
        let reference = regression_frame(50, 1.0);
        let current = regression_frame(30, 3.0);
        let res = run(&reference, Some(&current));
        let current = res.current.as_ref().unwrap();
        assert!((current.mean_abs_error - 3.0).abs() < 1e-12);
        assert!(current.mean_abs_error > res.reference.mean_abs_error);
    }

    #[test]
    fn test_normality_of_uniform_grid() {
        // A flat error grid is still highly correlated with the normal
        // quantiles, but not perfectly.
        let reference = regression_frame(100, 1.0);
        let res = run(&reference, None);
        let normality = res.reference.error_normality;
        assert!(normality.r.abs() <= 1.0);
        assert!(normality.slope.is_finite());
    }

    #[test]
    fn test_underperformance_groups() {
        let mut frame = DataFrame::new();
        let n = 100;
        frame
            .push_numeric("f1", (0..n).map(|i| i as f64).collect())
            .unwrap();
        frame.push_numeric("target", vec![10.0; n]).unwrap();
        // Errors spread uniformly from -49.5 to 49.5, so the five
        // percent tails hold exactly five rows each.
        let prediction: Vec<f64> = (0..n).map(|i| 10.0 + i as f64 - 49.5).collect();
        frame.push_numeric("prediction", prediction).unwrap();
        let res = run(&frame, None);
        let u = res.reference.underperformance;
        assert!((u.underestimation.mean_error - (-47.5)).abs() < 1e-9);
        assert!((u.overestimation.mean_error - 47.5).abs() < 1e-9);
        assert!(u.majority.mean_error.abs() < 1e-9);
        // The tails sit on the low and high ends of the feature.
        let bias = &res.reference.error_bias["f1"];
        assert!((bias.underestimation - 2.0).abs() < 1e-9);
        assert!((bias.overestimation - 97.0).abs() < 1e-9);
    }

    #[test]
    fn test_prediction_column_is_required() {
        let mut frame = DataFrame::new();
        frame.push_numeric("f1", vec![1.0, 2.0, 3.0]).unwrap();
        frame.push_numeric("target", vec![1.0, 2.0, 3.0]).unwrap();
        let mapping = ColumnMapping::default();
        let columns = ResolvedColumns::resolve(&frame, None, &mapping).unwrap();
        let options = DriftOptions::default();
        let ctx = AnalysisContext {
            reference: &frame,
            current: None,
            columns: &columns,
            options: &options,
        };
        let res = calculate(&ctx);
        assert!(matches!(res, Err(DriftLensError::MissingRole(_, _))));
    }
}
