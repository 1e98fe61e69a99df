//! Statistics
//!
//! Two sample tests and the distribution summaries the analyzers are
//! built on. Everything works on plain `f64` slices, missing values are
//! `NaN` and are filtered before testing.
use crate::utils::cmp_f64;
use serde::{Deserialize, Serialize};

/// Result of a two sample Kolmogorov-Smirnov test.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KsTest {
    /// Largest distance between the two empirical distribution functions.
    pub statistic: f64,
    /// Asymptotic p-value of the distance.
    pub p_value: f64,
}

/// Result of a Pearson chi-square test between two frequency tables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChiSquareTest {
    pub statistic: f64,
    pub p_value: f64,
}

/// Binned view of a numeric sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Histogram {
    /// Observations per bin.
    pub counts: Vec<usize>,
    /// Bin boundaries, one more entry than `counts`.
    pub edges: Vec<f64>,
}

/// One label of a categorical frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Two sample Kolmogorov-Smirnov test with an asymptotic p-value.
///
/// `NaN` values are dropped from both samples. When either sample ends
/// up empty the result carries `NaN` for both fields, which downstream
/// drift decisions treat as not drifted.
pub fn ks_test(a: &[f64], b: &[f64]) -> KsTest {
    let mut x: Vec<f64> = a.iter().copied().filter(|v| !v.is_nan()).collect();
    let mut y: Vec<f64> = b.iter().copied().filter(|v| !v.is_nan()).collect();
    if x.is_empty() || y.is_empty() {
        return KsTest {
            statistic: f64::NAN,
            p_value: f64::NAN,
        };
    }
    x.sort_unstable_by(cmp_f64);
    y.sort_unstable_by(cmp_f64);
    let (n, m) = (x.len(), y.len());
    let mut i = 0;
    let mut j = 0;
    let mut statistic: f64 = 0.0;
    while i < n && j < m {
        let value = x[i].min(y[j]);
        while i < n && x[i] <= value {
            i += 1;
        }
        while j < m && y[j] <= value {
            j += 1;
        }
        let distance = (i as f64 / n as f64 - j as f64 / m as f64).abs();
        if distance > statistic {
            statistic = distance;
        }
    }
    let n_eff = (n as f64 * m as f64) / (n + m) as f64;
    let lambda = (n_eff.sqrt() + 0.12 + 0.11 / n_eff.sqrt()) * statistic;
    KsTest {
        statistic,
        p_value: kolmogorov_survival(lambda),
    }
}

// Survival function of the Kolmogorov distribution via its alternating
// series. Falls back to 1.0 when the series does not converge, which
// only happens for tiny lambda where the true value is 1 anyway.
fn kolmogorov_survival(lambda: f64) -> f64 {
    let a2 = -2.0 * lambda * lambda;
    let mut fac = 2.0;
    let mut sum = 0.0;
    let mut term_bf = 0.0;
    for j in 1i32..=100 {
        let term = fac * (a2 * (j * j) as f64).exp();
        sum += term;
        if term.abs() <= 0.001 * term_bf || term.abs() <= 1e-8 * sum.abs() {
            return sum.clamp(0.0, 1.0);
        }
        fac = -fac;
        term_bf = term.abs();
    }
    1.0
}

/// Pearson chi-square test of an observed frequency table against an
/// expected one. The expected table is rescaled to the observed total,
/// so the two tables may come from samples of different size.
///
/// Returns `NaN` fields when the tables are unusable: mismatched
/// lengths, fewer than two cells or an empty total.
pub fn chi_square_test(observed: &[f64], expected: &[f64]) -> ChiSquareTest {
    let obs_total: f64 = observed.iter().sum();
    let exp_total: f64 = expected.iter().sum();
    if observed.len() != expected.len()
        || observed.len() < 2
        || obs_total <= 0.0
        || exp_total <= 0.0
    {
        return ChiSquareTest {
            statistic: f64::NAN,
            p_value: f64::NAN,
        };
    }
    let scale = obs_total / exp_total;
    let mut statistic = 0.0;
    for (o, e) in observed.iter().zip(expected) {
        let e = e * scale;
        if e > 0.0 {
            statistic += (o - e) * (o - e) / e;
        }
    }
    let dof = (observed.len() - 1) as f64;
    ChiSquareTest {
        statistic,
        p_value: gamma_q(dof / 2.0, statistic / 2.0),
    }
}

// Natural log of the gamma function, Lanczos approximation.
fn ln_gamma(x: f64) -> f64 {
    const COEF: [f64; 6] = [
        76.18009172947146,
        -86.50532032941677,
        24.01409824083091,
        -1.231739572450155,
        0.1208650973866179e-2,
        -0.5395239384953e-5,
    ];
    let mut denom = x;
    let tmp = x + 5.5;
    let tmp = (x + 0.5) * tmp.ln() - tmp;
    let mut series = 1.000000000190015;
    for c in COEF {
        denom += 1.0;
        series += c / denom;
    }
    tmp + (2.5066282746310005 * series / x).ln()
}

/// Regularized upper incomplete gamma function Q(a, x). The survival
/// function of a chi-square distribution with `k` degrees of freedom at
/// `s` is `gamma_q(k / 2, s / 2)`.
pub fn gamma_q(a: f64, x: f64) -> f64 {
    if a <= 0.0 || x < 0.0 || x.is_nan() {
        return f64::NAN;
    }
    if x == 0.0 {
        return 1.0;
    }
    if x < a + 1.0 {
        1.0 - gamma_p_series(a, x)
    } else {
        gamma_q_fraction(a, x)
    }
}

// Series expansion of P(a, x), accurate for x < a + 1.
fn gamma_p_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut sum = 1.0 / a;
    let mut del = sum;
    for _ in 0..300 {
        ap += 1.0;
        del *= x / ap;
        sum += del;
        if del.abs() < sum.abs() * 1e-14 {
            break;
        }
    }
    sum * (a * x.ln() - x - ln_gamma(a)).exp()
}

// Continued fraction expansion of Q(a, x), accurate for x >= a + 1.
fn gamma_q_fraction(a: f64, x: f64) -> f64 {
    const FPMIN: f64 = 1e-300;
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / FPMIN;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..300 {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = b + an / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < 1e-14 {
            break;
        }
    }
    (a * x.ln() - x - ln_gamma(a)).exp() * h
}

/// Bin finite values into `bins` equal width bins spanning the sample
/// range. The top edge is inclusive. A constant sample collapses into
/// a single bin.
pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Histogram {
            counts: Vec::new(),
            edges: Vec::new(),
        };
    }
    let lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        return Histogram {
            counts: vec![finite.len()],
            edges: vec![lo, hi],
        };
    }
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &finite {
        let mut bin = ((v - lo) / width) as usize;
        if bin >= bins {
            bin = bins - 1;
        }
        counts[bin] += 1;
    }
    let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
    Histogram { counts, edges }
}

/// Frequency table of string labels, in first seen order.
pub fn value_counts(labels: &[String]) -> Vec<LabelCount> {
    let mut order: Vec<LabelCount> = Vec::new();
    let mut index: hashbrown::HashMap<&str, usize> = hashbrown::HashMap::new();
    for label in labels {
        match index.get(label.as_str()) {
            Some(i) => order[*i].count += 1,
            None => {
                index.insert(label.as_str(), order.len());
                order.push(LabelCount {
                    label: label.clone(),
                    count: 1,
                });
            }
        }
    }
    order
}

/// Arithmetic mean, `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation with the n - 1 denominator, `NaN` below
/// two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Quantile with linear interpolation between order statistics.
/// `q` is clamped into [0, 1]. `NaN` for an empty slice.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(cmp_f64);
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

/// Inverse of the standard normal cumulative distribution function,
/// rational approximation with relative error below 1.2e-9.
pub fn normal_ppf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e1,
        2.209460984245205e2,
        -2.759285104469687e2,
        1.383577518672690e2,
        -3.066479806614716e1,
        2.506628277459239e0,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e1,
        1.615858368580409e2,
        -1.556989798598866e2,
        6.680131188771972e1,
        -1.328068155288572e1,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-3,
        -3.223964580411365e-1,
        -2.400758277161838e0,
        -2.549732539343734e0,
        4.374664141464968e0,
        2.938163982698783e0,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-3,
        3.224671290700398e-1,
        2.445134137142996e0,
        3.754408661907416e0,
    ];
    const P_LOW: f64 = 0.02425;

    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -((((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0))
    }
}

/// Least squares straight line through the point cloud, returned as
/// `(slope, intercept, correlation)`.
pub fn linear_fit(x: &[f64], y: &[f64]) -> (f64, f64, f64) {
    if x.len() != y.len() || x.len() < 2 {
        return (f64::NAN, f64::NAN, f64::NAN);
    }
    let mx = mean(x);
    let my = mean(y);
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        cov += (xi - mx) * (yi - my);
        var_x += (xi - mx) * (xi - mx);
        var_y += (yi - my) * (yi - my);
    }
    if var_x == 0.0 {
        return (f64::NAN, f64::NAN, f64::NAN);
    }
    let slope = cov / var_x;
    let intercept = my - slope * mx;
    let r = if var_y == 0.0 {
        f64::NAN
    } else {
        cov / (var_x.sqrt() * var_y.sqrt())
    };
    (slope, intercept, r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ks_identical_samples() {
        let a: Vec<f64> = (0..100).map(|i| i as f64 * 0.01).collect();
        let res = ks_test(&a, &a);
        assert_eq!(res.statistic, 0.0);
        assert_eq!(res.p_value, 1.0);
    }

    #[test]
    fn test_ks_disjoint_samples() {
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let b = vec![6.0, 7.0, 8.0, 9.0, 10.0];
        let res = ks_test(&a, &b);
        assert_eq!(res.statistic, 1.0);
        assert!(res.p_value < 0.01);
    }

    #[test]
    fn test_ks_shifted_sample() {
        let a: Vec<f64> = (0..100).map(|i| i as f64 * 0.01).collect();
        let b: Vec<f64> = a.iter().map(|v| v + 0.5).collect();
        let res = ks_test(&a, &b);
        assert!((res.statistic - 0.5).abs() < 1e-12);
        assert!(res.p_value < 1e-6);
    }

    #[test]
    fn test_ks_empty_sample() {
        let res = ks_test(&[], &[1.0, 2.0]);
        assert!(res.statistic.is_nan());
        assert!(res.p_value.is_nan());
    }

    #[test]
    fn test_chi_square_against_known_value() {
        // scipy.stats.chisquare([16, 18, 16, 14, 12, 12], [16, 16, 16, 16, 16, 8])
        let observed = vec![16.0, 18.0, 16.0, 14.0, 12.0, 12.0];
        let expected = vec![16.0, 16.0, 16.0, 16.0, 16.0, 8.0];
        let res = chi_square_test(&observed, &expected);
        assert!((res.statistic - 3.5).abs() < 1e-12);
        assert!((res.p_value - 0.6233).abs() < 1e-3);
    }

    #[test]
    fn test_chi_square_rescales_expected() {
        let observed = vec![10.0, 20.0];
        let expected = vec![150.0, 150.0];
        let res = chi_square_test(&observed, &expected);
        assert!((res.statistic - 10.0 / 3.0).abs() < 1e-12);
        assert!((res.p_value - 0.0679).abs() < 1e-3);
    }

    #[test]
    fn test_chi_square_degenerate_table() {
        let res = chi_square_test(&[5.0], &[5.0]);
        assert!(res.p_value.is_nan());
    }

    #[test]
    fn test_gamma_q() {
        // scipy.special.gammaincc
        assert!((gamma_q(0.5, 2.25) - 0.033895).abs() < 1e-5);
        assert!((gamma_q(2.5, 1.75) - 0.623326).abs() < 1e-5);
        assert_eq!(gamma_q(1.0, 0.0), 1.0);
    }

    #[test]
    fn test_histogram() {
        let values: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let hist = histogram(&values, 5);
        assert_eq!(hist.counts, vec![2, 2, 2, 2, 2]);
        assert_eq!(hist.edges.len(), 6);
        assert_eq!(hist.edges[0], 0.0);
        assert_eq!(hist.edges[5], 9.0);
    }

    #[test]
    fn test_histogram_constant_sample() {
        let hist = histogram(&[3.0, 3.0, 3.0], 10);
        assert_eq!(hist.counts, vec![3]);
        assert_eq!(hist.edges, vec![3.0, 3.0]);
    }

    #[test]
    fn test_value_counts_keeps_first_seen_order() {
        let labels: Vec<String> = ["b", "a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let counts = value_counts(&labels);
        assert_eq!(counts.len(), 3);
        assert_eq!(counts[0], LabelCount { label: "b".to_string(), count: 2 });
        assert_eq!(counts[1], LabelCount { label: "a".to_string(), count: 1 });
        assert_eq!(counts[2], LabelCount { label: "c".to_string(), count: 1 });
    }

    #[test]
    fn test_moments() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        assert!((std_dev(&values) - 2.13809).abs() < 1e-5);
        assert!(mean(&[]).is_nan());
        assert!(std_dev(&[1.0]).is_nan());
    }

    #[test]
    fn test_quantile() {
        let values = vec![4.0, 1.0, 3.0, 2.0];
        assert_eq!(quantile(&values, 0.0), 1.0);
        assert_eq!(quantile(&values, 0.5), 2.5);
        assert_eq!(quantile(&values, 0.25), 1.75);
        assert_eq!(quantile(&values, 1.0), 4.0);
    }

    #[test]
    fn test_normal_ppf() {
        assert_eq!(normal_ppf(0.5), 0.0);
        assert!((normal_ppf(0.975) - 1.959964).abs() < 1e-6);
        assert!((normal_ppf(0.025) + 1.959964).abs() < 1e-6);
        assert!((normal_ppf(0.01) + 2.326348).abs() < 1e-6);
        assert!(normal_ppf(0.0).is_infinite());
    }

    #[test]
    fn test_linear_fit() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let y = vec![3.0, 5.0, 7.0, 9.0];
        let (slope, intercept, r) = linear_fit(&x, &y);
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((intercept - 1.0).abs() < 1e-12);
        assert!((r - 1.0).abs() < 1e-12);
    }
}
