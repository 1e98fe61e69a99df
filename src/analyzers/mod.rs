//! Analyzers
//!
//! The statistical analyses behind dashboard tabs and profile sections.
//! Each analyzer consumes the resolved column roles plus the raw data
//! and produces a serializable result struct.
pub mod classification;
pub mod data_drift;
pub mod prob_classification;
pub mod regression;
pub mod target_drift;

use crate::data::DataFrame;
use crate::errors::DriftLensError;
use crate::mapping::{PredictionColumn, ResolvedColumns};
use serde::{Deserialize, Serialize};

/// Options controlling drift detection and distribution summaries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DriftOptions {
    /// Confidence level of the per feature two sample tests. A feature
    /// drifts when its p-value falls below `1 - confidence`.
    pub confidence: f64,
    /// Share of drifted features at which the whole dataset counts as
    /// drifted.
    pub drift_share: f64,
    /// Number of bins in distribution summaries.
    pub n_bins: usize,
}

impl Default for DriftOptions {
    fn default() -> Self {
        DriftOptions {
            confidence: 0.95,
            drift_share: 0.5,
            n_bins: 10,
        }
    }
}

impl DriftOptions {
    /// The p-value threshold implied by the confidence level.
    pub fn significance(&self) -> f64 {
        1.0 - self.confidence
    }
}

/// Everything an analysis may draw from: both datasets, the resolved
/// column roles and the calculation options.
#[derive(Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub reference: &'a DataFrame,
    pub current: Option<&'a DataFrame>,
    pub columns: &'a ResolvedColumns,
    pub options: &'a DriftOptions,
}

/// Echo of the utility column assignment, embedded in every report
/// payload so a reader can tell which columns the analysis used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilityColumns {
    pub date: Option<String>,
    pub id: Option<String>,
    pub target: Option<String>,
    pub prediction: Option<PredictionColumn>,
}

impl UtilityColumns {
    pub fn from_resolved(columns: &ResolvedColumns) -> Self {
        UtilityColumns {
            date: columns.datetime.clone(),
            id: columns.id.clone(),
            target: columns.target.clone(),
            prediction: columns.prediction.clone(),
        }
    }
}

/// Per partition metrics of a performance analysis.
///
/// Serializes as a map with a `reference` entry and, only when the
/// analysis also covered a current dataset, a `current` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerfMetrics<M> {
    pub reference: M,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<M>,
}

impl<M> PerfMetrics<M> {
    pub fn new(reference: M, current: Option<M>) -> Self {
        PerfMetrics { reference, current }
    }

    /// Partitions in report order, reference first.
    pub fn partitions(&self) -> Vec<(&'static str, &M)> {
        let mut parts = vec![("reference", &self.reference)];
        if let Some(current) = &self.current {
            parts.push(("current", current));
        }
        parts
    }
}

/// Reject empty datasets before any analysis runs.
pub(crate) fn check_frames(
    reference: &DataFrame,
    current: Option<&DataFrame>,
) -> Result<(), DriftLensError> {
    if reference.is_empty() {
        return Err(DriftLensError::EmptyDataset("reference".to_string()));
    }
    if let Some(current) = current {
        if current.is_empty() {
            return Err(DriftLensError::EmptyDataset("current".to_string()));
        }
    }
    Ok(())
}
