//! Errors
//!
//! Custom error types used throughout the `driftlens` crate.
use thiserror::Error;

/// Errors that can occur while building drift and performance reports.
#[derive(Debug, Error)]
pub enum DriftLensError {
    /// Column is not present in the dataset.
    #[error("Column '{0}' was not found in the dataset.")]
    ColumnNotFound(String),
    /// Column payload differs from what the analysis needs.
    #[error("Column '{0}' is {2}, but a {1} column is required.")]
    ColumnTypeMismatch(String, String, String),
    /// Column name is already taken in the frame.
    #[error("A column named '{0}' already exists in the dataset.")]
    DuplicateColumn(String),
    /// Column length differs from the frame row count.
    #[error("Column '{0}' has {2} values, but the dataset has {1} rows.")]
    LengthMismatch(String, usize, usize),
    /// Dataset has no rows.
    #[error("The {0} dataset has no rows.")]
    EmptyDataset(String),
    /// Comparison analysis received only one dataset.
    #[error("The {0} analysis requires a current dataset in addition to the reference dataset.")]
    CurrentDatasetRequired(String),
    /// A required column role is unmapped or absent from the data.
    #[error("No usable {0} column for the {1} analysis.")]
    MissingRole(String, String),
    /// Observed label has no matching probability column.
    #[error("Label '{0}' observed in {1} has no matching probability column.")]
    UnknownLabel(String, String),
    /// A string failed to parse into one of an enum's options.
    #[error("Unable to parse the string '{0}' into a {1}, available options are: {2}")]
    ParseString(String, String, String),
    /// Output requested before the report was calculated.
    #[error("No report available, call calculate first.")]
    NotCalculated,
    /// Unable to write report to file.
    #[error("Unable to write report to file: {0}")]
    UnableToWrite(String),
    /// Unable to read report from file.
    #[error("Unable to read report from a file {0}")]
    UnableToRead(String),
}
