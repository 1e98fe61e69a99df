//! DataFrame
//!
//! A small owned columnar table used as the exchange format of the crate.
//! Callers load their reference and production data into a [`DataFrame`]
//! and hand both to a dashboard or profile.
use crate::errors::DriftLensError;
use crate::utils::fmt_label;
use hashbrown::HashMap;
use std::ops::Range;

/// A single named series of a [`DataFrame`].
#[derive(Debug, Clone)]
pub enum Column {
    /// Floating point values. `NaN` marks a missing entry.
    Numeric(Vec<f64>),
    /// String labels.
    Categorical(Vec<String>),
}

impl Column {
    /// Number of values in the column.
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(values) => values.len(),
            Column::Categorical(values) => values.len(),
        }
    }

    /// Whether the column holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the payload kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Column::Numeric(_) => "numeric",
            Column::Categorical(_) => "categorical",
        }
    }

    fn slice(&self, range: Range<usize>) -> Column {
        match self {
            Column::Numeric(values) => Column::Numeric(values[range].to_vec()),
            Column::Categorical(values) => Column::Categorical(values[range].to_vec()),
        }
    }
}

/// Owned columnar table: rows are observations, columns are named series.
///
/// Columns keep their insertion order, which drives feature inference and
/// the ordering of report content. Column names are unique.
#[derive(Debug, Clone, Default)]
pub struct DataFrame {
    columns: Vec<Column>,
    names: Vec<String>,
    index: HashMap<String, usize>,
    rows: usize,
}

impl DataFrame {
    /// Create an empty table.
    pub fn new() -> Self {
        DataFrame::default()
    }

    /// Number of rows. Zero until the first column is pushed.
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Whether a column with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|i| &self.columns[*i])
    }

    fn check_new_column(&self, name: &str, len: usize) -> Result<(), DriftLensError> {
        if self.index.contains_key(name) {
            return Err(DriftLensError::DuplicateColumn(name.to_string()));
        }
        if !self.columns.is_empty() && len != self.rows {
            return Err(DriftLensError::LengthMismatch(
                name.to_string(),
                self.rows,
                len,
            ));
        }
        Ok(())
    }

    fn push_column(&mut self, name: &str, column: Column) {
        self.rows = column.len();
        self.index.insert(name.to_string(), self.columns.len());
        self.names.push(name.to_string());
        self.columns.push(column);
    }

    /// Append a numeric column.
    ///
    /// * `name` - Name of the new column.
    /// * `values` - Column payload. Must match the row count of any column
    ///   already present.
    pub fn push_numeric(&mut self, name: &str, values: Vec<f64>) -> Result<(), DriftLensError> {
        self.check_new_column(name, values.len())?;
        self.push_column(name, Column::Numeric(values));
        Ok(())
    }

    /// Append a categorical column.
    ///
    /// * `name` - Name of the new column.
    /// * `values` - Column payload. Must match the row count of any column
    ///   already present.
    pub fn push_categorical(
        &mut self,
        name: &str,
        values: Vec<String>,
    ) -> Result<(), DriftLensError> {
        self.check_new_column(name, values.len())?;
        self.push_column(name, Column::Categorical(values));
        Ok(())
    }

    /// Borrow a numeric column by name, failing when the column is missing
    /// or categorical.
    pub fn numeric(&self, name: &str) -> Result<&[f64], DriftLensError> {
        match self.column(name) {
            None => Err(DriftLensError::ColumnNotFound(name.to_string())),
            Some(Column::Numeric(values)) => Ok(values),
            Some(column) => Err(DriftLensError::ColumnTypeMismatch(
                name.to_string(),
                "numeric".to_string(),
                column.kind().to_string(),
            )),
        }
    }

    /// Read a column as string labels. Categorical values are returned as
    /// they are, numeric values are rendered with [`fmt_label`] so integer
    /// coded classes keep their compact form.
    pub fn labels(&self, name: &str) -> Result<Vec<String>, DriftLensError> {
        match self.column(name) {
            None => Err(DriftLensError::ColumnNotFound(name.to_string())),
            Some(Column::Categorical(values)) => Ok(values.clone()),
            Some(Column::Numeric(values)) => Ok(values.iter().map(|v| fmt_label(*v)).collect()),
        }
    }

    /// Copy a contiguous range of rows into a new table.
    ///
    /// Panics when the range reaches past the last row.
    pub fn slice_rows(&self, range: Range<usize>) -> DataFrame {
        let mut out = DataFrame::new();
        out.rows = range.len();
        for (name, column) in self.names.iter().zip(&self.columns) {
            out.index.insert(name.clone(), out.columns.len());
            out.names.push(name.clone());
            out.columns.push(column.slice(range.clone()));
        }
        out
    }

    /// Names of all numeric columns, in insertion order.
    pub fn numeric_column_names(&self) -> Vec<&str> {
        self.names
            .iter()
            .zip(&self.columns)
            .filter(|(_, c)| matches!(c, Column::Numeric(_)))
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Names of all categorical columns, in insertion order.
    pub fn categorical_column_names(&self) -> Vec<&str> {
        self.names
            .iter()
            .zip(&self.columns)
            .filter(|(_, c)| matches!(c, Column::Categorical(_)))
            .map(|(n, _)| n.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> DataFrame {
        let mut frame = DataFrame::new();
        frame
            .push_numeric("age", vec![34.0, 51.0, 27.0, 43.0])
            .unwrap();
        frame
            .push_categorical(
                "city",
                vec!["ankara".to_string(), "izmir".to_string(), "ankara".to_string(), "bursa".to_string()],
            )
            .unwrap();
        frame.push_numeric("target", vec![0.0, 1.0, 0.0, 1.0]).unwrap();
        frame
    }

    #[test]
    fn test_frame_shape() {
        let frame = sample_frame();
        assert_eq!(frame.n_rows(), 4);
        assert_eq!(frame.n_cols(), 3);
        assert!(!frame.is_empty());
        assert_eq!(frame.column_names(), &["age", "city", "target"]);
        assert_eq!(frame.numeric_column_names(), vec!["age", "target"]);
        assert_eq!(frame.categorical_column_names(), vec!["city"]);
    }

    #[test]
    fn test_duplicate_column() {
        let mut frame = sample_frame();
        let res = frame.push_numeric("age", vec![1.0, 2.0, 3.0, 4.0]);
        assert!(matches!(res, Err(DriftLensError::DuplicateColumn(_))));
    }

    #[test]
    fn test_length_mismatch() {
        let mut frame = sample_frame();
        let res = frame.push_numeric("short", vec![1.0, 2.0]);
        assert!(matches!(res, Err(DriftLensError::LengthMismatch(_, 4, 2))));
    }

    #[test]
    fn test_numeric_access() {
        let frame = sample_frame();
        assert_eq!(frame.numeric("age").unwrap(), &[34.0, 51.0, 27.0, 43.0]);
        assert!(matches!(
            frame.numeric("city"),
            Err(DriftLensError::ColumnTypeMismatch(_, _, _))
        ));
        assert!(matches!(
            frame.numeric("missing"),
            Err(DriftLensError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_labels() {
        let frame = sample_frame();
        assert_eq!(frame.labels("target").unwrap(), vec!["0", "1", "0", "1"]);
        assert_eq!(frame.labels("city").unwrap()[0], "ankara");
    }

    #[test]
    fn test_slice_rows() {
        let frame = sample_frame();
        let head = frame.slice_rows(0..2);
        assert_eq!(head.n_rows(), 2);
        assert_eq!(head.numeric("age").unwrap(), &[34.0, 51.0]);
        assert_eq!(head.labels("city").unwrap(), vec!["ankara", "izmir"]);
    }
}
