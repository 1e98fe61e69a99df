//! Datasets
//!
//! Small bundled datasets and generators used by the documentation,
//! the test-suite and the benchmarks.
use crate::data::DataFrame;
use crate::errors::DriftLensError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The classic iris dataset: 150 rows, four numeric features and an
/// integer coded `target` column.
pub fn load_iris() -> Result<DataFrame, DriftLensError> {
    let raw = include_str!("../resources/iris.csv");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(raw.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DriftLensError::UnableToRead(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let mut columns: Vec<Vec<f64>> = headers.iter().map(|_| Vec::new()).collect();
    for record in reader.records() {
        let record = record.map_err(|e| DriftLensError::UnableToRead(e.to_string()))?;
        for (column, field) in columns.iter_mut().zip(record.iter()) {
            let value = field
                .parse::<f64>()
                .map_err(|e| DriftLensError::UnableToRead(e.to_string()))?;
            column.push(value);
        }
    }
    let mut frame = DataFrame::new();
    for (name, column) in headers.iter().zip(columns) {
        frame.push_numeric(name, column)?;
    }
    Ok(frame)
}

/// Class names matching the iris `target` codes.
pub fn iris_target_names() -> Vec<String> {
    vec![
        "setosa".to_string(),
        "versicolor".to_string(),
        "virginica".to_string(),
    ]
}

/// Deterministic per class probability columns, each row summing to one.
///
/// Returns one column per class. Used to build probabilistic
/// classification fixtures without a trained model.
pub fn random_probabilities(n_rows: usize, n_classes: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut columns: Vec<Vec<f64>> = (0..n_classes).map(|_| Vec::with_capacity(n_rows)).collect();
    for _ in 0..n_rows {
        let raw: Vec<f64> = (0..n_classes).map(|_| rng.gen::<f64>()).collect();
        let total: f64 = raw.iter().sum();
        for (column, value) in columns.iter_mut().zip(raw) {
            column.push(value / total);
        }
    }
    columns
}
