//! Report IO
//!
//! Serialization of calculated report payloads. Both the dashboard and
//! the profile render into plain serde structs, so saving and loading
//! reduce to json round trips.
use crate::errors::DriftLensError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// IO
pub trait ReportIO: Serialize + DeserializeOwned + Sized {
    /// Save a report as a json object to a file.
    ///
    /// * `path` - Path to save report.
    fn save_report<P: AsRef<Path>>(&self, path: P) -> Result<(), DriftLensError> {
        fs::write(path, self.json_dump()?).map_err(|e| DriftLensError::UnableToWrite(e.to_string()))
    }

    /// Dump a report as a json object
    fn json_dump(&self) -> Result<String, DriftLensError> {
        serde_json::to_string(self).map_err(|e| DriftLensError::UnableToWrite(e.to_string()))
    }

    /// Load a report from Json string
    ///
    /// * `json_str` - String object, which can be serialized to json.
    fn from_json(json_str: &str) -> Result<Self, DriftLensError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| DriftLensError::UnableToRead(e.to_string()))
    }

    /// Load a report from a path to a json report object.
    ///
    /// * `path` - Path to load report from.
    fn load_report<P: AsRef<Path>>(path: P) -> Result<Self, DriftLensError> {
        let json_str = fs::read_to_string(path).map_err(|e| DriftLensError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }
}
