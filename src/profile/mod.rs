//! Profile
//!
//! The machine readable report facade. A profile is configured with a
//! list of sections, calculated over a reference dataset and an
//! optional current dataset, and rendered into a json payload keyed by
//! section.
pub mod sections;

pub use sections::Section;

use crate::analyzers::{check_frames, AnalysisContext, DriftOptions};
use crate::data::DataFrame;
use crate::errors::DriftLensError;
use crate::mapping::{ColumnMapping, ResolvedColumns};
use crate::report::ReportIO;
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

/// One calculated section: when it was rendered and its data payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePart {
    pub datetime: String,
    pub data: Value,
}

/// Rendered profile payload: a calculation timestamp plus one part per
/// section, keyed by the section's name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileInfo {
    pub timestamp: String,
    #[serde(flatten)]
    pub parts: BTreeMap<String, ProfilePart>,
}

impl ReportIO for ProfileInfo {}

/// Builds machine readable monitoring reports over tabular datasets.
///
/// ```no_run
/// use driftlens::{DataFrame, Profile, Section};
///
/// # fn run(reference: DataFrame, current: DataFrame) -> Result<(), driftlens::DriftLensError> {
/// let mut profile = Profile::new(vec![Section::DataDrift]);
/// profile.calculate(&reference, Some(&current), None)?;
/// let json = profile.json_dump()?;
/// # Ok(())
/// # }
/// ```
pub struct Profile {
    sections: Vec<Section>,
    options: DriftOptions,
    info: Option<ProfileInfo>,
}

impl Profile {
    /// Profile over the given sections with default calculation options.
    pub fn new(sections: Vec<Section>) -> Self {
        Profile::with_options(sections, DriftOptions::default())
    }

    /// Profile over the given sections with explicit calculation options.
    pub fn with_options(sections: Vec<Section>, options: DriftOptions) -> Self {
        Profile {
            sections,
            options,
            info: None,
        }
    }

    /// Run every section's analysis and render the profile payload.
    ///
    /// * `reference` - Baseline dataset every analysis compares against.
    /// * `current` - Production dataset. Optional for the performance
    ///   sections, required by the drift sections.
    /// * `mapping` - Column role declaration, `None` uses the default
    ///   mapping.
    pub fn calculate(
        &mut self,
        reference: &DataFrame,
        current: Option<&DataFrame>,
        mapping: Option<&ColumnMapping>,
    ) -> Result<(), DriftLensError> {
        let timer = Instant::now();
        check_frames(reference, current)?;
        let mapping = mapping.cloned().unwrap_or_default();
        let columns = ResolvedColumns::resolve(reference, current, &mapping)?;
        let ctx = AnalysisContext {
            reference,
            current,
            columns: &columns,
            options: &self.options,
        };
        let mut parts = BTreeMap::new();
        for section in &self.sections {
            let data = section.build_data(&ctx)?;
            parts.insert(
                section.part_key().to_string(),
                ProfilePart {
                    datetime: Utc::now().to_rfc3339(),
                    data,
                },
            );
        }
        info!(
            "Calculated a profile with {} sections in {:.3} seconds.",
            parts.len(),
            timer.elapsed().as_secs_f64()
        );
        self.info = Some(ProfileInfo {
            timestamp: Utc::now().to_rfc3339(),
            parts,
        });
        Ok(())
    }

    /// The rendered payload of the last `calculate` call.
    pub fn info(&self) -> Result<&ProfileInfo, DriftLensError> {
        self.info.as_ref().ok_or(DriftLensError::NotCalculated)
    }

    /// Dump the rendered profile as a json object.
    pub fn json_dump(&self) -> Result<String, DriftLensError> {
        self.info()?.json_dump()
    }

    /// Save the rendered profile as a json file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DriftLensError> {
        self.info()?.save_report(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::{iris_target_names, load_iris, random_probabilities};
    use crate::mapping::PredictionColumn;

    fn iris_split() -> (DataFrame, DataFrame) {
        let iris = load_iris().unwrap();
        (iris.slice_rows(0..100), iris.slice_rows(100..150))
    }

    fn iris_with_prediction() -> (DataFrame, DataFrame) {
        let mut iris = load_iris().unwrap();
        let mut prediction = iris.numeric("target").unwrap().to_vec();
        prediction.reverse();
        iris.push_numeric("prediction", prediction).unwrap();
        (iris.slice_rows(0..100), iris.slice_rows(100..150))
    }

    fn iris_with_probabilities() -> (DataFrame, DataFrame, ColumnMapping) {
        let iris = load_iris().unwrap();
        let names = iris_target_names();
        let mut frame = DataFrame::new();
        for feature in ["sepal_length", "sepal_width", "petal_length", "petal_width"] {
            frame
                .push_numeric(feature, iris.numeric(feature).unwrap().to_vec())
                .unwrap();
        }
        let labels: Vec<String> = iris
            .numeric("target")
            .unwrap()
            .iter()
            .map(|t| names[*t as usize].clone())
            .collect();
        frame.push_categorical("target", labels).unwrap();
        for (c, column) in random_probabilities(frame.n_rows(), names.len(), 42)
            .into_iter()
            .enumerate()
        {
            frame.push_numeric(&names[c], column).unwrap();
        }
        let mapping = ColumnMapping {
            prediction: Some(PredictionColumn::Probabilities(names)),
            ..ColumnMapping::default()
        };
        (frame.slice_rows(0..100), frame.slice_rows(100..150), mapping)
    }

    fn rendered(profile: &Profile) -> serde_json::Value {
        serde_json::from_str(&profile.json_dump().unwrap()).unwrap()
    }

    #[test]
    fn test_data_drift_profile_shape() {
        let (reference, current) = iris_split();
        let mut profile = Profile::new(vec![Section::DataDrift]);
        profile.calculate(&reference, Some(&current), None).unwrap();
        let json = rendered(&profile);
        assert_eq!(json.as_object().unwrap().len(), 2);
        let data = json["data_drift"]["data"].as_object().unwrap();
        assert_eq!(data.len(), 6);
        assert!(!data["metrics"].as_object().unwrap().is_empty());
        assert_eq!(data["options"]["confidence"], 0.95);
    }

    #[test]
    fn test_two_section_profile_shape() {
        let (reference, current) = iris_split();
        let mut profile = Profile::new(vec![Section::DataDrift, Section::CatTargetDrift]);
        profile.calculate(&reference, Some(&current), None).unwrap();
        let json = rendered(&profile);
        assert_eq!(json.as_object().unwrap().len(), 3);
        let data = json["cat_target_drift"]["data"].as_object().unwrap();
        assert_eq!(data.len(), 5);
        assert!(data.get("options").is_none());
        assert!(data["metrics"]["target_drift"]["drift_score"].is_number());
    }

    #[test]
    fn test_regression_profile_two_datasets() {
        let (reference, current) = iris_with_prediction();
        let mut profile = Profile::new(vec![Section::RegressionPerformance]);
        profile.calculate(&reference, Some(&current), None).unwrap();
        let json = rendered(&profile);
        assert_eq!(json.as_object().unwrap().len(), 2);
        let data = json["regression_performance"]["data"].as_object().unwrap();
        assert_eq!(data.len(), 5);
        let metrics = data["metrics"].as_object().unwrap();
        assert_eq!(metrics.len(), 2);
        assert!(metrics.contains_key("reference"));
        assert!(metrics.contains_key("current"));
    }

    #[test]
    fn test_regression_profile_single_dataset() {
        let (reference, _) = iris_with_prediction();
        let mut profile = Profile::new(vec![Section::RegressionPerformance]);
        profile.calculate(&reference, None, None).unwrap();
        let json = rendered(&profile);
        let metrics = json["regression_performance"]["data"]["metrics"]
            .as_object()
            .unwrap();
        assert_eq!(metrics.len(), 1);
        assert!(metrics.contains_key("reference"));
    }

    #[test]
    fn test_classification_profile_shape() {
        let (reference, current) = iris_with_prediction();
        let mut profile = Profile::new(vec![Section::ClassificationPerformance]);
        profile.calculate(&reference, Some(&current), None).unwrap();
        let json = rendered(&profile);
        let data = json["classification_performance"]["data"].as_object().unwrap();
        assert_eq!(data.len(), 5);
        assert!(data["metrics"]["reference"]["accuracy"].is_number());
    }

    #[test]
    fn test_prob_classification_profile_two_datasets() {
        let (reference, current, mapping) = iris_with_probabilities();
        let mut profile = Profile::new(vec![Section::ProbClassificationPerformance]);
        profile
            .calculate(&reference, Some(&current), Some(&mapping))
            .unwrap();
        let json = rendered(&profile);
        let metrics = json["probabilistic_classification_performance"]["data"]["metrics"]
            .as_object()
            .unwrap();
        assert_eq!(metrics.len(), 2);
        assert!(metrics.contains_key("reference"));
        assert!(metrics.contains_key("current"));
    }

    #[test]
    fn test_prob_classification_profile_single_dataset() {
        let (reference, _, mapping) = iris_with_probabilities();
        let mut profile = Profile::new(vec![Section::ProbClassificationPerformance]);
        profile.calculate(&reference, None, Some(&mapping)).unwrap();
        let json = rendered(&profile);
        let metrics = json["probabilistic_classification_performance"]["data"]["metrics"]
            .as_object()
            .unwrap();
        assert_eq!(metrics.len(), 1);
        assert!(metrics.contains_key("reference"));
    }

    #[test]
    fn test_timestamps_parse() {
        let (reference, current) = iris_split();
        let mut profile = Profile::new(vec![Section::DataDrift]);
        profile.calculate(&reference, Some(&current), None).unwrap();
        let info = profile.info().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&info.timestamp).is_ok());
        let part = &info.parts["data_drift"];
        assert!(chrono::DateTime::parse_from_rfc3339(&part.datetime).is_ok());
    }

    #[test]
    fn test_info_before_calculate() {
        let profile = Profile::new(vec![Section::DataDrift]);
        assert!(matches!(profile.info(), Err(DriftLensError::NotCalculated)));
    }

    #[test]
    fn test_save_and_load_profile() {
        let (reference, current) = iris_split();
        let mut profile = Profile::new(vec![Section::DataDrift]);
        profile.calculate(&reference, Some(&current), None).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        profile.save(&path).unwrap();
        let loaded = ProfileInfo::load_report(&path).unwrap();
        assert_eq!(loaded.timestamp, profile.info().unwrap().timestamp);
        assert!(loaded.parts.contains_key("data_drift"));
    }
}
