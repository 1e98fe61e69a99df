//! Column Mapping
//!
//! Declares which dataset columns play which semantic role and resolves
//! that declaration against the actual reference and current data.
use crate::data::{Column, DataFrame};
use crate::errors::DriftLensError;
use hashbrown::HashSet;
use log::warn;
use serde::{Deserialize, Serialize};

/// Location of model predictions inside a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionColumn {
    /// A single column holding predicted values or labels.
    Single(String),
    /// One probability column per class. The column name is the class
    /// label it scores.
    Probabilities(Vec<String>),
}

/// Maps dataset columns to the roles the analyses understand.
///
/// The default mapping mirrors the usual layout of a model log: a
/// `target` column, a `prediction` column and a `datetime` column, with
/// every remaining column treated as a feature. Roles that point at
/// columns absent from the data are quietly dropped during resolution,
/// so the default mapping also works for plain drift monitoring where
/// no model output is logged at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Name of the ground truth column.
    pub target: Option<String>,
    /// Where to find model predictions.
    pub prediction: Option<PredictionColumn>,
    /// Name of the observation timestamp column.
    pub datetime: Option<String>,
    /// Name of an identifier column, excluded from the feature set.
    pub id: Option<String>,
    /// Explicit numerical feature list. `None` infers every numeric
    /// column that plays no other role.
    pub numerical_features: Option<Vec<String>>,
    /// Explicit categorical feature list. `None` infers every
    /// categorical column that plays no other role.
    pub categorical_features: Option<Vec<String>>,
    /// Display names of the target classes, in class order.
    pub target_names: Option<Vec<String>>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        ColumnMapping {
            target: Some("target".to_string()),
            prediction: Some(PredictionColumn::Single("prediction".to_string())),
            datetime: Some("datetime".to_string()),
            id: None,
            numerical_features: None,
            categorical_features: None,
            target_names: None,
        }
    }
}

impl ColumnMapping {
    /// Mapping with every role unset. Useful as a base when only a few
    /// roles apply.
    pub fn empty() -> Self {
        ColumnMapping {
            target: None,
            prediction: None,
            datetime: None,
            id: None,
            numerical_features: None,
            categorical_features: None,
            target_names: None,
        }
    }
}

/// A column mapping bound against an actual pair of datasets.
///
/// Single column roles survive resolution only when the named column is
/// present in the reference data and, when a current dataset is given,
/// in the current data as well. Feature lists are validated, inferred
/// lists keep the column insertion order of the reference data.
#[derive(Debug, Clone)]
pub struct ResolvedColumns {
    pub target: Option<String>,
    pub prediction: Option<PredictionColumn>,
    pub datetime: Option<String>,
    pub id: Option<String>,
    pub num_features: Vec<String>,
    pub cat_features: Vec<String>,
    pub target_names: Option<Vec<String>>,
}

impl ResolvedColumns {
    /// Bind `mapping` against the given datasets.
    ///
    /// * `reference` - Baseline dataset, always required.
    /// * `current` - Production dataset, when the caller has one.
    /// * `mapping` - Role declaration to resolve.
    pub fn resolve(
        reference: &DataFrame,
        current: Option<&DataFrame>,
        mapping: &ColumnMapping,
    ) -> Result<ResolvedColumns, DriftLensError> {
        let in_both =
            |name: &str| reference.contains(name) && current.map_or(true, |c| c.contains(name));

        // Single column roles are dropped with a warning when the data
        // does not carry them.
        let resolve_role = |name: &Option<String>, role: &str| -> Option<String> {
            match name {
                Some(name) if in_both(name) => Some(name.clone()),
                Some(name) => {
                    warn!(
                        "Mapped {0} column '{1}' is not present in the data, the role is dropped.",
                        role, name
                    );
                    None
                }
                None => None,
            }
        };

        let target = resolve_role(&mapping.target, "target");

        let prediction = match &mapping.prediction {
            Some(PredictionColumn::Single(name)) if in_both(name) => {
                Some(PredictionColumn::Single(name.clone()))
            }
            Some(PredictionColumn::Single(name)) => {
                warn!("Mapped prediction column '{0}' is not present in the data, the role is dropped.", name);
                None
            }
            Some(PredictionColumn::Probabilities(names)) => {
                // Probability columns are always an explicit mapping, a
                // missing one is a hard error.
                for name in names {
                    if !in_both(name) {
                        return Err(DriftLensError::ColumnNotFound(name.clone()));
                    }
                    reference.numeric(name)?;
                    if let Some(cur) = current {
                        cur.numeric(name)?;
                    }
                }
                Some(PredictionColumn::Probabilities(names.clone()))
            }
            None => None,
        };

        let datetime = resolve_role(&mapping.datetime, "datetime");
        let id = resolve_role(&mapping.id, "id");

        // Roles are excluded from feature inference even when the data
        // does not carry the mapped column.
        let mut role_names: HashSet<&str> = HashSet::new();
        if let Some(name) = &mapping.target {
            role_names.insert(name.as_str());
        }
        if let Some(name) = &mapping.datetime {
            role_names.insert(name.as_str());
        }
        if let Some(name) = &mapping.id {
            role_names.insert(name.as_str());
        }
        match &mapping.prediction {
            Some(PredictionColumn::Single(name)) => {
                role_names.insert(name.as_str());
            }
            Some(PredictionColumn::Probabilities(names)) => {
                role_names.extend(names.iter().map(|n| n.as_str()));
            }
            None => {}
        }

        let num_features = match &mapping.numerical_features {
            Some(names) => {
                for name in names {
                    reference.numeric(name)?;
                    if let Some(cur) = current {
                        cur.numeric(name)?;
                    }
                }
                names.clone()
            }
            None => infer_features(reference, current, &role_names, true),
        };

        let cat_features = match &mapping.categorical_features {
            Some(names) => {
                for name in names {
                    if !reference.contains(name) {
                        return Err(DriftLensError::ColumnNotFound(name.clone()));
                    }
                    if let Some(cur) = current {
                        if !cur.contains(name) {
                            return Err(DriftLensError::ColumnNotFound(name.clone()));
                        }
                    }
                }
                names.clone()
            }
            None => infer_features(reference, current, &role_names, false),
        };

        Ok(ResolvedColumns {
            target,
            prediction,
            datetime,
            id,
            num_features,
            cat_features,
            target_names: mapping.target_names.clone(),
        })
    }

    /// Name of the single prediction column, when predictions are not
    /// spread over probability columns.
    pub fn prediction_name(&self) -> Option<&str> {
        match &self.prediction {
            Some(PredictionColumn::Single(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Probability column names, when predictions are class scores.
    pub fn probability_names(&self) -> Option<&[String]> {
        match &self.prediction {
            Some(PredictionColumn::Probabilities(names)) => Some(names.as_slice()),
            _ => None,
        }
    }
}

fn infer_features(
    reference: &DataFrame,
    current: Option<&DataFrame>,
    role_names: &HashSet<&str>,
    numeric: bool,
) -> Vec<String> {
    let candidates = if numeric {
        reference.numeric_column_names()
    } else {
        reference.categorical_column_names()
    };
    let mut features = Vec::new();
    for name in candidates {
        if role_names.contains(name) {
            continue;
        }
        if let Some(cur) = current {
            if !matches!(
                (reference.column(name), cur.column(name)),
                (Some(Column::Numeric(_)), Some(Column::Numeric(_)))
                    | (Some(Column::Categorical(_)), Some(Column::Categorical(_)))
            ) {
                warn!("Column '{0}' is not usable in both datasets and is skipped as a feature.", name);
                continue;
            }
        }
        features.push(name.to_string());
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_log() -> DataFrame {
        let mut frame = DataFrame::new();
        frame.push_numeric("f1", vec![1.0, 2.0, 3.0]).unwrap();
        frame.push_numeric("f2", vec![4.0, 5.0, 6.0]).unwrap();
        frame
            .push_categorical(
                "segment",
                vec!["a".to_string(), "b".to_string(), "a".to_string()],
            )
            .unwrap();
        frame.push_numeric("target", vec![0.0, 1.0, 0.0]).unwrap();
        frame.push_numeric("prediction", vec![1.0, 1.0, 0.0]).unwrap();
        frame
    }

    #[test]
    fn test_default_resolution() {
        let frame = model_log();
        let resolved =
            ResolvedColumns::resolve(&frame, Some(&frame), &ColumnMapping::default()).unwrap();
        assert_eq!(resolved.target.as_deref(), Some("target"));
        assert_eq!(resolved.prediction_name(), Some("prediction"));
        assert_eq!(resolved.datetime, None);
        assert_eq!(resolved.num_features, vec!["f1", "f2"]);
        assert_eq!(resolved.cat_features, vec!["segment"]);
    }

    #[test]
    fn test_absent_roles_are_dropped() {
        let frame = model_log();
        let mapping = ColumnMapping {
            target: Some("label".to_string()),
            prediction: Some(PredictionColumn::Single("score".to_string())),
            ..ColumnMapping::default()
        };
        let resolved = ResolvedColumns::resolve(&frame, None, &mapping).unwrap();
        assert_eq!(resolved.target, None);
        assert_eq!(resolved.prediction, None);
        // The mapped names still do not leak into the feature set.
        assert_eq!(resolved.num_features, vec!["f1", "f2", "target", "prediction"]);
    }

    #[test]
    fn test_missing_probability_column_is_an_error() {
        let frame = model_log();
        let mapping = ColumnMapping {
            prediction: Some(PredictionColumn::Probabilities(vec![
                "yes".to_string(),
                "no".to_string(),
            ])),
            ..ColumnMapping::default()
        };
        let res = ResolvedColumns::resolve(&frame, None, &mapping);
        assert!(matches!(res, Err(DriftLensError::ColumnNotFound(_))));
    }

    #[test]
    fn test_explicit_feature_lists_are_validated() {
        let frame = model_log();
        let mapping = ColumnMapping {
            numerical_features: Some(vec!["segment".to_string()]),
            ..ColumnMapping::default()
        };
        let res = ResolvedColumns::resolve(&frame, None, &mapping);
        assert!(matches!(
            res,
            Err(DriftLensError::ColumnTypeMismatch(_, _, _))
        ));

        let mapping = ColumnMapping {
            categorical_features: Some(vec!["region".to_string()]),
            ..ColumnMapping::default()
        };
        let res = ResolvedColumns::resolve(&frame, None, &mapping);
        assert!(matches!(res, Err(DriftLensError::ColumnNotFound(_))));
    }

    #[test]
    fn test_explicit_lists_override_inference() {
        let frame = model_log();
        let mapping = ColumnMapping {
            numerical_features: Some(vec!["f2".to_string()]),
            categorical_features: Some(vec![]),
            ..ColumnMapping::default()
        };
        let resolved = ResolvedColumns::resolve(&frame, Some(&frame), &mapping).unwrap();
        assert_eq!(resolved.num_features, vec!["f2"]);
        assert!(resolved.cat_features.is_empty());
    }
}
