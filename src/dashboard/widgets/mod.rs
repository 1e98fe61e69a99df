//! Widgets
//!
//! Builders that turn analyzer results into the renderable blocks of a
//! dashboard. Every widget carries a title, a renderer hint, a grid
//! size and a json params payload the renderer feeds from.
pub mod classification;
pub mod data_drift;
pub mod prob_classification;
pub mod regression;
pub mod target_drift;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Renderer hint of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetType {
    Counter,
    Table,
    BigTable,
    BigGraph,
}

/// A single renderable block of a dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetInfo {
    pub title: String,
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    /// Grid width, 2 spans the full row, 1 half of it.
    pub size: u8,
    pub params: Value,
}

impl WidgetInfo {
    pub fn new(title: &str, widget_type: WidgetType, size: u8, params: Value) -> Self {
        WidgetInfo {
            title: title.to_string(),
            widget_type,
            size,
            params,
        }
    }
}

// Widget payloads are plain serializable structs. Serializing them
// into a json value cannot fail, non finite floats become null.
pub(crate) fn value_of<T: Serialize>(payload: &T) -> Value {
    serde_json::to_value(payload).unwrap_or(Value::Null)
}

/// Title of a per partition widget, like `Reference: Error Distribution`.
pub(crate) fn partition_title(partition: &str, rest: &str) -> String {
    let partition = match partition {
        "reference" => "Reference",
        "current" => "Current",
        other => other,
    };
    format!("{}: {}", partition, rest)
}

/// Per partition widgets sit side by side when both partitions are
/// shown and span the full row otherwise.
pub(crate) fn pair_size(has_current: bool) -> u8 {
    if has_current {
        1
    } else {
        2
    }
}

/// Map a raw class label to its display name when the labels are
/// integer coded and display names are available.
pub(crate) fn display_label(label: &str, target_names: Option<&Vec<String>>) -> String {
    if let (Some(names), Ok(index)) = (target_names, label.parse::<usize>()) {
        if let Some(name) = names.get(index) {
            return name.clone();
        }
    }
    label.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_type_names() {
        assert_eq!(
            serde_json::to_string(&WidgetType::BigTable).unwrap(),
            "\"big_table\""
        );
        assert_eq!(
            serde_json::to_string(&WidgetType::Counter).unwrap(),
            "\"counter\""
        );
    }

    #[test]
    fn test_widget_serialization_shape() {
        let widget = WidgetInfo::new(
            "Data Drift",
            WidgetType::BigTable,
            2,
            Value::Null,
        );
        let json: Value = serde_json::to_value(&widget).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert!(obj.contains_key("title"));
        assert!(obj.contains_key("type"));
        assert!(obj.contains_key("size"));
        assert!(obj.contains_key("params"));
    }

    #[test]
    fn test_display_label() {
        let names = vec!["setosa".to_string(), "versicolor".to_string()];
        assert_eq!(display_label("0", Some(&names)), "setosa");
        assert_eq!(display_label("5", Some(&names)), "5");
        assert_eq!(display_label("cat", Some(&names)), "cat");
        assert_eq!(display_label("1", None), "1");
    }

    #[test]
    fn test_partition_title() {
        assert_eq!(
            partition_title("reference", "Error Distribution"),
            "Reference: Error Distribution"
        );
        assert_eq!(partition_title("current", "ROC Curve"), "Current: ROC Curve");
    }
}
