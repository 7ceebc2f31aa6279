use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::error::NodeError;
use crate::core::value::NodeId;

/// Opaque, per-type configuration record of a node.
///
/// Only the implementation registered for the node's type interprets it.
pub type ConfigRecord = serde_json::Value;

/// Default width of a freshly created node, in canvas units.
pub const DEFAULT_NODE_WIDTH: f64 = 250.0;

/// Placement of a node on the editor canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualData {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

impl Default for VisualData {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: Some(DEFAULT_NODE_WIDTH),
        }
    }
}

/// The static, serializable record of one node instance in a graph document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    pub title: String,
    pub visual_data: VisualData,
    #[serde(default)]
    pub data: ConfigRecord,
}

impl ChartNode {
    /// Creates a node with a fresh id and default placement.
    pub fn new(node_type: impl Into<String>, title: impl Into<String>, data: ConfigRecord) -> Self {
        Self {
            id: NodeId::generate(),
            node_type: node_type.into(),
            title: title.into(),
            visual_data: VisualData::default(),
            data,
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.visual_data.x = x;
        self.visual_data.y = y;
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.visual_data.width = Some(width);
        self
    }

    /// Parses this node's configuration record into its typed form.
    pub fn parse_data<T: DeserializeOwned>(&self) -> Result<T, NodeError> {
        parse_node_data(&self.data)
    }
}

/// Parses a configuration record, reporting schema mismatches as validation errors.
pub fn parse_node_data<T: DeserializeOwned>(data: &ConfigRecord) -> Result<T, NodeError> {
    let empty = serde_json::Value::Object(Default::default());
    let data = if data.is_null() { &empty } else { data };
    T::deserialize(data)
        .map_err(|e| NodeError::validation(format!("invalid node configuration: {}", e)))
}

/// Display-only metadata shown by the editor; never consulted during execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUIData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_box_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_box_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_menu_title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default)]
        model: Option<String>,
        retries: u32,
    }

    #[test]
    fn test_new_node_defaults() {
        let node = ChartNode::new("sample", "Sample", json!({ "retries": 1 }));
        assert_eq!(node.node_type, "sample");
        assert_eq!(node.visual_data, VisualData::default());
        assert!(!node.id.as_str().is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let node = ChartNode::new("sample", "Sample", json!({})).with_position(10.0, 20.0);
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], json!("sample"));
        assert_eq!(value["visualData"]["x"], json!(10.0));
        assert_eq!(value["visualData"]["width"], json!(250.0));

        let back: ChartNode = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_parse_data() {
        let node = ChartNode::new("sample", "Sample", json!({ "retries": 2 }));
        let parsed: Sample = node.parse_data().unwrap();
        assert_eq!(parsed, Sample { model: None, retries: 2 });

        let err = parse_node_data::<Sample>(&json!({ "retries": "two" })).unwrap_err();
        assert!(matches!(err, NodeError::Validation { port: None, .. }));
    }
}
