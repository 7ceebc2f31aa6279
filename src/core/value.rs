//! Identifiers and the tagged value model that flows between node ports.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::error::NodeError;

/// Unique identifier of one node instance in a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Generates a fresh, never-empty id.
    pub fn generate() -> Self {
        NodeId(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of one port, unique within a node's input set and within its output set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortId(String);

impl PortId {
    pub fn new(id: impl Into<String>) -> Self {
        PortId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PortId {
    fn from(s: &str) -> Self {
        PortId(s.to_string())
    }
}

impl From<String> for PortId {
    fn from(s: String) -> Self {
        PortId(s)
    }
}

impl From<&PortId> for PortId {
    fn from(p: &PortId) -> Self {
        p.clone()
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed set of value kinds a port can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "string[]")]
    StringArray,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "object")]
    Object,
    #[serde(rename = "object[]")]
    ObjectArray,
    #[serde(rename = "any")]
    Any,
    /// Marks a branch that was not taken; carries no payload.
    #[serde(rename = "control-flow-excluded")]
    ControlFlowExcluded,
}

impl DataType {
    /// Two ports may be wired together when their types agree or either is `any`.
    pub fn is_connectable_to(self, other: DataType) -> bool {
        self == other || self == DataType::Any || other == DataType::Any
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::StringArray => "string[]",
            DataType::Number => "number",
            DataType::Boolean => "boolean",
            DataType::Object => "object",
            DataType::ObjectArray => "object[]",
            DataType::Any => "any",
            DataType::ControlFlowExcluded => "control-flow-excluded",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value tagged with its [`DataType`].
///
/// The tag is the enum discriminant, so a constructed value can never
/// disagree with its payload. Untyped JSON enters through
/// [`DataValue::from_json`], which rejects mismatches instead of coercing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum DataValue {
    #[serde(rename = "string")]
    String(String),
    #[serde(rename = "string[]")]
    StringArray(Vec<String>),
    #[serde(rename = "number")]
    Number(f64),
    #[serde(rename = "boolean")]
    Boolean(bool),
    #[serde(rename = "object")]
    Object(Map<String, Value>),
    #[serde(rename = "object[]")]
    ObjectArray(Vec<Map<String, Value>>),
    #[serde(rename = "any")]
    Any(Value),
    #[serde(rename = "control-flow-excluded")]
    ControlFlowExcluded,
}

impl DataValue {
    /// The tag of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            DataValue::String(_) => DataType::String,
            DataValue::StringArray(_) => DataType::StringArray,
            DataValue::Number(_) => DataType::Number,
            DataValue::Boolean(_) => DataType::Boolean,
            DataValue::Object(_) => DataType::Object,
            DataValue::ObjectArray(_) => DataType::ObjectArray,
            DataValue::Any(_) => DataType::Any,
            DataValue::ControlFlowExcluded => DataType::ControlFlowExcluded,
        }
    }

    /// Builds a value of `data_type` from an untyped payload.
    ///
    /// Fails with a validation error when the payload's shape does not match
    /// the requested type.
    pub fn from_json(data_type: DataType, value: Value) -> Result<Self, NodeError> {
        let mismatch = |value: &Value| {
            NodeError::validation(format!(
                "value {} does not match declared type '{}'",
                value, data_type
            ))
        };

        match (data_type, value) {
            (DataType::String, Value::String(s)) => Ok(DataValue::String(s)),
            (DataType::Number, Value::Number(n)) => n
                .as_f64()
                .map(DataValue::Number)
                .ok_or_else(|| mismatch(&Value::Number(n.clone()))),
            (DataType::Boolean, Value::Bool(b)) => Ok(DataValue::Boolean(b)),
            (DataType::Object, Value::Object(map)) => Ok(DataValue::Object(map)),
            (DataType::StringArray, Value::Array(items)) => {
                if items.iter().all(Value::is_string) {
                    Ok(DataValue::StringArray(
                        items
                            .into_iter()
                            .filter_map(|v| match v {
                                Value::String(s) => Some(s),
                                _ => None,
                            })
                            .collect(),
                    ))
                } else {
                    Err(mismatch(&Value::Array(items)))
                }
            }
            (DataType::ObjectArray, Value::Array(items)) => {
                if items.iter().all(Value::is_object) {
                    Ok(DataValue::ObjectArray(
                        items
                            .into_iter()
                            .filter_map(|v| match v {
                                Value::Object(map) => Some(map),
                                _ => None,
                            })
                            .collect(),
                    ))
                } else {
                    Err(mismatch(&Value::Array(items)))
                }
            }
            (DataType::Any, value) => Ok(DataValue::Any(value)),
            (DataType::ControlFlowExcluded, Value::Null) => Ok(DataValue::ControlFlowExcluded),
            (_, value) => Err(mismatch(&value)),
        }
    }

    /// Whether the value counts as "not provided" for a required port.
    pub fn is_empty(&self) -> bool {
        match self {
            DataValue::String(s) => s.trim().is_empty(),
            DataValue::StringArray(items) => items.is_empty(),
            DataValue::ObjectArray(items) => items.is_empty(),
            DataValue::Any(v) => v.is_null(),
            DataValue::ControlFlowExcluded => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_string_array(&self) -> Option<&[String]> {
        match self {
            DataValue::StringArray(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            DataValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            DataValue::Object(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::String(s.to_string())
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::String(s)
    }
}

impl From<Vec<String>> for DataValue {
    fn from(items: Vec<String>) -> Self {
        DataValue::StringArray(items)
    }
}

impl From<f64> for DataValue {
    fn from(n: f64) -> Self {
        DataValue::Number(n)
    }
}

impl From<bool> for DataValue {
    fn from(b: bool) -> Self {
        DataValue::Boolean(b)
    }
}

/// Resolved upstream values handed to a node, keyed by input port.
pub type Inputs = HashMap<PortId, DataValue>;

/// Values produced by a node, keyed by output port.
pub type Outputs = HashMap<PortId, DataValue>;
