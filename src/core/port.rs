use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::NodeError;
use crate::core::value::{DataType, DataValue, Inputs, PortId};

/// What a port accepts: a single type, or a union of types.
///
/// Serialized the way the editor expects it: a bare type name, or an array of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortDataType {
    Single(DataType),
    OneOf(Vec<DataType>),
}

impl PortDataType {
    pub fn accepts(&self, data_type: DataType) -> bool {
        match self {
            PortDataType::Single(DataType::Any) => true,
            PortDataType::Single(t) => *t == data_type,
            PortDataType::OneOf(types) => types
                .iter()
                .any(|t| *t == DataType::Any || *t == data_type),
        }
    }

    /// Whether an output declaring `self` may feed an input declaring `other`.
    pub fn is_connectable_to(&self, other: &PortDataType) -> bool {
        self.types()
            .iter()
            .any(|a| other.types().iter().any(|b| a.is_connectable_to(*b)))
    }

    pub fn types(&self) -> &[DataType] {
        match self {
            PortDataType::Single(t) => std::slice::from_ref(t),
            PortDataType::OneOf(types) => types,
        }
    }
}

impl From<DataType> for PortDataType {
    fn from(t: DataType) -> Self {
        PortDataType::Single(t)
    }
}

impl From<Vec<DataType>> for PortDataType {
    fn from(types: Vec<DataType>) -> Self {
        PortDataType::OneOf(types)
    }
}

/// One named input or output slot on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortDefinition {
    pub id: PortId,
    pub data_type: PortDataType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// For inputs: must be present and non-empty unless `default_value` is set.
    /// For outputs: must be present in every successful result.
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DataValue>,
}

impl PortDefinition {
    /// An optional input port.
    pub fn input(
        id: impl Into<PortId>,
        data_type: impl Into<PortDataType>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            data_type: data_type.into(),
            title: title.into(),
            description: None,
            required: false,
            default_value: None,
        }
    }

    /// A non-optional output port.
    pub fn output(
        id: impl Into<PortId>,
        data_type: impl Into<PortDataType>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            required: true,
            ..Self::input(id, data_type, title)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, value: DataValue) -> Self {
        self.default_value = Some(value);
        self
    }

    fn check_type(&self, value: &DataValue) -> Result<(), NodeError> {
        if self.data_type.accepts(value.data_type()) {
            Ok(())
        } else {
            Err(self.type_error(value.data_type()))
        }
    }

    /// Brings an incoming value in line with the port's declared type.
    ///
    /// An `any` payload is narrowed by shape to the first declared type it
    /// fits. Control-flow-excluded and null values on a port that does not
    /// take them count as not provided.
    fn conform(&self, value: DataValue) -> Result<Option<DataValue>, NodeError> {
        if self.data_type.accepts(value.data_type()) {
            return Ok(Some(value));
        }

        match value {
            DataValue::ControlFlowExcluded | DataValue::Any(Value::Null) => Ok(None),
            DataValue::Any(payload) => self
                .data_type
                .types()
                .iter()
                .find_map(|t| DataValue::from_json(*t, payload.clone()).ok())
                .map(Some)
                .ok_or_else(|| self.type_error(DataType::Any)),
            other => Err(self.type_error(other.data_type())),
        }
    }

    fn type_error(&self, got: DataType) -> NodeError {
        NodeError::validation_on(
            &self.id,
            format!("expected {}, got {}", describe(&self.data_type), got),
        )
    }
}

fn describe(data_type: &PortDataType) -> String {
    data_type
        .types()
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Checks `inputs` against the declared input ports.
///
/// Absent ports with a declared default receive it. A required port that is
/// absent or empty and has no default fails, as does any present value whose
/// type the port does not accept. `any` values are narrowed to the port's
/// type when their payload fits. Undeclared keys are dropped so a node never
/// reads past its own declaration.
pub fn validate_inputs(
    definitions: &[PortDefinition],
    inputs: Inputs,
) -> Result<Inputs, NodeError> {
    let mut inputs = inputs;
    let mut resolved = Inputs::with_capacity(definitions.len());

    for def in definitions {
        let provided = match inputs.remove(&def.id) {
            Some(value) => def.conform(value)?,
            None => None,
        };

        match provided {
            Some(value) if !value.is_empty() => {
                resolved.insert(def.id.clone(), value);
            }
            provided => {
                if let Some(default) = &def.default_value {
                    resolved.insert(def.id.clone(), default.clone());
                } else if def.required {
                    return Err(NodeError::validation_on(
                        &def.id,
                        format!("required input '{}' is missing or empty", def.title),
                    ));
                } else if let Some(value) = provided {
                    resolved.insert(def.id.clone(), value);
                }
            }
        }
    }

    for ignored in inputs.keys() {
        log::debug!("Ignoring undeclared input '{}'", ignored);
    }

    Ok(resolved)
}

/// Checks a successful result against the declared output ports.
pub fn validate_outputs(
    definitions: &[PortDefinition],
    outputs: &crate::core::value::Outputs,
) -> Result<(), NodeError> {
    for key in outputs.keys() {
        if !definitions.iter().any(|d| &d.id == key) {
            return Err(NodeError::validation_on(
                key,
                "node produced a value on an undeclared output",
            ));
        }
    }

    for def in definitions {
        match outputs.get(&def.id) {
            Some(value) => def.check_type(value)?,
            None if def.required => {
                return Err(NodeError::validation_on(
                    &def.id,
                    "node did not produce a required output",
                ));
            }
            None => {}
        }
    }

    Ok(())
}

/// Typed accessors over an [`Inputs`] map.
pub trait PortValues {
    /// The value on `port`, or a validation error naming the port.
    fn require(&self, port: &PortId) -> Result<&DataValue, NodeError>;

    fn optional_value(&self, port: &PortId) -> Option<&DataValue>;

    fn require_string(&self, port: &PortId) -> Result<&str, NodeError> {
        match self.require(port)? {
            DataValue::String(s) if !s.trim().is_empty() => Ok(s),
            DataValue::String(_) => Err(NodeError::validation_on(port, "value is empty")),
            other => Err(NodeError::validation_on(
                port,
                format!("expected string, got {}", other.data_type()),
            )),
        }
    }

    /// A non-empty string, or `None` when absent or blank.
    fn optional_string(&self, port: &PortId) -> Result<Option<&str>, NodeError> {
        match self.optional_value(port) {
            None => Ok(None),
            Some(DataValue::String(s)) if s.trim().is_empty() => Ok(None),
            Some(DataValue::String(s)) => Ok(Some(s)),
            Some(other) => Err(NodeError::validation_on(
                port,
                format!("expected string, got {}", other.data_type()),
            )),
        }
    }

    /// Accepts either a single string or a string array, without blanks.
    fn require_string_list(&self, port: &PortId) -> Result<Vec<String>, NodeError> {
        let list: Vec<String> = match self.require(port)? {
            DataValue::String(s) => vec![s.clone()],
            DataValue::StringArray(items) => items.clone(),
            other => {
                return Err(NodeError::validation_on(
                    port,
                    format!("expected string or string[], got {}", other.data_type()),
                ));
            }
        };

        let list: Vec<String> = list
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if list.is_empty() {
            return Err(NodeError::validation_on(port, "value is empty"));
        }
        Ok(list)
    }
}

impl PortValues for Inputs {
    fn require(&self, port: &PortId) -> Result<&DataValue, NodeError> {
        self.get(port)
            .ok_or_else(|| NodeError::validation_on(port, "required input is missing"))
    }

    fn optional_value(&self, port: &PortId) -> Option<&DataValue> {
        self.get(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defs() -> Vec<PortDefinition> {
        vec![
            PortDefinition::input("topic", DataType::String, "Topic").required(),
            PortDefinition::input("limit", DataType::Number, "Limit")
                .with_default(DataValue::Number(3.0)),
            PortDefinition::input("tags", vec![DataType::String, DataType::StringArray], "Tags"),
        ]
    }

    #[test]
    fn test_port_serialization_uses_editor_names() {
        let port =
            PortDefinition::input("ids", vec![DataType::String, DataType::StringArray], "IDs");
        let value = serde_json::to_value(&port).unwrap();
        assert_eq!(value["dataType"], json!(["string", "string[]"]));
        assert_eq!(value["required"], json!(false));

        let single = PortDefinition::output("out", DataType::String, "Out");
        assert_eq!(serde_json::to_value(&single).unwrap()["dataType"], json!("string"));
        assert!(single.required);
    }

    #[test]
    fn test_union_accepts_members_only() {
        let t = PortDataType::from(vec![DataType::String, DataType::StringArray]);
        assert!(t.accepts(DataType::String));
        assert!(t.accepts(DataType::StringArray));
        assert!(!t.accepts(DataType::Number));
        assert!(PortDataType::from(DataType::Any).accepts(DataType::Object));
        assert!(PortDataType::from(DataType::String).is_connectable_to(&t));
        assert!(!PortDataType::from(DataType::Boolean).is_connectable_to(&t));
    }

    #[test]
    fn test_validate_inputs_missing_required() {
        let err = validate_inputs(&defs(), Inputs::new()).unwrap_err();
        assert_eq!(err.port().map(|p| p.as_str()), Some("topic"));
    }

    #[test]
    fn test_validate_inputs_empty_required() {
        let mut inputs = Inputs::new();
        inputs.insert("topic".into(), DataValue::from(""));
        let err = validate_inputs(&defs(), inputs).unwrap_err();
        assert_eq!(err.port().map(|p| p.as_str()), Some("topic"));
    }

    #[test]
    fn test_validate_inputs_fills_defaults_and_drops_unknown() {
        let mut inputs = Inputs::new();
        inputs.insert("topic".into(), DataValue::from("alpha"));
        inputs.insert("stray".into(), DataValue::from("ignored"));

        let resolved = validate_inputs(&defs(), inputs).unwrap();
        assert_eq!(resolved.get(&"limit".into()), Some(&DataValue::Number(3.0)));
        assert!(!resolved.contains_key(&PortId::from("stray")));
        assert!(!resolved.contains_key(&PortId::from("tags")));
    }

    #[test]
    fn test_validate_inputs_rejects_wrong_type() {
        let mut inputs = Inputs::new();
        inputs.insert("topic".into(), DataValue::Number(1.0));
        let err = validate_inputs(&defs(), inputs).unwrap_err();
        assert!(matches!(err, NodeError::Validation { .. }));
        assert!(err.to_string().contains("expected string, got number"));
    }

    #[test]
    fn test_validate_inputs_narrows_any_values() {
        let mut inputs = Inputs::new();
        inputs.insert("topic".into(), DataValue::Any(json!("alpha")));
        inputs.insert("tags".into(), DataValue::Any(json!(["a", "b"])));

        let resolved = validate_inputs(&defs(), inputs).unwrap();
        assert_eq!(resolved.get(&"topic".into()), Some(&DataValue::from("alpha")));
        assert_eq!(
            resolved.get(&"tags".into()),
            Some(&DataValue::StringArray(vec!["a".into(), "b".into()]))
        );

        let mut inputs = Inputs::new();
        inputs.insert("topic".into(), DataValue::Any(json!(42)));
        let err = validate_inputs(&defs(), inputs).unwrap_err();
        assert_eq!(err.port().map(|p| p.as_str()), Some("topic"));
        assert!(err.to_string().contains("expected string, got any"));

        let mut inputs = Inputs::new();
        inputs.insert("topic".into(), DataValue::Any(json!("  ")));
        let err = validate_inputs(&defs(), inputs).unwrap_err();
        assert!(err.to_string().contains("missing or empty"));
    }

    #[test]
    fn test_validate_inputs_excluded_values_count_as_absent() {
        let mut inputs = Inputs::new();
        inputs.insert("topic".into(), DataValue::from("alpha"));
        inputs.insert("tags".into(), DataValue::ControlFlowExcluded);
        inputs.insert("limit".into(), DataValue::Any(Value::Null));

        let resolved = validate_inputs(&defs(), inputs).unwrap();
        assert!(!resolved.contains_key(&PortId::from("tags")));
        assert_eq!(resolved.get(&"limit".into()), Some(&DataValue::Number(3.0)));

        let mut inputs = Inputs::new();
        inputs.insert("topic".into(), DataValue::ControlFlowExcluded);
        let err = validate_inputs(&defs(), inputs).unwrap_err();
        assert_eq!(err.port().map(|p| p.as_str()), Some("topic"));
        assert!(err.to_string().contains("missing or empty"));

        let passthrough = vec![PortDefinition::input("value", DataType::Any, "Value")];
        let mut inputs = Inputs::new();
        inputs.insert("value".into(), DataValue::ControlFlowExcluded);
        let resolved = validate_inputs(&passthrough, inputs).unwrap();
        assert_eq!(resolved.get(&"value".into()), Some(&DataValue::ControlFlowExcluded));
    }

    #[test]
    fn test_validate_outputs() {
        let outs = vec![
            PortDefinition::output("result", DataType::String, "Result"),
            PortDefinition::output("raw", DataType::Object, "Raw").optional(),
        ];

        let mut ok = crate::Outputs::new();
        ok.insert("result".into(), DataValue::from("done"));
        assert!(validate_outputs(&outs, &ok).is_ok());

        let missing = crate::Outputs::new();
        assert!(validate_outputs(&outs, &missing).is_err());

        let mut extra = ok.clone();
        extra.insert("other".into(), DataValue::from("x"));
        assert!(validate_outputs(&outs, &extra).is_err());
    }

    #[test]
    fn test_string_list_accepts_both_shapes() {
        let port = PortId::from("ids");
        let mut inputs = Inputs::new();
        inputs.insert(port.clone(), DataValue::from("t1"));
        assert_eq!(inputs.require_string_list(&port).unwrap(), vec!["t1"]);

        inputs.insert(
            port.clone(),
            DataValue::from(vec!["t1".to_string(), " ".to_string(), "t2".to_string()]),
        );
        assert_eq!(inputs.require_string_list(&port).unwrap(), vec!["t1", "t2"]);

        inputs.insert(port.clone(), DataValue::Boolean(true));
        assert!(inputs.require_string_list(&port).is_err());
    }
}
