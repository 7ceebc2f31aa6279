use serde::{Deserialize, Serialize};

/// One choice of a dropdown editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub value: String,
    pub label: String,
}

impl DropdownOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Declarative description of how one field of a node's configuration is edited.
///
/// Purely descriptive: the editor renders these, nothing executes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorDefinition {
    #[serde(rename_all = "camelCase")]
    String {
        label: String,
        data_key: String,
        #[serde(default)]
        multiline: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        use_input_toggle_data_key: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Number {
        label: String,
        data_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
        #[serde(default)]
        allow_empty: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        use_input_toggle_data_key: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Toggle { label: String, data_key: String },
    #[serde(rename_all = "camelCase")]
    Dropdown {
        label: String,
        data_key: String,
        options: Vec<DropdownOption>,
    },
    #[serde(rename_all = "camelCase")]
    StringList { label: String, data_key: String },
}

impl EditorDefinition {
    pub fn string(label: impl Into<String>, data_key: impl Into<String>) -> Self {
        EditorDefinition::String {
            label: label.into(),
            data_key: data_key.into(),
            multiline: false,
            use_input_toggle_data_key: None,
        }
    }

    pub fn number(label: impl Into<String>, data_key: impl Into<String>) -> Self {
        EditorDefinition::Number {
            label: label.into(),
            data_key: data_key.into(),
            min: None,
            max: None,
            step: None,
            allow_empty: true,
            use_input_toggle_data_key: None,
        }
    }

    pub fn dropdown(
        label: impl Into<String>,
        data_key: impl Into<String>,
        options: Vec<DropdownOption>,
    ) -> Self {
        EditorDefinition::Dropdown {
            label: label.into(),
            data_key: data_key.into(),
            options,
        }
    }

    /// Bounds a number editor; no effect on other editors.
    pub fn with_range(mut self, lo: f64, hi: f64, increment: f64) -> Self {
        if let EditorDefinition::Number { min, max, step, .. } = &mut self {
            *min = Some(lo);
            *max = Some(hi);
            *step = Some(increment);
        }
        self
    }

    /// Lets the field be supplied by an input port, toggled by `toggle_key`.
    pub fn with_input_toggle(mut self, toggle_key: impl Into<String>) -> Self {
        match &mut self {
            EditorDefinition::String {
                use_input_toggle_data_key,
                ..
            }
            | EditorDefinition::Number {
                use_input_toggle_data_key,
                ..
            } => *use_input_toggle_data_key = Some(toggle_key.into()),
            _ => {}
        }
        self
    }

    pub fn data_key(&self) -> &str {
        match self {
            EditorDefinition::String { data_key, .. }
            | EditorDefinition::Number { data_key, .. }
            | EditorDefinition::Toggle { data_key, .. }
            | EditorDefinition::Dropdown { data_key, .. }
            | EditorDefinition::StringList { data_key, .. } => data_key,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            EditorDefinition::String { label, .. }
            | EditorDefinition::Number { label, .. }
            | EditorDefinition::Toggle { label, .. }
            | EditorDefinition::Dropdown { label, .. }
            | EditorDefinition::StringList { label, .. } => label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_editor_wire_shape() {
        let editor = EditorDefinition::string("Context", "context");
        assert_eq!(
            serde_json::to_value(&editor).unwrap(),
            json!({
                "type": "string",
                "label": "Context",
                "dataKey": "context",
                "multiline": false
            })
        );

        let dropdown = EditorDefinition::dropdown(
            "Model",
            "final_model",
            vec![DropdownOption::new("default", "Default")],
        );
        let value = serde_json::to_value(&dropdown).unwrap();
        assert_eq!(value["type"], json!("dropdown"));
        assert_eq!(value["options"][0]["value"], json!("default"));
    }

    #[test]
    fn test_builders_only_touch_matching_variants() {
        let number = EditorDefinition::number("Temperature", "temperature")
            .with_range(0.0, 1.0, 0.1)
            .with_input_toggle("useTemperatureInput");
        match &number {
            EditorDefinition::Number { max, use_input_toggle_data_key, .. } => {
                assert_eq!(*max, Some(1.0));
                assert_eq!(use_input_toggle_data_key.as_deref(), Some("useTemperatureInput"));
            }
            other => panic!("unexpected editor {:?}", other),
        }

        let dropdown =
            EditorDefinition::dropdown("Model", "final_model", vec![]).with_range(0.0, 1.0, 0.1);
        assert_eq!(dropdown.data_key(), "final_model");
        assert_eq!(dropdown.label(), "Model");
    }
}
