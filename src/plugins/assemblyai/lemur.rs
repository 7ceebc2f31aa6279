//! Pieces shared by every LeMUR node: configuration record, ports, editors,
//! request assembly and the guarded remote call.

use serde::{Deserialize, Serialize};

use crate::core::context::ProcessContext;
use crate::core::editor::{DropdownOption, EditorDefinition};
use crate::core::error::NodeError;
use crate::core::port::{PortDefinition, PortValues};
use crate::core::value::{DataType, Inputs, PortId};
use crate::plugins::assemblyai::client::{
    AssemblyAiConfig, LemurEndpoint, LemurRequest, LemurResponse, LemurService,
};

pub const TRANSCRIPT_IDS_PORT: &str = "transcript_ids";
pub const CONTEXT_PORT: &str = "context";
pub const RESPONSE_PORT: &str = "response";

pub const DEFAULT_FINAL_MODEL: &str = "default";

/// Models LeMUR accepts as `final_model`.
pub const FINAL_MODELS: &[(&str, &str)] = &[
    ("default", "Default"),
    ("basic", "Basic"),
    ("assemblyai/mistral-7b", "Mistral 7B"),
    ("anthropic/claude-3-5-sonnet", "Claude 3.5 Sonnet"),
    ("anthropic/claude-3-opus", "Claude 3 Opus"),
    ("anthropic/claude-3-haiku", "Claude 3 Haiku"),
    ("anthropic/claude-3-sonnet", "Claude 3 Sonnet"),
];

fn default_final_model() -> String {
    DEFAULT_FINAL_MODEL.to_string()
}

/// Configuration every LeMUR node carries in its `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LemurNodeData {
    #[serde(default = "default_final_model")]
    pub final_model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl Default for LemurNodeData {
    fn default() -> Self {
        Self {
            final_model: default_final_model(),
            context: None,
            max_output_size: None,
            temperature: None,
        }
    }
}

/// Transcript ids arrive as one id or a list of them.
pub fn transcript_ids_input() -> PortDefinition {
    PortDefinition::input(
        TRANSCRIPT_IDS_PORT,
        vec![DataType::String, DataType::StringArray],
        "Transcript IDs",
    )
    .required()
}

pub fn context_input() -> PortDefinition {
    PortDefinition::input(CONTEXT_PORT, DataType::String, "Context")
        .with_description("Overrides the context configured on the node")
}

pub fn response_output() -> PortDefinition {
    PortDefinition::output(RESPONSE_PORT, DataType::String, "Response")
}

/// Editors for the fields of [`LemurNodeData`].
pub fn lemur_editors() -> Vec<EditorDefinition> {
    vec![
        EditorDefinition::string("Context", "context"),
        EditorDefinition::dropdown(
            "Final Model",
            "final_model",
            FINAL_MODELS
                .iter()
                .map(|(value, label)| DropdownOption::new(*value, *label))
                .collect(),
        ),
        EditorDefinition::number("Maximum Output Size", "max_output_size")
            .with_range(1.0, 4000.0, 1.0),
        EditorDefinition::number("Temperature", "temperature").with_range(0.0, 1.0, 0.1),
    ]
}

/// Builds the common part of a LeMUR request from `inputs` and node data.
///
/// The `context` input, when present, takes precedence over `data.context`.
pub fn lemur_request(inputs: &Inputs, data: &LemurNodeData) -> Result<LemurRequest, NodeError> {
    let transcript_ids = inputs.require_string_list(&PortId::from(TRANSCRIPT_IDS_PORT))?;

    let context = inputs
        .optional_string(&PortId::from(CONTEXT_PORT))?
        .map(str::to_string)
        .or_else(|| data.context.clone().filter(|c| !c.trim().is_empty()));

    if let Some(temperature) = data.temperature {
        if !(0.0..=1.0).contains(&temperature) {
            return Err(NodeError::validation(format!(
                "temperature must be between 0 and 1, got {}",
                temperature
            )));
        }
    }
    if data.max_output_size == Some(0) {
        return Err(NodeError::validation("max_output_size must be positive"));
    }

    Ok(LemurRequest {
        transcript_ids,
        final_model: data.final_model.clone(),
        context,
        max_output_size: data.max_output_size,
        temperature: data.temperature,
        ..Default::default()
    })
}

/// Resolves credentials, then performs one cancellable LeMUR call.
///
/// Nothing is sent when the key is missing or the run is already cancelled.
pub async fn call_lemur(
    service: &dyn LemurService,
    endpoint: LemurEndpoint,
    request: &LemurRequest,
    context: &ProcessContext,
) -> Result<LemurResponse, NodeError> {
    let config = AssemblyAiConfig::from_context(context)?;
    context.ensure_not_cancelled()?;

    let response = context
        .run_cancellable(service.generate(&config, endpoint, request))
        .await?;

    if let Some(usage) = &response.usage {
        log::debug!(
            "LeMUR {} request {} used {} input / {} output tokens",
            endpoint,
            response.request_id,
            usage.input_tokens,
            usage.output_tokens
        );
    }
    Ok(response)
}

/// The text of a string-valued response. Blank text counts as a failed call.
pub fn response_text(
    endpoint: LemurEndpoint,
    response: &LemurResponse,
) -> Result<String, NodeError> {
    match response.response.as_str() {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        Some(_) => Err(NodeError::external(format!(
            "LeMUR {} returned an empty response",
            endpoint
        ))),
        None => Err(NodeError::external(format!(
            "LeMUR {} returned a non-text response",
            endpoint
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::DataValue;
    use serde_json::json;

    #[test]
    fn test_data_defaults() {
        let data: LemurNodeData = serde_json::from_value(json!({})).unwrap();
        assert_eq!(data, LemurNodeData::default());
        assert_eq!(data.final_model, "default");
    }

    #[test]
    fn test_context_input_overrides_data() {
        let data = LemurNodeData {
            context: Some("from data".to_string()),
            ..Default::default()
        };

        let mut inputs = Inputs::new();
        inputs.insert(TRANSCRIPT_IDS_PORT.into(), DataValue::from("t1"));
        let request = lemur_request(&inputs, &data).unwrap();
        assert_eq!(request.context.as_deref(), Some("from data"));

        inputs.insert(CONTEXT_PORT.into(), DataValue::from("from input"));
        let request = lemur_request(&inputs, &data).unwrap();
        assert_eq!(request.context.as_deref(), Some("from input"));
        assert_eq!(request.transcript_ids, vec!["t1"]);
    }

    #[test]
    fn test_request_validation() {
        let mut inputs = Inputs::new();
        let err = lemur_request(&inputs, &LemurNodeData::default()).unwrap_err();
        assert_eq!(err.port().map(|p| p.as_str()), Some(TRANSCRIPT_IDS_PORT));

        inputs.insert(TRANSCRIPT_IDS_PORT.into(), DataValue::from("t1"));
        let hot = LemurNodeData {
            temperature: Some(1.5),
            ..Default::default()
        };
        assert!(lemur_request(&inputs, &hot).is_err());
    }

    #[test]
    fn test_response_text() {
        let ok = LemurResponse {
            request_id: "r".to_string(),
            response: json!("text"),
            usage: None,
        };
        assert_eq!(response_text(LemurEndpoint::Summary, &ok).unwrap(), "text");

        let blank = LemurResponse {
            response: json!("  "),
            ..ok.clone()
        };
        assert!(matches!(
            response_text(LemurEndpoint::Summary, &blank),
            Err(NodeError::ExternalService { .. })
        ));
    }

    #[test]
    fn test_editors_cover_data_keys() {
        let keys: Vec<_> = lemur_editors().iter().map(|e| e.data_key().to_string()).collect();
        assert_eq!(keys, ["context", "final_model", "max_output_size", "temperature"]);
    }
}
