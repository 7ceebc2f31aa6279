use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::context::ProcessContext;
use crate::core::editor::EditorDefinition;
use crate::core::error::NodeError;
use crate::core::node::{parse_node_data, ChartNode, ConfigRecord, NodeUIData};
use crate::core::plugin::PluginNodeImpl;
use crate::core::port::{PortDefinition, PortValues};
use crate::core::registry::{plugin_node_definition, NodeDefinition};
use crate::core::value::{DataType, DataValue, Inputs, Outputs, PortId};
use crate::plugins::assemblyai::client::{AssemblyAiClient, LemurEndpoint, LemurService};
use crate::plugins::assemblyai::lemur::{
    call_lemur, context_input, lemur_editors, lemur_request, response_output, response_text,
    transcript_ids_input, LemurNodeData, RESPONSE_PORT,
};

pub const NODE_TYPE: &str = "assemblyAiLemurTask";
pub const PROMPT_PORT: &str = "prompt";

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LemurTaskNodeData {
    #[serde(flatten)]
    pub lemur: LemurNodeData,
    #[serde(default)]
    pub prompt: String,
    /// When set, the prompt comes from the `prompt` input port instead of `prompt`.
    #[serde(default = "default_true", rename = "usePromptInput")]
    pub use_prompt_input: bool,
}

impl Default for LemurTaskNodeData {
    fn default() -> Self {
        Self {
            lemur: LemurNodeData::default(),
            prompt: String::new(),
            use_prompt_input: true,
        }
    }
}

/// Runs a free-form prompt over one or more transcripts.
#[derive(Clone)]
pub struct LemurTaskNode {
    service: Arc<dyn LemurService>,
}

impl Default for LemurTaskNode {
    fn default() -> Self {
        Self::new(Arc::new(AssemblyAiClient::new()))
    }
}

impl LemurTaskNode {
    pub fn new(service: Arc<dyn LemurService>) -> Self {
        Self { service }
    }

    fn node_data(node: Option<&ChartNode>) -> LemurTaskNodeData {
        node.and_then(|n| n.parse_data().ok()).unwrap_or_default()
    }
}

#[async_trait]
impl PluginNodeImpl for LemurTaskNode {
    fn node_type(&self) -> &str {
        NODE_TYPE
    }

    fn create(&self) -> ChartNode {
        ChartNode::new(
            NODE_TYPE,
            "LeMUR Task",
            json!({ "final_model": "default", "prompt": "", "usePromptInput": true }),
        )
    }

    fn input_definitions(&self, node: Option<&ChartNode>) -> Vec<PortDefinition> {
        let mut inputs = vec![transcript_ids_input()];
        if Self::node_data(node).use_prompt_input {
            inputs.push(PortDefinition::input(PROMPT_PORT, DataType::String, "Prompt").required());
        }
        inputs.push(context_input());
        inputs
    }

    fn output_definitions(&self, _node: Option<&ChartNode>) -> Vec<PortDefinition> {
        vec![response_output()]
    }

    fn editors(&self, _node: Option<&ChartNode>) -> Vec<EditorDefinition> {
        let mut editors = vec![EditorDefinition::String {
            label: "Prompt".to_string(),
            data_key: "prompt".to_string(),
            multiline: true,
            use_input_toggle_data_key: Some("usePromptInput".to_string()),
        }];
        editors.extend(lemur_editors());
        editors
    }

    fn body(&self, node: &ChartNode) -> Option<String> {
        let data = Self::node_data(Some(node));
        if data.use_prompt_input || data.prompt.is_empty() {
            None
        } else {
            Some(data.prompt)
        }
    }

    fn ui_data(&self) -> NodeUIData {
        NodeUIData {
            info_box_title: Some("Use AssemblyAI LeMUR Task".to_string()),
            info_box_body: Some(
                "Use AssemblyAI LeMUR Task to apply a custom prompt to transcripts".to_string(),
            ),
            context_menu_title: Some("LeMUR Task".to_string()),
            group: vec!["AI".to_string(), "AssemblyAI".to_string()],
        }
    }

    async fn process(
        &self,
        data: &ConfigRecord,
        inputs: &Inputs,
        context: &ProcessContext,
    ) -> Result<Outputs, NodeError> {
        let data: LemurTaskNodeData = parse_node_data(data)?;
        let mut request = lemur_request(inputs, &data.lemur)?;

        let prompt = if data.use_prompt_input {
            inputs.require_string(&PortId::from(PROMPT_PORT))?.to_string()
        } else if data.prompt.trim().is_empty() {
            return Err(NodeError::validation("prompt is not configured"));
        } else {
            data.prompt
        };
        request.prompt = Some(prompt);

        let response =
            call_lemur(self.service.as_ref(), LemurEndpoint::Task, &request, context).await?;

        let mut outputs = Outputs::new();
        outputs.insert(
            RESPONSE_PORT.into(),
            DataValue::String(response_text(LemurEndpoint::Task, &response)?),
        );
        Ok(outputs)
    }
}

pub fn lemur_task_node(service: Arc<dyn LemurService>) -> NodeDefinition {
    plugin_node_definition(LemurTaskNode::new(service), "LeMUR Task")
}
