use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::context::ProcessContext;
use crate::core::editor::EditorDefinition;
use crate::core::error::NodeError;
use crate::core::node::{parse_node_data, ChartNode, ConfigRecord, NodeUIData};
use crate::core::plugin::PluginNodeImpl;
use crate::core::port::PortDefinition;
use crate::core::registry::{plugin_node_definition, NodeDefinition};
use crate::core::value::{DataValue, Inputs, Outputs};
use crate::plugins::assemblyai::client::{AssemblyAiClient, LemurEndpoint, LemurService};
use crate::plugins::assemblyai::lemur::{
    call_lemur, context_input, lemur_editors, lemur_request, response_output, response_text,
    transcript_ids_input, LemurNodeData, RESPONSE_PORT,
};

pub const NODE_TYPE: &str = "assemblyAiLemurActionItems";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LemurActionItemsNodeData {
    #[serde(flatten)]
    pub lemur: LemurNodeData,
    /// How each action item should be phrased, e.g. "Bullet Points".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_format: Option<String>,
}

/// Extracts action items from one or more transcripts.
#[derive(Clone)]
pub struct LemurActionItemsNode {
    service: Arc<dyn LemurService>,
}

impl Default for LemurActionItemsNode {
    fn default() -> Self {
        Self::new(Arc::new(AssemblyAiClient::new()))
    }
}

impl LemurActionItemsNode {
    pub fn new(service: Arc<dyn LemurService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl PluginNodeImpl for LemurActionItemsNode {
    fn node_type(&self) -> &str {
        NODE_TYPE
    }

    fn create(&self) -> ChartNode {
        ChartNode::new(NODE_TYPE, "LeMUR Action Items", json!({ "final_model": "default" }))
    }

    fn input_definitions(&self, _node: Option<&ChartNode>) -> Vec<PortDefinition> {
        vec![transcript_ids_input(), context_input()]
    }

    fn output_definitions(&self, _node: Option<&ChartNode>) -> Vec<PortDefinition> {
        vec![response_output()]
    }

    fn editors(&self, _node: Option<&ChartNode>) -> Vec<EditorDefinition> {
        let mut editors = lemur_editors();
        editors.push(EditorDefinition::string("Answer Format", "answer_format"));
        editors
    }

    fn body(&self, _node: &ChartNode) -> Option<String> {
        Some(String::new())
    }

    fn ui_data(&self) -> NodeUIData {
        NodeUIData {
            info_box_title: Some("Use AssemblyAI LeMUR Action Items".to_string()),
            info_box_body: Some(
                "Use AssemblyAI LeMUR Action Items to extract action items".to_string(),
            ),
            context_menu_title: Some("LeMUR Action Items".to_string()),
            group: vec!["AI".to_string(), "AssemblyAI".to_string()],
        }
    }

    async fn process(
        &self,
        data: &ConfigRecord,
        inputs: &Inputs,
        context: &ProcessContext,
    ) -> Result<Outputs, NodeError> {
        let data: LemurActionItemsNodeData = parse_node_data(data)?;
        let mut request = lemur_request(inputs, &data.lemur)?;
        request.answer_format = data.answer_format;

        let response = call_lemur(
            self.service.as_ref(),
            LemurEndpoint::ActionItems,
            &request,
            context,
        )
        .await?;

        let mut outputs = Outputs::new();
        outputs.insert(
            RESPONSE_PORT.into(),
            DataValue::String(response_text(LemurEndpoint::ActionItems, &response)?),
        );
        Ok(outputs)
    }
}

pub fn lemur_action_items_node(service: Arc<dyn LemurService>) -> NodeDefinition {
    plugin_node_definition(LemurActionItemsNode::new(service), "LeMUR Action Items")
}
