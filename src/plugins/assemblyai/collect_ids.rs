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
use crate::core::value::{DataType, DataValue, Inputs, Outputs, PortId};
use crate::plugins::assemblyai::lemur::TRANSCRIPT_IDS_PORT;

pub const NODE_TYPE: &str = "assemblyAiCollectTranscriptIds";

const DEFAULT_INPUT_COUNT: usize = 2;

/// Upper bound on `inputCount`, matching the editor's range.
pub const MAX_INPUT_COUNT: usize = 32;

fn default_input_count() -> usize {
    DEFAULT_INPUT_COUNT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectTranscriptIdsNodeData {
    #[serde(default = "default_input_count", rename = "inputCount")]
    pub input_count: usize,
}

impl Default for CollectTranscriptIdsNodeData {
    fn default() -> Self {
        Self {
            input_count: DEFAULT_INPUT_COUNT,
        }
    }
}

fn input_port(index: usize) -> PortId {
    PortId::new(format!("transcript_id_{}", index))
}

/// Gathers N transcript ids into the list the LeMUR nodes take.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectTranscriptIdsNode;

impl CollectTranscriptIdsNode {
    /// Port count for rendering; out-of-range values are clamped.
    fn input_count(data: &CollectTranscriptIdsNodeData) -> usize {
        data.input_count.clamp(1, MAX_INPUT_COUNT)
    }
}

#[async_trait]
impl PluginNodeImpl for CollectTranscriptIdsNode {
    fn node_type(&self) -> &str {
        NODE_TYPE
    }

    fn create(&self) -> ChartNode {
        ChartNode::new(
            NODE_TYPE,
            "Collect Transcript IDs",
            json!({ "inputCount": DEFAULT_INPUT_COUNT }),
        )
        .with_width(200.0)
    }

    fn input_definitions(&self, node: Option<&ChartNode>) -> Vec<PortDefinition> {
        let data: CollectTranscriptIdsNodeData = node
            .and_then(|n| n.parse_data().ok())
            .unwrap_or_default();

        (1..=Self::input_count(&data))
            .map(|i| {
                PortDefinition::input(
                    input_port(i),
                    vec![DataType::String, DataType::StringArray],
                    format!("Transcript ID {}", i),
                )
            })
            .collect()
    }

    fn output_definitions(&self, _node: Option<&ChartNode>) -> Vec<PortDefinition> {
        vec![PortDefinition::output(
            TRANSCRIPT_IDS_PORT,
            DataType::StringArray,
            "Transcript IDs",
        )]
    }

    fn editors(&self, _node: Option<&ChartNode>) -> Vec<EditorDefinition> {
        vec![EditorDefinition::number("Inputs", "inputCount").with_range(
            1.0,
            MAX_INPUT_COUNT as f64,
            1.0,
        )]
    }

    fn body(&self, node: &ChartNode) -> Option<String> {
        let data: CollectTranscriptIdsNodeData = node.parse_data().ok()?;
        Some(format!("{} inputs", Self::input_count(&data)))
    }

    fn ui_data(&self) -> NodeUIData {
        NodeUIData {
            info_box_title: Some("Collect Transcript IDs".to_string()),
            info_box_body: Some(
                "Combines transcript ids from several inputs into one list for LeMUR nodes"
                    .to_string(),
            ),
            context_menu_title: Some("Collect Transcript IDs".to_string()),
            group: vec!["AI".to_string(), "AssemblyAI".to_string()],
        }
    }

    async fn process(
        &self,
        data: &ConfigRecord,
        inputs: &Inputs,
        _context: &ProcessContext,
    ) -> Result<Outputs, NodeError> {
        let data: CollectTranscriptIdsNodeData = parse_node_data(data)?;
        if !(1..=MAX_INPUT_COUNT).contains(&data.input_count) {
            return Err(NodeError::validation(format!(
                "inputCount must be between 1 and {}, got {}",
                MAX_INPUT_COUNT, data.input_count
            )));
        }

        let mut ids = Vec::new();
        for i in 1..=Self::input_count(&data) {
            let port = input_port(i);
            match inputs.get(&port) {
                None => {}
                Some(DataValue::String(id)) => ids.push(id.trim().to_string()),
                Some(DataValue::StringArray(list)) => {
                    ids.extend(list.iter().map(|id| id.trim().to_string()))
                }
                Some(other) => {
                    return Err(NodeError::validation_on(
                        port,
                        format!("expected string or string[], got {}", other.data_type()),
                    ));
                }
            }
        }
        ids.retain(|id| !id.is_empty());

        if ids.is_empty() {
            return Err(NodeError::validation("no transcript ids were provided"));
        }

        let mut outputs = Outputs::new();
        outputs.insert(TRANSCRIPT_IDS_PORT.into(), DataValue::StringArray(ids));
        Ok(outputs)
    }
}

pub fn collect_transcript_ids_node() -> NodeDefinition {
    plugin_node_definition(CollectTranscriptIdsNode, "Collect Transcript IDs")
}
