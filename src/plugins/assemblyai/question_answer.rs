use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::core::context::ProcessContext;
use crate::core::editor::EditorDefinition;
use crate::core::error::NodeError;
use crate::core::node::{parse_node_data, ChartNode, ConfigRecord, NodeUIData};
use crate::core::plugin::PluginNodeImpl;
use crate::core::port::{PortDefinition, PortValues};
use crate::core::registry::{plugin_node_definition, NodeDefinition};
use crate::core::value::{DataType, DataValue, Inputs, Outputs, PortId};
use crate::plugins::assemblyai::client::{
    AssemblyAiClient, LemurEndpoint, LemurQuestion, LemurService,
};
use crate::plugins::assemblyai::lemur::{
    call_lemur, context_input, lemur_editors, lemur_request, transcript_ids_input, LemurNodeData,
    RESPONSE_PORT,
};

pub const NODE_TYPE: &str = "assemblyAiLemurQuestionAnswer";
pub const QUESTION_PORT: &str = "question";
pub const ANSWER_PORT: &str = "answer";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LemurQuestionAnswerNodeData {
    #[serde(flatten)]
    pub lemur: LemurNodeData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_format: Option<String>,
}

/// Asks a question about one or more transcripts.
#[derive(Clone)]
pub struct LemurQuestionAnswerNode {
    service: Arc<dyn LemurService>,
}

impl Default for LemurQuestionAnswerNode {
    fn default() -> Self {
        Self::new(Arc::new(AssemblyAiClient::new()))
    }
}

impl LemurQuestionAnswerNode {
    pub fn new(service: Arc<dyn LemurService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl PluginNodeImpl for LemurQuestionAnswerNode {
    fn node_type(&self) -> &str {
        NODE_TYPE
    }

    fn create(&self) -> ChartNode {
        ChartNode::new(
            NODE_TYPE,
            "LeMUR Question & Answer",
            json!({ "final_model": "default" }),
        )
    }

    fn input_definitions(&self, _node: Option<&ChartNode>) -> Vec<PortDefinition> {
        vec![
            transcript_ids_input(),
            PortDefinition::input(QUESTION_PORT, DataType::String, "Question").required(),
            context_input(),
        ]
    }

    fn output_definitions(&self, _node: Option<&ChartNode>) -> Vec<PortDefinition> {
        vec![
            PortDefinition::output(ANSWER_PORT, DataType::String, "Answer"),
            PortDefinition::output(RESPONSE_PORT, DataType::ObjectArray, "Response")
                .with_description("Raw question/answer pairs")
                .optional(),
        ]
    }

    fn editors(&self, _node: Option<&ChartNode>) -> Vec<EditorDefinition> {
        let mut editors = lemur_editors();
        editors.push(EditorDefinition::string("Answer Format", "answer_format"));
        editors
    }

    fn ui_data(&self) -> NodeUIData {
        NodeUIData {
            info_box_title: Some("Use AssemblyAI LeMUR Question & Answer".to_string()),
            info_box_body: Some(
                "Use AssemblyAI LeMUR to answer a question about transcripts".to_string(),
            ),
            context_menu_title: Some("LeMUR Q&A".to_string()),
            group: vec!["AI".to_string(), "AssemblyAI".to_string()],
        }
    }

    async fn process(
        &self,
        data: &ConfigRecord,
        inputs: &Inputs,
        context: &ProcessContext,
    ) -> Result<Outputs, NodeError> {
        let data: LemurQuestionAnswerNodeData = parse_node_data(data)?;
        let question = inputs.require_string(&PortId::from(QUESTION_PORT))?.to_string();
        let mut request = lemur_request(inputs, &data.lemur)?;

        request.questions = Some(vec![LemurQuestion {
            question,
            context: None,
            answer_format: data.answer_format,
        }]);

        let response = call_lemur(
            self.service.as_ref(),
            LemurEndpoint::QuestionAnswer,
            &request,
            context,
        )
        .await?;

        let pairs: Vec<Map<String, Value>> = match response.response {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => Ok(map),
                    other => Err(NodeError::external(format!(
                        "LeMUR question-answer returned a non-object item: {}",
                        other
                    ))),
                })
                .collect::<Result<_, _>>()?,
            other => {
                return Err(NodeError::external(format!(
                    "LeMUR question-answer returned {} instead of a list",
                    other
                )));
            }
        };

        let answer = pairs
            .first()
            .and_then(|pair| pair.get("answer"))
            .and_then(Value::as_str)
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| NodeError::external("LeMUR question-answer returned no answer"))?
            .to_string();

        let mut outputs = Outputs::new();
        outputs.insert(ANSWER_PORT.into(), DataValue::String(answer));
        outputs.insert(RESPONSE_PORT.into(), DataValue::ObjectArray(pairs));
        Ok(outputs)
    }
}

pub fn lemur_question_answer_node(service: Arc<dyn LemurService>) -> NodeDefinition {
    plugin_node_definition(LemurQuestionAnswerNode::new(service), "LeMUR Question & Answer")
}
