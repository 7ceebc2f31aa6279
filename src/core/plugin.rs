use async_trait::async_trait;

use crate::core::context::ProcessContext;
use crate::core::editor::EditorDefinition;
use crate::core::error::NodeError;
use crate::core::node::{ChartNode, ConfigRecord, NodeUIData};
use crate::core::port::PortDefinition;
use crate::core::value::{Inputs, Outputs};

/// The interface every node kind implements.
///
/// An executor depends only on this trait. One instance serves every node of
/// its type, so implementations must not keep per-node state: whatever a call
/// needs arrives through its arguments. Shared, immutable handles (an HTTP
/// client, say) are fine.
///
/// Everything except [`process`](PluginNodeImpl::process) is synchronous and
/// side-effect free.
#[async_trait]
pub trait PluginNodeImpl: Send + Sync + 'static {
    /// The process-wide type name of the nodes this implementation interprets.
    fn node_type(&self) -> &str;

    /// Creates a brand-new node with a fresh id and this type's default data.
    ///
    /// The returned node's `node_type` must equal [`node_type`](PluginNodeImpl::node_type),
    /// and its `data` must be the same on every call.
    fn create(&self) -> ChartNode;

    /// The current input ports. May depend on `node.data`, must not mutate it.
    fn input_definitions(&self, node: Option<&ChartNode>) -> Vec<PortDefinition>;

    /// The current output ports. May depend on `node.data`, must not mutate it.
    fn output_definitions(&self, node: Option<&ChartNode>) -> Vec<PortDefinition>;

    /// UI schema for editing this node's data.
    fn editors(&self, _node: Option<&ChartNode>) -> Vec<EditorDefinition> {
        Vec::new()
    }

    /// A one-line summary the editor shows in the node body.
    fn body(&self, _node: &ChartNode) -> Option<String> {
        None
    }

    fn ui_data(&self) -> NodeUIData;

    /// Executes one node.
    ///
    /// Reads only declared inputs, writes only declared outputs, and resolves
    /// credentials through `context`. A required input that is absent yields a
    /// [`NodeError::Validation`] before any external call. A successful result
    /// carries every required output; partial failure is an error, never a
    /// partially filled `Outputs`.
    async fn process(
        &self,
        data: &ConfigRecord,
        inputs: &Inputs,
        context: &ProcessContext,
    ) -> Result<Outputs, NodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::MapConfig;
    use crate::core::port::PortValues;
    use crate::core::value::{DataType, DataValue, PortId};
    use serde_json::json;

    struct UppercaseNode;

    #[async_trait]
    impl PluginNodeImpl for UppercaseNode {
        fn node_type(&self) -> &str {
            "uppercase"
        }

        fn create(&self) -> ChartNode {
            ChartNode::new("uppercase", "Uppercase", json!({ "suffix": "!" }))
        }

        fn input_definitions(&self, _node: Option<&ChartNode>) -> Vec<PortDefinition> {
            vec![PortDefinition::input("text", DataType::String, "Text").required()]
        }

        fn output_definitions(&self, _node: Option<&ChartNode>) -> Vec<PortDefinition> {
            vec![PortDefinition::output("text", DataType::String, "Text")]
        }

        fn ui_data(&self) -> NodeUIData {
            NodeUIData {
                context_menu_title: Some("Uppercase".to_string()),
                ..Default::default()
            }
        }

        async fn process(
            &self,
            data: &ConfigRecord,
            inputs: &Inputs,
            _context: &ProcessContext,
        ) -> Result<Outputs, NodeError> {
            let text = inputs.require_string(&PortId::from("text"))?;
            let suffix = data["suffix"].as_str().unwrap_or_default();

            let mut outputs = Outputs::new();
            outputs.insert(
                "text".into(),
                DataValue::from(format!("{}{}", text.to_uppercase(), suffix)),
            );
            Ok(outputs)
        }
    }

    #[test]
    fn test_create_is_deterministic_in_shape() {
        let node = UppercaseNode;
        let a = node.create();
        let b = node.create();
        assert_eq!(a.node_type, node.node_type());
        assert_eq!(a.data, b.data);
        assert_ne!(a.id, b.id);
        assert!(node.editors(Some(&a)).is_empty());
        assert!(node.body(&a).is_none());
    }

    #[tokio::test]
    async fn test_process_through_trait_object() {
        let node: Box<dyn PluginNodeImpl> = Box::new(UppercaseNode);
        let chart = node.create();
        let ctx = ProcessContext::new(MapConfig::new());

        let mut inputs = Inputs::new();
        inputs.insert("text".into(), DataValue::from("hi"));
        let outputs = node.process(&chart.data, &inputs, &ctx).await.unwrap();
        assert_eq!(outputs.get(&PortId::from("text")), Some(&DataValue::from("HI!")));

        let err = node.process(&chart.data, &Inputs::new(), &ctx).await.unwrap_err();
        assert_eq!(err.port().map(|p| p.as_str()), Some("text"));
    }
}
