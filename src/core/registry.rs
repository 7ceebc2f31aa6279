use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::context::ProcessContext;
use crate::core::editor::EditorDefinition;
use crate::core::error::{NodeError, RegistryError};
use crate::core::node::{ChartNode, NodeUIData};
use crate::core::plugin::PluginNodeImpl;
use crate::core::port::{validate_inputs, validate_outputs, PortDefinition};
use crate::core::value::{Inputs, Outputs};

/// A node implementation bound to its type name and display name.
///
/// This is the unit an executor consumes: it can list, instantiate and
/// dispatch to the implementation without knowing its concrete type.
#[derive(Clone)]
pub struct NodeDefinition {
    implementation: Arc<dyn PluginNodeImpl>,
    node_type: String,
    display_name: String,
}

/// Binds `implementation` to `display_name`.
pub fn plugin_node_definition<I: PluginNodeImpl>(
    implementation: I,
    display_name: impl Into<String>,
) -> NodeDefinition {
    NodeDefinition::new(Arc::new(implementation), display_name)
}

impl NodeDefinition {
    pub fn new(implementation: Arc<dyn PluginNodeImpl>, display_name: impl Into<String>) -> Self {
        let node_type = implementation.node_type().to_string();
        Self {
            implementation,
            node_type,
            display_name: display_name.into(),
        }
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn implementation(&self) -> &Arc<dyn PluginNodeImpl> {
        &self.implementation
    }

    pub fn create(&self) -> ChartNode {
        self.implementation.create()
    }

    pub fn input_definitions(&self, node: Option<&ChartNode>) -> Vec<PortDefinition> {
        self.implementation.input_definitions(node)
    }

    pub fn output_definitions(&self, node: Option<&ChartNode>) -> Vec<PortDefinition> {
        self.implementation.output_definitions(node)
    }

    pub fn editors(&self, node: Option<&ChartNode>) -> Vec<EditorDefinition> {
        self.implementation.editors(node)
    }

    pub fn ui_data(&self) -> NodeUIData {
        self.implementation.ui_data()
    }

    /// Runs `node` with the contract enforced around the implementation.
    ///
    /// 1. An already cancelled run fails without touching the implementation.
    /// 2. `inputs` are checked against the node's input ports (defaults
    ///    filled, required ports enforced, types checked).
    /// 3. `process` races the run's cancellation signal.
    /// 4. The result is checked against the node's output ports.
    pub async fn dispatch(
        &self,
        node: &ChartNode,
        inputs: Inputs,
        context: &ProcessContext,
    ) -> Result<Outputs, NodeError> {
        context.ensure_not_cancelled()?;

        if node.node_type != self.node_type {
            return Err(NodeError::validation(format!(
                "node '{}' has type '{}' but was dispatched to '{}'",
                node.id, node.node_type, self.node_type
            )));
        }

        let inputs = validate_inputs(&self.input_definitions(Some(node)), inputs)?;

        log::debug!(
            "[{}] processing node {} ({})",
            context.execution_id(),
            node.id,
            self.node_type
        );

        let result = context
            .run_cancellable(self.implementation.process(&node.data, &inputs, context))
            .await
            .and_then(|outputs| {
                validate_outputs(&self.output_definitions(Some(node)), &outputs)?;
                Ok(outputs)
            });

        match &result {
            Ok(outputs) => log::debug!(
                "[{}] node {} produced {} output(s)",
                context.execution_id(),
                node.id,
                outputs.len()
            ),
            Err(NodeError::Cancelled) => log::info!(
                "[{}] node {} cancelled",
                context.execution_id(),
                node.id
            ),
            Err(e) => log::warn!(
                "[{}] node {} ({}) failed: {}",
                context.execution_id(),
                node.id,
                self.node_type,
                e
            ),
        }

        result
    }
}

impl std::fmt::Debug for NodeDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeDefinition")
            .field("node_type", &self.node_type)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

/// How the editor should treat a plugin setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigKind {
    /// Masked in the UI and never written to graph documents.
    Secret,
    String,
}

/// A setting a plugin reads through [`ProcessContext::get_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfigSpec {
    pub key: String,
    pub kind: ConfigKind,
    pub label: String,
    #[serde(default)]
    pub description: String,
    /// Environment variable the setting may be pulled from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_var: Option<String>,
}

/// A packaging unit: a family of node kinds plus the settings they share.
#[derive(Debug, Clone)]
pub struct Plugin {
    pub id: String,
    pub name: String,
    pub nodes: Vec<NodeDefinition>,
    pub config_spec: Vec<PluginConfigSpec>,
}

/// Collects node definitions at startup. Consumed by [`build`](Self::build).
#[derive(Debug, Default)]
pub struct NodeRegistryBuilder {
    entries: HashMap<String, Arc<NodeDefinition>>,
    order: Vec<String>,
    plugins: Vec<PluginSummary>,
}

/// What the registry remembers about a registered plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSummary {
    pub id: String,
    pub name: String,
    pub node_types: Vec<String>,
    pub config_spec: Vec<PluginConfigSpec>,
}

impl NodeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one definition. Type names are a process-wide namespace.
    pub fn register(&mut self, definition: NodeDefinition) -> Result<&mut Self, RegistryError> {
        let declared = definition.node_type().to_string();
        if self.entries.contains_key(&declared) {
            return Err(RegistryError::DuplicateType(declared));
        }

        let created = definition.create().node_type;
        if created != declared {
            return Err(RegistryError::TypeMismatch { declared, created });
        }

        log::debug!("Registered node type '{}' ({})", declared, definition.display_name());
        self.order.push(declared.clone());
        self.entries.insert(declared, Arc::new(definition));
        Ok(self)
    }

    /// Adds every node of `plugin`. Nothing is added if any of them collides.
    pub fn register_plugin(&mut self, plugin: Plugin) -> Result<&mut Self, RegistryError> {
        if self.plugins.iter().any(|p| p.id == plugin.id) {
            return Err(RegistryError::DuplicatePlugin(plugin.id));
        }

        let mut seen = std::collections::HashSet::new();
        for node in &plugin.nodes {
            if self.entries.contains_key(node.node_type()) || !seen.insert(node.node_type()) {
                return Err(RegistryError::DuplicateType(node.node_type().to_string()));
            }
        }

        let node_types = plugin
            .nodes
            .iter()
            .map(|n| n.node_type().to_string())
            .collect();
        let mut staged = NodeRegistryBuilder::new();
        for node in plugin.nodes {
            staged.register(node)?;
        }

        self.order.extend(staged.order);
        self.entries.extend(staged.entries);
        self.plugins.push(PluginSummary {
            id: plugin.id,
            name: plugin.name,
            node_types,
            config_spec: plugin.config_spec,
        });
        Ok(self)
    }

    pub fn build(self) -> NodeRegistry {
        NodeRegistry {
            entries: self.entries,
            order: self.order,
            plugins: self.plugins,
        }
    }
}

/// Read-only table mapping node type names to their definitions.
///
/// Built once before any graph runs; there is no way to add or remove
/// entries afterwards. Share it behind an `Arc`.
pub struct NodeRegistry {
    entries: HashMap<String, Arc<NodeDefinition>>,
    order: Vec<String>,
    plugins: Vec<PluginSummary>,
}

impl NodeRegistry {
    pub fn builder() -> NodeRegistryBuilder {
        NodeRegistryBuilder::new()
    }

    pub fn get(&self, node_type: &str) -> Option<&Arc<NodeDefinition>> {
        self.entries.get(node_type)
    }

    pub fn require(&self, node_type: &str) -> Result<&Arc<NodeDefinition>, RegistryError> {
        self.get(node_type)
            .ok_or_else(|| RegistryError::UnknownType(node_type.to_string()))
    }

    pub fn contains(&self, node_type: &str) -> bool {
        self.entries.contains_key(node_type)
    }

    /// Type names in registration order.
    pub fn node_types(&self) -> &[String] {
        &self.order
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &Arc<NodeDefinition>> + '_ {
        self.order.iter().filter_map(|t| self.entries.get(t))
    }

    pub fn plugins(&self) -> &[PluginSummary] {
        &self.plugins
    }

    /// Every setting declared by the registered plugins.
    pub fn config_specs(&self) -> impl Iterator<Item = &PluginConfigSpec> + '_ {
        self.plugins.iter().flat_map(|p| p.config_spec.iter())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Creates a default node of `node_type`.
    pub fn create(&self, node_type: &str) -> Result<ChartNode, RegistryError> {
        Ok(self.require(node_type)?.create())
    }

    /// Dispatches `node` to the definition registered for its type.
    pub async fn dispatch(
        &self,
        node: &ChartNode,
        inputs: Inputs,
        context: &ProcessContext,
    ) -> Result<Outputs, NodeError> {
        let definition = self.get(&node.node_type).ok_or_else(|| {
            NodeError::validation(format!("node type '{}' is not registered", node.node_type))
        })?;
        definition.dispatch(node, inputs, context).await
    }
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("node_types", &self.order)
            .field("plugins", &self.plugins.iter().map(|p| &p.id).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::MapConfig;
    use crate::core::value::{DataType, DataValue, PortId};
    use async_trait::async_trait;
    use serde_json::json;

    struct Echo {
        node_type: &'static str,
        created_type: &'static str,
    }

    impl Echo {
        fn named(node_type: &'static str) -> Self {
            Self {
                node_type,
                created_type: node_type,
            }
        }
    }

    #[async_trait]
    impl PluginNodeImpl for Echo {
        fn node_type(&self) -> &str {
            self.node_type
        }

        fn create(&self) -> ChartNode {
            ChartNode::new(self.created_type, "Echo", json!({}))
        }

        fn input_definitions(&self, _node: Option<&ChartNode>) -> Vec<PortDefinition> {
            vec![PortDefinition::input("in", DataType::String, "In").required()]
        }

        fn output_definitions(&self, _node: Option<&ChartNode>) -> Vec<PortDefinition> {
            vec![PortDefinition::output("out", DataType::String, "Out")]
        }

        fn ui_data(&self) -> NodeUIData {
            NodeUIData::default()
        }

        async fn process(
            &self,
            _data: &serde_json::Value,
            inputs: &Inputs,
            _context: &ProcessContext,
        ) -> Result<Outputs, NodeError> {
            let mut outputs = Outputs::new();
            if let Some(value) = inputs.get(&PortId::from("in")) {
                outputs.insert("out".into(), value.clone());
            }
            Ok(outputs)
        }
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let mut builder = NodeRegistry::builder();
        builder
            .register(plugin_node_definition(Echo::named("echo"), "Echo"))
            .unwrap();
        let err = builder
            .register(plugin_node_definition(Echo::named("echo"), "Echo Again"))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateType("echo".to_string()));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let mut builder = NodeRegistry::builder();
        let err = builder
            .register(plugin_node_definition(
                Echo {
                    node_type: "declared",
                    created_type: "created",
                },
                "Broken",
            ))
            .unwrap_err();
        assert!(matches!(err, RegistryError::TypeMismatch { .. }));
    }

    #[test]
    fn test_plugin_registration_is_atomic() {
        let mut builder = NodeRegistry::builder();
        builder
            .register(plugin_node_definition(Echo::named("b"), "B"))
            .unwrap();

        let plugin = Plugin {
            id: "pack".to_string(),
            name: "Pack".to_string(),
            nodes: vec![
                plugin_node_definition(Echo::named("a"), "A"),
                plugin_node_definition(Echo::named("b"), "B"),
            ],
            config_spec: vec![],
        };
        assert!(builder.register_plugin(plugin).is_err());

        let registry = builder.build();
        assert!(!registry.contains("a"));
        assert_eq!(registry.node_types(), ["b".to_string()]);
        assert!(registry.plugins().is_empty());
    }

    #[test]
    fn test_duplicate_plugin_id() {
        let plugin = |t: &'static str| Plugin {
            id: "pack".to_string(),
            name: "Pack".to_string(),
            nodes: vec![plugin_node_definition(Echo::named(t), t)],
            config_spec: vec![],
        };
        let mut builder = NodeRegistry::builder();
        builder.register_plugin(plugin("x")).unwrap();
        let err = builder.register_plugin(plugin("y")).unwrap_err();
        assert_eq!(err, RegistryError::DuplicatePlugin("pack".to_string()));
    }

    #[tokio::test]
    async fn test_dispatch_enforces_outputs() {
        let mut builder = NodeRegistry::builder();
        builder
            .register(plugin_node_definition(Echo::named("echo"), "Echo"))
            .unwrap();
        let registry = builder.build();
        let ctx = ProcessContext::new(MapConfig::new());
        let node = registry.create("echo").unwrap();

        let mut inputs = Inputs::new();
        inputs.insert("in".into(), DataValue::from("ping"));
        let outputs = registry.dispatch(&node, inputs, &ctx).await.unwrap();
        assert_eq!(outputs.get(&PortId::from("out")), Some(&DataValue::from("ping")));

        let err = registry.dispatch(&node, Inputs::new(), &ctx).await.unwrap_err();
        assert_eq!(err.port().map(|p| p.as_str()), Some("in"));
    }

    #[tokio::test]
    async fn test_dispatch_rejects_foreign_node() {
        let definition = plugin_node_definition(Echo::named("echo"), "Echo");
        let foreign = ChartNode::new("other", "Other", json!({}));
        let ctx = ProcessContext::new(MapConfig::new());
        let err = definition.dispatch(&foreign, Inputs::new(), &ctx).await.unwrap_err();
        assert!(matches!(err, NodeError::Validation { .. }));
    }

    #[test]
    fn test_unknown_type() {
        let registry = NodeRegistry::builder().build();
        assert!(registry.is_empty());
        assert_eq!(
            registry.create("nope").unwrap_err(),
            RegistryError::UnknownType("nope".to_string())
        );
    }
}
