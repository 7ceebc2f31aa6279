//! # Nodeplug
//!
//! The plugin contract behind a node-based editor for AI pipelines: how
//! independently written node kinds are described, registered, configured and
//! invoked by a graph executor that never sees their concrete types.
//!
//! ## Features
//!
//! - **Typed Ports**: Values carry their [`DataType`] tag; mismatches are rejected, never coerced
//! - **One Trait Per Node Kind**: Implement [`PluginNodeImpl`] and every executor can drive it
//! - **Startup Registry**: [`NodeRegistry`] is built once and read-only afterwards
//! - **Credential Indirection**: Secrets come from [`ProcessContext`], never from node data
//! - **Cooperative Cancellation**: One signal per run, observed by every in-flight node
//! - **Optional Built-ins**: AssemblyAI LeMUR nodes (feature `assemblyai`, on by default)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nodeplug::prelude::*;
//! use async_trait::async_trait;
//! use serde_json::json;
//!
//! struct Shout;
//!
//! #[async_trait]
//! impl PluginNodeImpl for Shout {
//!     fn node_type(&self) -> &str { "shout" }
//!
//!     fn create(&self) -> ChartNode {
//!         ChartNode::new("shout", "Shout", json!({}))
//!     }
//!
//!     fn input_definitions(&self, _node: Option<&ChartNode>) -> Vec<PortDefinition> {
//!         vec![PortDefinition::input("text", DataType::String, "Text").required()]
//!     }
//!
//!     fn output_definitions(&self, _node: Option<&ChartNode>) -> Vec<PortDefinition> {
//!         vec![PortDefinition::output("text", DataType::String, "Text")]
//!     }
//!
//!     fn ui_data(&self) -> NodeUIData { NodeUIData::default() }
//!
//!     async fn process(
//!         &self,
//!         _data: &ConfigRecord,
//!         inputs: &Inputs,
//!         _context: &ProcessContext,
//!     ) -> Result<Outputs, NodeError> {
//!         let text = inputs.require_string(&"text".into())?;
//!         let mut outputs = Outputs::new();
//!         outputs.insert("text".into(), DataValue::from(text.to_uppercase()));
//!         Ok(outputs)
//!     }
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut builder = NodeRegistry::builder();
//! builder.register(plugin_node_definition(Shout, "Shout"))?;
//! let registry = builder.build();
//!
//! let node = registry.create("shout")?;
//! let ctx = ProcessContext::new(MapConfig::new());
//! let mut inputs = Inputs::new();
//! inputs.insert("text".into(), DataValue::from("hello"));
//! let outputs = registry.dispatch(&node, inputs, &ctx).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`core`]: values, ports, node descriptors, the implementation trait, registry and context
//! - [`plugins`]: built-in node families
//! - [`prelude`]: Commonly used types and traits (import with `use nodeplug::prelude::*`)

// ============================================================================
// Core Module
// ============================================================================

pub mod core;

// ============================================================================
// Public Re-exports - Granular Imports
// ============================================================================

// Values and ports
pub use crate::core::port::{
    validate_inputs, validate_outputs, PortDataType, PortDefinition, PortValues,
};
pub use crate::core::value::{DataType, DataValue, Inputs, NodeId, Outputs, PortId};

// Node descriptor
pub use crate::core::editor::{DropdownOption, EditorDefinition};
pub use crate::core::node::{parse_node_data, ChartNode, ConfigRecord, NodeUIData, VisualData};

// Contract, registry and context
pub use crate::core::context::{ConfigSource, EnvConfig, LayeredConfig, MapConfig, ProcessContext};
pub use crate::core::error::{NodeError, NodeErrorKind, RegistryError};
pub use crate::core::plugin::PluginNodeImpl;
pub use crate::core::registry::{
    plugin_node_definition, ConfigKind, NodeDefinition, NodeRegistry, NodeRegistryBuilder, Plugin,
    PluginConfigSpec, PluginSummary,
};

// ============================================================================
// Prelude Module - Convenient Bulk Imports
// ============================================================================

/// Everything a node implementation or an executor usually needs.
///
/// # Example
/// ```rust
/// use nodeplug::prelude::*;
/// ```
pub mod prelude {
    pub use super::{
        plugin_node_definition, ChartNode, ConfigRecord, ConfigSource, DataType, DataValue,
        EditorDefinition, Inputs, MapConfig, NodeDefinition, NodeError, NodeId, NodeRegistry,
        NodeUIData, Outputs, PluginNodeImpl, PortDefinition, PortId, PortValues, ProcessContext,
    };
}

// ============================================================================
// Built-in Plugins
// ============================================================================

pub mod plugins;

pub use plugins::{builtin_plugins, builtin_registry};

// ============================================================================
// Re-export commonly used external types for convenience
// ============================================================================

pub use serde_json::Value as JsonValue;
pub use tokio_util::sync::CancellationToken;

// ============================================================================
// Library Metadata
// ============================================================================

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of this crate.
pub const NAME: &str = env!("CARGO_PKG_NAME");
