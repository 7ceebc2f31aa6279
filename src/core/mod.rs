//! The node contract: values and ports, node descriptors, the implementation
//! trait, the registry and the processing context.

pub mod context;
pub mod editor;
pub mod error;
pub mod node;
pub mod plugin;
pub mod port;
pub mod registry;
pub mod value;
