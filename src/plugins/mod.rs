//! Built-in node plugins.

#[cfg(feature = "assemblyai")]
pub mod assemblyai;

use crate::core::error::RegistryError;
use crate::core::registry::{NodeRegistry, Plugin};

/// Every plugin compiled into this build.
pub fn builtin_plugins() -> Vec<Plugin> {
    #[allow(unused_mut)]
    let mut plugins = Vec::new();

    #[cfg(feature = "assemblyai")]
    plugins.push(assemblyai::assemblyai_plugin());

    plugins
}

/// A registry holding every built-in plugin.
pub fn builtin_registry() -> Result<NodeRegistry, RegistryError> {
    let mut builder = NodeRegistry::builder();
    for plugin in builtin_plugins() {
        builder.register_plugin(plugin)?;
    }
    Ok(builder.build())
}
