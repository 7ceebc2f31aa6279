//! The capability bag handed to every `process` call.
//!
//! Node implementations resolve credentials and settings through a
//! [`ProcessContext`] instead of storing them in node data, and observe the
//! run's cancellation signal through it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::core::error::NodeError;

/// Read path into a configuration/secret store.
pub trait ConfigSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// In-memory configuration, typically filled from the editor's settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapConfig {
    values: HashMap<String, String>,
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Parses a JSON object of string values.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigSource for MapConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Configuration read from process environment variables.
///
/// Keys map to variables through explicit aliases; unaliased keys fall back
/// to their SCREAMING_SNAKE_CASE form (`assemblyAiApiKey` -> `ASSEMBLY_AI_API_KEY`).
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    aliases: HashMap<String, String>,
}

impl EnvConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(mut self, key: impl Into<String>, var: impl Into<String>) -> Self {
        self.aliases.insert(key.into(), var.into());
        self
    }

    /// Aliases every config key declared by `specs` that names an environment variable.
    pub fn for_plugins<'a>(
        specs: impl IntoIterator<Item = &'a crate::core::registry::PluginConfigSpec>,
    ) -> Self {
        specs
            .into_iter()
            .filter_map(|spec| spec.env_var.as_ref().map(|var| (spec.key.clone(), var.clone())))
            .fold(Self::new(), |env, (key, var)| env.alias(key, var))
    }

    pub fn variable_for(&self, key: &str) -> String {
        self.aliases
            .get(key)
            .cloned()
            .unwrap_or_else(|| screaming_snake(key))
    }
}

impl ConfigSource for EnvConfig {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(self.variable_for(key)).ok()
    }
}

fn screaming_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev_lower = false;
    for c in key.chars() {
        if c == '-' || c == '.' || c == ' ' {
            out.push('_');
            prev_lower = false;
            continue;
        }
        if c.is_ascii_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        out.push(c.to_ascii_uppercase());
    }
    out
}

/// Ordered chain of sources; the first non-blank value wins.
#[derive(Clone, Default)]
pub struct LayeredConfig {
    layers: Vec<Arc<dyn ConfigSource>>,
}

impl LayeredConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(mut self, source: impl ConfigSource + 'static) -> Self {
        self.layers.push(Arc::new(source));
        self
    }
}

impl ConfigSource for LayeredConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.layers
            .iter()
            .filter_map(|layer| layer.get(key))
            .find(|value| !value.trim().is_empty())
    }
}

/// Read-only context shared by every node of one graph run.
///
/// Cloning is cheap; all clones observe the same cancellation signal.
#[derive(Clone)]
pub struct ProcessContext {
    config: Arc<dyn ConfigSource>,
    cancellation: CancellationToken,
    execution_id: Uuid,
}

impl std::fmt::Debug for ProcessContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessContext")
            .field("execution_id", &self.execution_id)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl ProcessContext {
    pub fn new(config: impl ConfigSource + 'static) -> Self {
        Self::from_shared(Arc::new(config))
    }

    pub fn from_shared(config: Arc<dyn ConfigSource>) -> Self {
        Self {
            config,
            cancellation: CancellationToken::new(),
            execution_id: Uuid::new_v4(),
        }
    }

    /// Replaces the run's cancellation token, e.g. with a child of a session token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_execution_id(mut self, execution_id: Uuid) -> Self {
        self.execution_id = execution_id;
        self
    }

    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    /// Resolves a required setting. Missing or blank values are a config error.
    pub fn get_config(&self, key: &str) -> Result<String, NodeError> {
        self.get_optional_config(key).ok_or_else(|| {
            NodeError::missing_config(key, format!("'{}' is not set", key))
        })
    }

    pub fn get_optional_config(&self, key: &str) -> Option<String> {
        self.config
            .get(key)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Signals every node sharing this context to stop. Irreversible.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn ensure_not_cancelled(&self) -> Result<(), NodeError> {
        if self.is_cancelled() {
            Err(NodeError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Runs `fut` until it finishes or the run is cancelled, whichever comes first.
    ///
    /// A cancellation that is already signalled wins without polling `fut`.
    pub async fn run_cancellable<F, T>(&self, fut: F) -> Result<T, NodeError>
    where
        F: Future<Output = Result<T, NodeError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(NodeError::Cancelled),
            result = fut => result,
        }
    }
}
