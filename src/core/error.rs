use thiserror::Error;

use crate::core::value::PortId;

/// Boxed cause attached to an [`NodeError::ExternalService`] failure.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a single `process` invocation.
///
/// The four variants are deliberately distinct so an executor or editor can
/// present different remedies: fix the graph, set a credential, retry later,
/// or simply acknowledge a stop.
#[derive(Debug, Error)]
pub enum NodeError {
    /// A required input is missing or empty, a value's type disagrees with
    /// its port, or the node's configuration record is malformed.
    #[error("Validation error{}: {message}", port_suffix(.port))]
    Validation {
        port: Option<PortId>,
        message: String,
    },

    /// Required configuration or credentials could not be resolved.
    #[error("Missing configuration '{key}': {message}")]
    Config { key: String, message: String },

    /// The wrapped remote call failed.
    #[error("External service error: {message}")]
    ExternalService {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Processing was aborted through the run's cancellation signal.
    #[error("Processing cancelled")]
    Cancelled,
}

fn port_suffix(port: &Option<PortId>) -> String {
    match port {
        Some(port) => format!(" on port '{}'", port),
        None => String::new(),
    }
}

/// Discriminant of [`NodeError`], for callers that only need to branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeErrorKind {
    Validation,
    Config,
    ExternalService,
    Cancelled,
}

impl NodeError {
    /// A validation failure not tied to a particular port.
    pub fn validation(message: impl Into<String>) -> Self {
        NodeError::Validation {
            port: None,
            message: message.into(),
        }
    }

    /// A validation failure on the given port.
    pub fn validation_on(port: impl Into<PortId>, message: impl Into<String>) -> Self {
        NodeError::Validation {
            port: Some(port.into()),
            message: message.into(),
        }
    }

    pub fn missing_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        NodeError::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn external(message: impl Into<String>) -> Self {
        NodeError::ExternalService {
            message: message.into(),
            source: None,
        }
    }

    pub fn external_with_source(
        message: impl Into<String>,
        source: impl Into<BoxedSource>,
    ) -> Self {
        NodeError::ExternalService {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn kind(&self) -> NodeErrorKind {
        match self {
            NodeError::Validation { .. } => NodeErrorKind::Validation,
            NodeError::Config { .. } => NodeErrorKind::Config,
            NodeError::ExternalService { .. } => NodeErrorKind::ExternalService,
            NodeError::Cancelled => NodeErrorKind::Cancelled,
        }
    }

    /// The port a validation failure refers to, if any.
    pub fn port(&self) -> Option<&PortId> {
        match self {
            NodeError::Validation { port, .. } => port.as_ref(),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, NodeError::Cancelled)
    }
}

#[cfg(feature = "assemblyai")]
impl From<reqwest::Error> for NodeError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_decode() {
            "malformed response body".to_string()
        } else {
            format!("HTTP request error: {}", err)
        };
        NodeError::external_with_source(message, err)
    }
}

/// Failures while building or querying a [`NodeRegistry`](crate::NodeRegistry).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Node type '{0}' is already registered")]
    DuplicateType(String),

    #[error("Plugin '{0}' is already registered")]
    DuplicatePlugin(String),

    #[error("Implementation declares type '{declared}' but create() returned '{created}'")]
    TypeMismatch { declared: String, created: String },

    #[error("Node type '{0}' is not registered")]
    UnknownType(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_names_port() {
        let err = NodeError::validation_on("topic", "required input is missing");
        assert_eq!(
            err.to_string(),
            "Validation error on port 'topic': required input is missing"
        );
        assert_eq!(err.port().map(|p| p.as_str()), Some("topic"));

        let err = NodeError::validation("bad data");
        assert_eq!(err.to_string(), "Validation error: bad data");
        assert!(err.port().is_none());
    }

    #[test]
    fn test_kinds_are_distinct() {
        assert_eq!(
            NodeError::missing_config("apiKey", "not set").kind(),
            NodeErrorKind::Config
        );
        assert_eq!(NodeError::external("boom").kind(), NodeErrorKind::ExternalService);
        assert_eq!(NodeError::Cancelled.kind(), NodeErrorKind::Cancelled);
        assert!(NodeError::Cancelled.is_cancelled());
    }

    #[test]
    fn test_external_keeps_source() {
        use std::error::Error;

        let io = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
        let err = NodeError::external_with_source("upload failed", io);
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "External service error: upload failed");
    }
}
