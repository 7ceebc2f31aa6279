//! AssemblyAI LeMUR HTTP client
//!
//! The remote API is reached through the [`LemurService`] trait so nodes can
//! be exercised against a test double; [`AssemblyAiClient`] is the real
//! implementation on top of `reqwest`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::context::ProcessContext;
use crate::core::error::NodeError;

/// Public AssemblyAI API host.
pub const DEFAULT_BASE_URL: &str = "https://api.assemblyai.com";

/// Config key holding the AssemblyAI API key.
pub const API_KEY_CONFIG: &str = "assemblyAiApiKey";

/// Optional config key overriding [`DEFAULT_BASE_URL`].
pub const BASE_URL_CONFIG: &str = "assemblyAiBaseUrl";

/// Connection settings for one LeMUR call, resolved per invocation.
#[derive(Clone)]
pub struct AssemblyAiConfig {
    /// API key sent in the `authorization` header
    pub api_key: String,
    /// Base URL (default: https://api.assemblyai.com)
    pub base_url: String,
    /// Upper bound on a single request
    pub timeout: Duration,
}

impl Default for AssemblyAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl fmt::Debug for AssemblyAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssemblyAiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AssemblyAiConfig {
    /// Resolves the key (required) and base URL (optional) from `context`.
    pub fn from_context(context: &ProcessContext) -> Result<Self, NodeError> {
        let api_key = context.get_config(API_KEY_CONFIG).map_err(|_| {
            NodeError::missing_config(API_KEY_CONFIG, "AssemblyAI API key not set.")
        })?;

        let mut config = Self {
            api_key,
            ..Default::default()
        };
        if let Some(base_url) = context.get_optional_config(BASE_URL_CONFIG) {
            config.base_url = base_url;
        }
        Ok(config)
    }
}

/// The LeMUR generation endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LemurEndpoint {
    ActionItems,
    Summary,
    Task,
    QuestionAnswer,
}

impl LemurEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            LemurEndpoint::ActionItems => "action-items",
            LemurEndpoint::Summary => "summary",
            LemurEndpoint::Task => "task",
            LemurEndpoint::QuestionAnswer => "question-answer",
        }
    }
}

impl fmt::Display for LemurEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// One question of a question-answer request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LemurQuestion {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_format: Option<String>,
}

/// Request body shared by every LeMUR endpoint; unused fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LemurRequest {
    pub transcript_ids: Vec<String>,
    pub final_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<LemurQuestion>>,
}

/// Token accounting reported by LeMUR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LemurUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Response of a LeMUR endpoint.
///
/// `response` is a string for most endpoints and an array of
/// `{question, answer}` objects for question-answer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LemurResponse {
    pub request_id: String,
    pub response: serde_json::Value,
    #[serde(default)]
    pub usage: Option<LemurUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// The remote LeMUR API as seen by the nodes.
#[async_trait]
pub trait LemurService: Send + Sync + 'static {
    async fn generate(
        &self,
        config: &AssemblyAiConfig,
        endpoint: LemurEndpoint,
        request: &LemurRequest,
    ) -> Result<LemurResponse, NodeError>;
}

/// LeMUR over HTTPS.
#[derive(Clone, Default)]
pub struct AssemblyAiClient {
    http: reqwest::Client,
}

impl AssemblyAiClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses an existing `reqwest` client (connection pool, proxy settings).
    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl LemurService for AssemblyAiClient {
    async fn generate(
        &self,
        config: &AssemblyAiConfig,
        endpoint: LemurEndpoint,
        request: &LemurRequest,
    ) -> Result<LemurResponse, NodeError> {
        let url = format!(
            "{}/lemur/v3/generate/{}",
            config.base_url.trim_end_matches('/'),
            endpoint.path()
        );

        log::debug!(
            "LeMUR {} request for {} transcript(s)",
            endpoint,
            request.transcript_ids.len()
        );

        let response = self
            .http
            .post(&url)
            .header("authorization", &config.api_key)
            .timeout(config.timeout)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorBody>(&error_text)
                .map(|body| body.error)
                .unwrap_or(error_text);
            return Err(NodeError::external(format!(
                "LeMUR {} failed with HTTP {}: {}",
                endpoint, status, detail
            )));
        }

        let lemur_response: LemurResponse = response.json().await?;
        Ok(lemur_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::MapConfig;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> AssemblyAiConfig {
        AssemblyAiConfig {
            api_key: "test-key".to_string(),
            base_url: server.uri(),
            ..Default::default()
        }
    }

    #[test]
    fn test_request_omits_unused_fields() {
        let request = LemurRequest {
            transcript_ids: vec!["t1".to_string()],
            final_model: "default".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({ "transcript_ids": ["t1"], "final_model": "default" }));
    }

    #[test]
    fn test_config_from_context() {
        let ctx = ProcessContext::new(
            MapConfig::new()
                .with(API_KEY_CONFIG, "k")
                .with(BASE_URL_CONFIG, "http://localhost:9999"),
        );
        let config = AssemblyAiConfig::from_context(&ctx).unwrap();
        assert_eq!(config.api_key, "k");
        assert_eq!(config.base_url, "http://localhost:9999");
        assert!(!format!("{:?}", config).contains("\"k\""));

        let err =
            AssemblyAiConfig::from_context(&ProcessContext::new(MapConfig::new())).unwrap_err();
        assert!(matches!(err, NodeError::Config { ref key, .. } if key == API_KEY_CONFIG));
    }

    #[tokio::test]
    async fn test_generate_posts_to_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/lemur/v3/generate/action-items"))
            .and(header("authorization", "test-key"))
            .and(body_partial_json(json!({ "transcript_ids": ["t1"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "request_id": "req-1",
                "response": "- follow up with finance",
                "usage": { "input_tokens": 10, "output_tokens": 5 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = LemurRequest {
            transcript_ids: vec!["t1".to_string()],
            final_model: "default".to_string(),
            ..Default::default()
        };
        let response = AssemblyAiClient::new()
            .generate(&config_for(&server), LemurEndpoint::ActionItems, &request)
            .await
            .unwrap();

        assert_eq!(response.request_id, "req-1");
        assert_eq!(response.response, json!("- follow up with finance"));
        assert_eq!(response.usage.unwrap().output_tokens, 5);
    }

    #[tokio::test]
    async fn test_http_error_maps_to_external_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid API key" })),
            )
            .mount(&server)
            .await;

        let err = AssemblyAiClient::new()
            .generate(&config_for(&server), LemurEndpoint::Summary, &LemurRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, NodeError::ExternalService { .. }));
        assert!(err.to_string().contains("Invalid API key"));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_malformed_body_maps_to_external_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = AssemblyAiClient::new()
            .generate(&config_for(&server), LemurEndpoint::Task, &LemurRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::ExternalService { .. }));
    }
}
