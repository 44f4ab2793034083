//! OpenAI-compatible chat completions provider
//!
//! This module implements the ChatProvider trait for any service speaking the
//! OpenAI chat completions protocol. The same implementation serves OpenAI
//! itself and Groq-hosted Llama models, which differ only in base URL, model,
//! and sampling defaults.
//! See: https://platform.openai.com/docs/api-reference/chat
//!
//! # Examples
//!
//! ```no_run
//! use multichat_llm::{ChatProvider, ProviderRequest};
//! use multichat_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = OpenAIProvider::with_config(OpenAIConfig::groq("gsk-..."))?;
//!
//!     let reply = provider.send(&ProviderRequest::new("Hello!")).await?;
//!     println!("{}", reply.text);
//!
//!     Ok(())
//! }
//! ```

use crate::{ChatProvider, ProviderError, ProviderReply, ProviderRequest, Result, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Configuration for an OpenAI-compatible provider
#[derive(Clone)]
pub struct OpenAIConfig {
    /// Provider name reported in results (e.g. "openai", "llama")
    pub name: String,

    /// API key for bearer authentication
    pub api_key: String,

    /// Base URL of the API (default: "https://api.openai.com/v1")
    pub api_base: String,

    /// Model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Maximum completion length; omitted from the request when None
    pub max_tokens: Option<u32>,

    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    /// Create an OpenAI config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            name: "openai".to_string(),
            api_key: api_key.into(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            temperature: Some(DEFAULT_TEMPERATURE),
            max_tokens: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Config for Llama models served by Groq's OpenAI-compatible endpoint
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self {
            name: "llama".to_string(),
            api_base: GROQ_API_BASE.to_string(),
            model: DEFAULT_GROQ_MODEL.to_string(),
            max_tokens: Some(1024),
            ..Self::new(api_key)
        }
    }

    /// Set the provider name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum completion length
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("name", &self.name)
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// OpenAI-compatible provider
#[derive(Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a provider from a configuration
    ///
    /// Fails with a configuration error when the API key is empty or the HTTP
    /// client cannot be built.
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::ConfigurationError(format!(
                "no API key configured for provider '{}'",
                config.name
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ProviderError::ConfigurationError(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// Create an OpenAI provider with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn build_request(&self, request: &ProviderRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: self.config.model.clone(),
            messages: build_openai_messages(request),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAIProvider {
    #[instrument(
        skip(self, request),
        fields(provider = %self.config.name, model = %self.config.model, history = request.history.len())
    )]
    async fn send(&self, request: &ProviderRequest) -> Result<ProviderReply> {
        debug!("Sending request to {}", self.config.api_base);

        let openai_request = self.build_request(request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&openai_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(ProviderError::from_status(
                status,
                error_text,
                &self.config.model,
            ));
        }

        let openai_response: OpenAIResponse = response.json().await.map_err(|e| {
            ProviderError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        let reply = into_reply(openai_response, &self.config.model)?;

        debug!(
            tokens = reply.usage.map(|u| u.total_tokens),
            "Received response"
        );

        Ok(reply)
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: Option<u32>,
}

// ============================================================================
// Conversion functions
// ============================================================================

/// History turns in order, then the prompt as the final user message
fn build_openai_messages(request: &ProviderRequest) -> Vec<OpenAIMessage> {
    request
        .history
        .iter()
        .map(|turn| OpenAIMessage {
            role: turn.role.as_str(),
            content: turn.content.clone(),
        })
        .chain(std::iter::once(OpenAIMessage {
            role: "user",
            content: request.prompt.clone(),
        }))
        .collect()
}

fn into_reply(response: OpenAIResponse, requested_model: &str) -> Result<ProviderReply> {
    // OpenAI can return multiple choices; only the first is used
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::UnexpectedResponse("No choices in response".to_string()))?;

    let text = choice.message.content.ok_or_else(|| {
        ProviderError::UnexpectedResponse("Response message has no content".to_string())
    })?;

    let usage = response.usage.map(|u| TokenUsage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u
            .total_tokens
            .unwrap_or(u.prompt_tokens.saturating_add(u.completion_tokens)),
    });

    Ok(ProviderReply {
        text,
        model: response
            .model
            .unwrap_or_else(|| requested_model.to_string()),
        usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Turn;
    use serde_json::json;

    #[test]
    fn test_provider_creation() {
        let provider = OpenAIProvider::new("test-key").unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "gpt-4");
        assert_eq!(provider.config().api_base, "https://api.openai.com/v1");
        assert_eq!(provider.config().max_tokens, None);
    }

    #[test]
    fn test_groq_preset() {
        let provider = OpenAIProvider::with_config(OpenAIConfig::groq("gsk-test")).unwrap();
        assert_eq!(provider.name(), "llama");
        assert_eq!(provider.model(), "llama-3.3-70b-versatile");
        assert_eq!(provider.config().api_base, "https://api.groq.com/openai/v1");
        assert_eq!(provider.config().max_tokens, Some(1024));
        assert_eq!(provider.config().temperature, Some(0.7));
    }

    #[test]
    fn test_empty_key_is_configuration_error() {
        let result = OpenAIProvider::new("   ");
        assert!(matches!(result, Err(ProviderError::ConfigurationError(_))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = OpenAIConfig::new("sk-secret-value");
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret-value"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_messages_put_prompt_last() {
        let request = ProviderRequest::builder("What about now?")
            .add_turn(Turn::user("Hi"))
            .add_turn(Turn::assistant("Hello"))
            .build();

        let messages = build_openai_messages(&request);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(
            messages[2],
            OpenAIMessage {
                role: "user",
                content: "What about now?".to_string()
            }
        );
    }

    #[test]
    fn test_request_serialization_skips_unset_max_tokens() {
        let provider = OpenAIProvider::new("test-key").unwrap();
        let body = serde_json::to_value(provider.build_request(&ProviderRequest::new("hi"))).unwrap();

        assert_eq!(body["model"], "gpt-4");
        assert!(body.get("max_tokens").is_none());
        assert_eq!(body["messages"][0], json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_parse_response_with_usage() {
        let response: OpenAIResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "model": "gpt-4-0613",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "hello"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }))
        .unwrap();

        let reply = into_reply(response, "gpt-4").unwrap();
        assert_eq!(reply.text, "hello");
        assert_eq!(reply.model, "gpt-4-0613");
        assert_eq!(reply.usage, Some(TokenUsage::new(12, 3)));
    }

    #[test]
    fn test_parse_response_without_usage_or_model() {
        let response: OpenAIResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "hi"}}]
        }))
        .unwrap();

        let reply = into_reply(response, "llama-3.3-70b-versatile").unwrap();
        assert_eq!(reply.model, "llama-3.3-70b-versatile");
        assert!(reply.usage.is_none());
    }

    #[test]
    fn test_parse_response_usage_total_saturates() {
        let response: OpenAIResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "hi"}}],
            "usage": {"prompt_tokens": u32::MAX, "completion_tokens": 1}
        }))
        .unwrap();

        let usage = into_reply(response, "gpt-4").unwrap().usage.unwrap();
        assert_eq!(usage.total_tokens, u32::MAX);
    }

    #[test]
    fn test_parse_response_without_choices() {
        let response: OpenAIResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(
            into_reply(response, "gpt-4"),
            Err(ProviderError::UnexpectedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        let config = OpenAIConfig::new("test-key")
            .with_api_base("http://127.0.0.1:1/v1")
            .with_timeout(5);
        let provider = OpenAIProvider::with_config(config).unwrap();

        let result = provider.send(&ProviderRequest::new("hi")).await;
        tokio_test::assert_err!(&result);
        assert!(matches!(result, Err(ProviderError::HttpError(_))));
    }
}
