//! Google Gemini provider implementation
//!
//! Gemini's `generateContent` endpoint is used statelessly: prior turns are
//! inlined into a single text prompt instead of being sent as structured
//! history.
//! See: https://ai.google.dev/api/generate-content

use crate::{
    ChatProvider, ProviderError, ProviderReply, ProviderRequest, Result, TokenUsage, transcript,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Number of prior turns inlined into the prompt
pub const TRANSCRIPT_WINDOW: usize = 5;

/// Configuration for the Gemini provider
#[derive(Clone)]
pub struct GeminiConfig {
    /// Provider name reported in results
    pub name: String,
    /// Google AI Studio API key
    pub api_key: String,
    /// Base URL of the API
    pub api_base: String,
    /// Model identifier
    pub model: String,
    /// Sampling temperature; the service default applies when None
    pub temperature: Option<f32>,
    /// Maximum output tokens; the service default applies when None
    pub max_output_tokens: Option<u32>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// Create a config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            name: "gemini".to_string(),
            api_key: api_key.into(),
            api_base: GEMINI_API_BASE.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            temperature: None,
            max_output_tokens: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
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

    /// Set the maximum output length
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("name", &self.name)
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Google Gemini provider
#[derive(Debug)]
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Create a provider from a configuration
    pub fn with_config(config: GeminiConfig) -> Result<Self> {
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

    /// Create a provider with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(GeminiConfig::new(api_key))
    }

    /// Get the current configuration
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn build_request(&self, request: &ProviderRequest) -> GenerateContentRequest {
        let generation_config =
            if self.config.temperature.is_some() || self.config.max_output_tokens.is_some() {
                Some(GenerationConfig {
                    temperature: self.config.temperature,
                    max_output_tokens: self.config.max_output_tokens,
                })
            } else {
                None
            };

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(transcript(
                        &request.history,
                        &request.prompt,
                        TRANSCRIPT_WINDOW,
                    )),
                }],
            }],
            generation_config,
        }
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    #[instrument(
        skip(self, request),
        fields(provider = %self.config.name, model = %self.config.model, history = request.history.len())
    )]
    async fn send(&self, request: &ProviderRequest) -> Result<ProviderReply> {
        debug!("Sending request to Gemini API");

        let body = self.build_request(request);

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.config.api_base, self.config.model
            ))
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
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

        let gemini_response: GenerateContentResponse = response.json().await.map_err(|e| {
            ProviderError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        into_reply(gemini_response, &self.config.model)
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// Gemini wire types (camelCase on the wire)

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

fn into_reply(response: GenerateContentResponse, requested_model: &str) -> Result<ProviderReply> {
    let Some(content) = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
    else {
        let reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .map_or_else(
                || "No candidates in response".to_string(),
                |reason| format!("Prompt blocked: {reason}"),
            );
        return Err(ProviderError::UnexpectedResponse(reason));
    };

    // A candidate may split its text over several parts
    let text: String = content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.is_empty() {
        return Err(ProviderError::UnexpectedResponse(
            "Candidate has no text parts".to_string(),
        ));
    }

    let usage = response.usage_metadata.map(|u| TokenUsage {
        prompt_tokens: u.prompt_token_count,
        completion_tokens: u.candidates_token_count,
        total_tokens: u
            .total_token_count
            .unwrap_or(u.prompt_token_count.saturating_add(u.candidates_token_count)),
    });

    Ok(ProviderReply {
        text,
        model: response
            .model_version
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
        let provider = GeminiProvider::new("test-key").unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.model(), "gemini-2.5-flash");
    }

    #[test]
    fn test_missing_key() {
        assert!(GeminiProvider::new("").unwrap_err().is_configuration());
    }

    #[test]
    fn test_provider_debug_redacts_key() {
        let provider = GeminiProvider::new("AIza-secret-value").unwrap();
        let debug = format!("{provider:?}");
        assert!(!debug.contains("AIza-secret-value"));
        assert!(debug.contains("gemini-2.5-flash"));
    }

    #[test]
    fn test_history_is_inlined() {
        let provider = GeminiProvider::new("test-key").unwrap();
        let request = ProviderRequest::builder("And Rust?")
            .add_turn(Turn::user("Name a systems language"))
            .add_turn(Turn::assistant("C"))
            .build();

        let body = serde_json::to_value(provider.build_request(&request)).unwrap();
        assert_eq!(
            body["contents"][0]["parts"][0]["text"],
            "User: Name a systems language\nAssistant: C\n\nUser: And Rust?"
        );
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_generation_config_serialization() {
        let config = GeminiConfig::new("test-key")
            .with_temperature(0.2)
            .with_max_output_tokens(256);
        let provider = GeminiProvider::with_config(config).unwrap();

        let body = serde_json::to_value(provider.build_request(&ProviderRequest::new("hi"))).unwrap();
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
        assert!(body["generationConfig"]["temperature"].is_number());
    }

    #[test]
    fn test_parse_response_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "hel"}, {"text": "lo"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 2, "totalTokenCount": 6},
            "modelVersion": "gemini-2.5-flash-001"
        }))
        .unwrap();

        let reply = into_reply(response, "gemini-2.5-flash").unwrap();
        assert_eq!(reply.text, "hello");
        assert_eq!(reply.model, "gemini-2.5-flash-001");
        assert_eq!(reply.usage, Some(TokenUsage::new(4, 2)));
    }

    #[test]
    fn test_usage_total_saturates() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "ok"}]}}],
            "usageMetadata": {"promptTokenCount": u32::MAX, "candidatesTokenCount": 7}
        }))
        .unwrap();

        let usage = into_reply(response, "gemini-2.5-flash").unwrap().usage.unwrap();
        assert_eq!(usage.total_tokens, u32::MAX);
    }

    #[test]
    fn test_blocked_prompt() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();

        let err = into_reply(response, "gemini-2.5-flash").unwrap_err();
        assert!(err.to_string().contains("Prompt blocked: SAFETY"));
    }
}
