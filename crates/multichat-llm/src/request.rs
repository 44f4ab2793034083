//! Provider request and reply types

use crate::Turn;
use serde::{Deserialize, Serialize};

/// A single chat request: a new user prompt on top of prior turns
///
/// The request is immutable once built and is shared read-only by every
/// provider queried for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The new user turn
    pub prompt: String,

    /// Prior turns, oldest first (excludes `prompt`)
    pub history: Vec<Turn>,
}

impl ProviderRequest {
    /// Create a request with no history
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            history: Vec::new(),
        }
    }

    /// Create a builder for provider requests
    pub fn builder(prompt: impl Into<String>) -> ProviderRequestBuilder {
        ProviderRequestBuilder::new(prompt)
    }
}

/// Builder for ProviderRequest
pub struct ProviderRequestBuilder {
    prompt: String,
    history: Vec<Turn>,
}

impl ProviderRequestBuilder {
    /// Create a new builder
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            history: Vec::new(),
        }
    }

    /// Set the prior turns
    pub fn history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }

    /// Add a single prior turn
    pub fn add_turn(mut self, turn: Turn) -> Self {
        self.history.push(turn);
        self
    }

    /// Build the request
    pub fn build(self) -> ProviderRequest {
        ProviderRequest {
            prompt: self.prompt,
            history: self.history,
        }
    }
}

/// Successful response from a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderReply {
    /// Generated assistant text
    pub text: String,

    /// Model that produced the reply
    pub model: String,

    /// Token usage, when the provider reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt (history included)
    pub prompt_tokens: u32,

    /// Tokens generated
    pub completion_tokens: u32,

    /// Total tokens billed
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Build usage from prompt and completion counts
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}
