//! Chat provider trait definition

use crate::{ProviderReply, ProviderRequest, Result};
use async_trait::async_trait;

/// Trait for chat providers
///
/// One implementation exists per wire protocol (OpenAI-compatible chat
/// completions, Gemini `generateContent`). Implementations hold their
/// credentials and sampling defaults, so callers only pass the prompt and the
/// prior turns.
///
/// Implementations must be safe to share between concurrent calls.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send the request and wait for the reply
    ///
    /// Any transport, authentication, quota, or decoding failure is returned
    /// as an error; nothing is retried.
    async fn send(&self, request: &ProviderRequest) -> Result<ProviderReply>;

    /// Get the provider name (e.g., "openai", "gemini")
    fn name(&self) -> &str;

    /// Model identifier the provider sends requests to
    fn model(&self) -> &str;
}
