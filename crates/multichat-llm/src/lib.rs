//! Chat provider abstraction layer for multichat
//!
//! This crate provides provider-agnostic types for sending one chat turn to
//! a hosted completion service. It includes:
//!
//! - Turn types for conversation history
//! - Request/reply types with token usage
//! - The [`ChatProvider`] trait
//! - Concrete providers for OpenAI-compatible APIs and Google Gemini

pub mod error;
pub mod messages;
pub mod provider;
pub mod providers;
pub mod request;

// Re-export main types
pub use error::{ProviderError, Result};
pub use messages::{Role, Turn, transcript};
pub use provider::ChatProvider;
pub use request::{ProviderReply, ProviderRequest, TokenUsage};
