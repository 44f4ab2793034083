//! Concrete chat provider implementations
//!
//! This module contains implementations of the ChatProvider trait, one per
//! wire protocol.

pub mod gemini;
pub mod openai;

pub use gemini::{GeminiConfig, GeminiProvider};
pub use openai::{OpenAIConfig, OpenAIProvider};
