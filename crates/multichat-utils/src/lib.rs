//! Shared utilities for multichat
//!
//! This crate provides common functionality used across the multichat
//! workspace: logging setup and provider configuration.

pub mod config;
pub mod logging;

pub use config::{AppConfig, ConfigError, ProviderKind, ProviderSettings, key_preview};
pub use logging::{init_tracing, init_tracing_json};
