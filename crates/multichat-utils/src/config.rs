//! Configuration management
//!
//! Provider settings come from an optional JSON file (camelCase keys) and
//! fall back to the built-in trio of demo providers. Credentials are never
//! stored in the file by default: each provider names the environment variable
//! holding its key, and `.env` is loaded into the environment first.
//!
//! # Example
//!
//! ```json
//! {
//!   "providers": [
//!     {
//!       "id": "openai",
//!       "displayName": "GPT-4 (OpenAI)",
//!       "kind": "openai_compatible",
//!       "model": "gpt-4",
//!       "apiKeyEnv": "OPENAI_API_KEY",
//!       "temperature": 0.7
//!     }
//!   ],
//!   "priority": ["openai"],
//!   "maxHistory": 20,
//!   "deadlineSecs": 45
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_HISTORY: usize = 20;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Config file is not valid JSON for [`AppConfig`]
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying parse error
        source: serde_json::Error,
    },

    /// Config parsed but is inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Wire protocol spoken by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI chat completions protocol (OpenAI, Groq, local servers)
    OpenaiCompatible,
    /// Google Gemini `generateContent`
    Gemini,
}

/// Settings for one configured provider
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    /// Identifier used in requests and results
    pub id: String,

    /// Human-readable name for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Wire protocol
    pub kind: ProviderKind,

    /// Model identifier
    pub model: String,

    /// Base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Inline API key; takes precedence over `api_key_env`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum output length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Per-request network timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_history() -> usize {
    DEFAULT_MAX_HISTORY
}

impl ProviderSettings {
    /// Create settings with default timeout and no sampling overrides
    pub fn new(
        id: impl Into<String>,
        kind: ProviderKind,
        model: impl Into<String>,
        api_key_env: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            kind,
            model: model.into(),
            api_base: None,
            api_key_env: api_key_env.into(),
            api_key: None,
            temperature: None,
            max_tokens: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set the display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set the base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set an inline API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum output length
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the network timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Display name, falling back to the id
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }

    /// Resolve the API key: inline key first, then the environment
    ///
    /// Blank values count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        let present = |key: &String| !key.trim().is_empty();

        self.api_key
            .clone()
            .filter(present)
            .or_else(|| std::env::var(&self.api_key_env).ok().filter(present))
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key_env", &self.api_key_env)
            .field("api_key", &self.api_key.as_deref().map(key_preview))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Configured providers, in display order
    pub providers: Vec<ProviderSettings>,

    /// Provider ids in the order their reply is preferred as the primary answer
    #[serde(default)]
    pub priority: Vec<String>,

    /// Maximum number of turns kept in a conversation
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Overall deadline for one round of provider calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            providers: vec![
                ProviderSettings::new(
                    "openai",
                    ProviderKind::OpenaiCompatible,
                    "gpt-4",
                    "OPENAI_API_KEY",
                )
                .with_display_name("GPT-4 (OpenAI)")
                .with_temperature(0.7),
                ProviderSettings::new(
                    "llama",
                    ProviderKind::OpenaiCompatible,
                    "llama-3.3-70b-versatile",
                    "GROQ_API_KEY",
                )
                .with_display_name("Llama 3.3 70B (Groq)")
                .with_api_base("https://api.groq.com/openai/v1")
                .with_temperature(0.7)
                .with_max_tokens(1024),
                ProviderSettings::new(
                    "gemini",
                    ProviderKind::Gemini,
                    "gemini-2.5-flash",
                    "GOOGLE_API_KEY",
                )
                .with_display_name("Gemini 2.5 Flash (Google)"),
            ],
            priority: vec!["openai".into(), "llama".into(), "gemini".into()],
            max_history: DEFAULT_MAX_HISTORY,
            deadline_secs: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: AppConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load `.env`, then the given config file or the built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(env_path) => debug!(path = %env_path.display(), "Loaded .env file"),
            Err(e) => debug!("No .env file loaded: {e}"),
        }

        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Check ids are unique and limits are usable
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for provider in &self.providers {
            if provider.id.trim().is_empty() {
                return Err(ConfigError::Invalid("provider id must not be empty".into()));
            }
            if !seen.insert(provider.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate provider id '{}'",
                    provider.id
                )));
            }
            if provider.model.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "provider '{}' has no model",
                    provider.id
                )));
            }
        }

        if self.max_history == 0 {
            return Err(ConfigError::Invalid(
                "maxHistory must be greater than 0".into(),
            ));
        }

        if self.deadline_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "deadlineSecs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Look up a provider by id
    pub fn provider(&self, id: &str) -> Option<&ProviderSettings> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// Configured provider ids, in order
    pub fn provider_ids(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.id.clone()).collect()
    }

    /// Overall dispatch deadline, if any
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

/// Mask an API key for display: `sk-proj...wxyz`, or `***` when short
pub fn key_preview(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 11 {
        let head: String = chars[..7].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}
