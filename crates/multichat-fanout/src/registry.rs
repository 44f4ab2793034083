//! Provider handle resolution from configuration

use multichat_llm::providers::{GeminiConfig, GeminiProvider, OpenAIConfig, OpenAIProvider};
use multichat_llm::{ChatProvider, ProviderError};
use multichat_utils::{ProviderKind, ProviderSettings, key_preview};
use std::sync::Arc;
use tracing::{debug, warn};

/// A configured provider id: either a usable handle or the reason there is none
#[derive(Clone)]
pub enum ProviderSlot {
    /// Handle ready to be called
    Ready(Arc<dyn ChatProvider>),
    /// No handle; the reason is reported in results
    Unavailable(String),
}

impl ProviderSlot {
    /// Resolve settings into a slot, never failing
    pub fn resolve(settings: &ProviderSettings) -> Self {
        match build_provider(settings) {
            Ok(provider) => Self::Ready(provider),
            Err(e) => {
                warn!(provider = %settings.id, error = %e, "Provider unavailable");
                Self::Unavailable(e.to_string())
            }
        }
    }

    /// Whether the slot holds a handle
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

impl std::fmt::Debug for ProviderSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(provider) => f
                .debug_tuple("Ready")
                .field(&provider.name())
                .field(&provider.model())
                .finish(),
            Self::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

/// Build a provider handle from its settings
///
/// Fails with [`ProviderError::ConfigurationError`] when no API key can be
/// found or the client cannot be constructed.
pub fn build_provider(
    settings: &ProviderSettings,
) -> multichat_llm::Result<Arc<dyn ChatProvider>> {
    let api_key = settings.resolve_api_key().ok_or_else(|| {
        ProviderError::ConfigurationError(format!("{} not set", settings.api_key_env))
    })?;

    debug!(
        provider = %settings.id,
        model = %settings.model,
        key = %key_preview(&api_key),
        "Building provider"
    );

    let provider: Arc<dyn ChatProvider> = match settings.kind {
        ProviderKind::OpenaiCompatible => {
            let mut config = OpenAIConfig::new(api_key)
                .with_name(&settings.id)
                .with_model(&settings.model)
                .with_timeout(settings.timeout_secs);
            if let Some(api_base) = &settings.api_base {
                config = config.with_api_base(api_base);
            }
            config.temperature = settings.temperature;
            config.max_tokens = settings.max_tokens;
            Arc::new(OpenAIProvider::with_config(config)?)
        }
        ProviderKind::Gemini => {
            let mut config = GeminiConfig::new(api_key)
                .with_name(&settings.id)
                .with_model(&settings.model)
                .with_timeout(settings.timeout_secs);
            if let Some(api_base) = &settings.api_base {
                config = config.with_api_base(api_base);
            }
            config.temperature = settings.temperature;
            config.max_output_tokens = settings.max_tokens;
            Arc::new(GeminiProvider::with_config(config)?)
        }
    };

    Ok(provider)
}
