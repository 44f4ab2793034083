//! Error types for dispatch

use thiserror::Error;

/// Result type for dispatch operations
pub type Result<T> = std::result::Result<T, DispatchError>;

/// A requested provider that could not be used, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnavailableProvider {
    /// Requested provider id
    pub provider_id: String,
    /// Why no handle exists for it
    pub reason: String,
}

/// Errors that fail a whole dispatch call
///
/// Per-provider failures never show up here; they are reported as
/// [`ProviderResult`](crate::ProviderResult)s instead.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// None of the requested providers could be resolved
    #[error("No providers available: {}", summarize(.reasons))]
    TotalUnavailable {
        /// One entry per requested provider
        reasons: Vec<UnavailableProvider>,
    },

    /// The prompt was empty or whitespace
    #[error("Prompt must not be empty")]
    EmptyPrompt,
}

fn summarize(reasons: &[UnavailableProvider]) -> String {
    if reasons.is_empty() {
        return "no providers configured".to_string();
    }
    reasons
        .iter()
        .map(|r| format!("{} ({})", r.provider_id, r.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_unavailable_message() {
        let err = DispatchError::TotalUnavailable {
            reasons: vec![
                UnavailableProvider {
                    provider_id: "openai".into(),
                    reason: "OPENAI_API_KEY not set".into(),
                },
                UnavailableProvider {
                    provider_id: "gemini".into(),
                    reason: "GOOGLE_API_KEY not set".into(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "No providers available: openai (OPENAI_API_KEY not set), gemini (GOOGLE_API_KEY not set)"
        );
    }

    #[test]
    fn test_total_unavailable_without_providers() {
        let err = DispatchError::TotalUnavailable { reasons: vec![] };
        assert_eq!(
            err.to_string(),
            "No providers available: no providers configured"
        );
    }
}
