//! Error types for provider calls

use thiserror::Error;

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur while building a provider or calling it
///
/// `ConfigurationError` is raised at construction time (missing credential,
/// client build failure). Everything else is a remote-call failure.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Invalid API key or authentication failed
    #[error("Invalid API key or authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit or quota exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl ProviderError {
    /// Map a non-success HTTP status and its body to an error
    pub fn from_status(status: reqwest::StatusCode, body: String, model: &str) -> Self {
        match status.as_u16() {
            401 | 403 => Self::AuthenticationFailed(body),
            429 => Self::RateLimitExceeded(body),
            400 => Self::InvalidRequest(body),
            404 => Self::ModelNotFound(model.to_string()),
            _ => Self::RequestFailed(format!("HTTP {status}: {body}")),
        }
    }

    /// Whether this error happened while constructing a provider
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::ConfigurationError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_mapping() {
        let err = ProviderError::from_status(StatusCode::UNAUTHORIZED, "bad key".into(), "gpt-4");
        assert!(matches!(err, ProviderError::AuthenticationFailed(_)));

        let err = ProviderError::from_status(StatusCode::FORBIDDEN, "denied".into(), "gpt-4");
        assert!(matches!(err, ProviderError::AuthenticationFailed(_)));

        let err =
            ProviderError::from_status(StatusCode::TOO_MANY_REQUESTS, "quota".into(), "gpt-4");
        assert!(matches!(err, ProviderError::RateLimitExceeded(ref m) if m == "quota"));

        let err = ProviderError::from_status(StatusCode::NOT_FOUND, String::new(), "gpt-9");
        assert!(matches!(err, ProviderError::ModelNotFound(ref m) if m == "gpt-9"));

        let err = ProviderError::from_status(StatusCode::BAD_GATEWAY, "upstream".into(), "gpt-4");
        assert_eq!(
            err.to_string(),
            "API request failed: HTTP 502 Bad Gateway: upstream"
        );
    }

    #[test]
    fn test_is_configuration() {
        assert!(ProviderError::ConfigurationError("missing key".into()).is_configuration());
        assert!(!ProviderError::InvalidRequest("x".into()).is_configuration());
    }
}
