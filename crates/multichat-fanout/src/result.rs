//! Per-provider result records

use multichat_llm::ProviderReply;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Response text reported for providers without a usable handle
pub const UNAVAILABLE_TEXT: &str = "Model not available (check API key)";

/// Outcome of one provider in a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The provider replied
    Success,
    /// The call was made and failed
    Error,
    /// No call was made: the provider could not be resolved
    Unavailable,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Unavailable => "unavailable",
        })
    }
}

/// Result of one provider for one dispatch call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    /// Requested provider id
    pub provider_id: String,

    /// Model that answered (or was asked), when known
    pub model: Option<String>,

    /// Reply text, or a human-readable error line
    pub response_text: String,

    /// Outcome
    pub status: Status,

    /// Wall-clock duration of this provider's own call, unrounded
    pub elapsed_seconds: f64,

    /// Total tokens billed
    pub tokens_used: Option<u32>,

    /// Prompt tokens
    pub prompt_tokens: Option<u32>,

    /// Completion tokens
    pub completion_tokens: Option<u32>,

    /// Failure detail; always non-empty for `Error`
    pub error_detail: Option<String>,
}

impl ProviderResult {
    /// Build a success record from a provider reply
    pub fn success(provider_id: impl Into<String>, reply: ProviderReply, elapsed: f64) -> Self {
        Self {
            provider_id: provider_id.into(),
            model: Some(reply.model),
            response_text: reply.text,
            status: Status::Success,
            elapsed_seconds: elapsed.max(0.0),
            tokens_used: reply.usage.map(|u| u.total_tokens),
            prompt_tokens: reply.usage.map(|u| u.prompt_tokens),
            completion_tokens: reply.usage.map(|u| u.completion_tokens),
            error_detail: None,
        }
    }

    /// Build an error record for a call that was made and failed
    pub fn error(
        provider_id: impl Into<String>,
        model: Option<String>,
        detail: impl Into<String>,
        elapsed: f64,
    ) -> Self {
        let mut detail = detail.into();
        if detail.trim().is_empty() {
            detail = "unknown error".to_string();
        }

        Self {
            provider_id: provider_id.into(),
            model,
            response_text: format!("Error: {detail}"),
            status: Status::Error,
            elapsed_seconds: elapsed.max(0.0),
            tokens_used: None,
            prompt_tokens: None,
            completion_tokens: None,
            error_detail: Some(detail),
        }
    }

    /// Build a record for a provider that was never called
    pub fn unavailable(provider_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            model: None,
            response_text: UNAVAILABLE_TEXT.to_string(),
            status: Status::Unavailable,
            elapsed_seconds: 0.0,
            tokens_used: None,
            prompt_tokens: None,
            completion_tokens: None,
            error_detail: Some(reason.into()),
        }
    }

    /// Whether the provider replied
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Elapsed seconds rounded to 2 decimal places, for display
    pub fn elapsed_display(&self) -> f64 {
        (self.elapsed_seconds * 100.0).round() / 100.0
    }
}

/// All results of one dispatch call, keyed by provider id
///
/// Holds exactly one entry per requested provider. Iteration order is
/// unspecified; use [`DispatchResults::ordered`] for stable display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DispatchResults {
    results: HashMap<String, ProviderResult>,
}

impl DispatchResults {
    pub(crate) fn insert(&mut self, result: ProviderResult) {
        self.results.insert(result.provider_id.clone(), result);
    }

    /// Result for a provider id
    pub fn get(&self, provider_id: &str) -> Option<&ProviderResult> {
        self.results.get(provider_id)
    }

    /// Number of results
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether there are no results
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterate results in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = &ProviderResult> {
        self.results.values()
    }

    /// Successful results in unspecified order
    pub fn successes(&self) -> impl Iterator<Item = &ProviderResult> {
        self.iter().filter(|r| r.is_success())
    }

    /// Count results with the given status
    pub fn count(&self, status: Status) -> usize {
        self.iter().filter(|r| r.status == status).count()
    }

    /// Results ordered by `order`; ids not listed follow, sorted by id
    pub fn ordered(&self, order: &[String]) -> Vec<&ProviderResult> {
        let mut listed: Vec<&ProviderResult> =
            order.iter().filter_map(|id| self.results.get(id)).collect();

        let mut rest: Vec<&ProviderResult> = self
            .results
            .values()
            .filter(|r| !order.contains(&r.provider_id))
            .collect();
        rest.sort_by(|a, b| a.provider_id.cmp(&b.provider_id));

        listed.extend(rest);
        listed
    }

    /// Unwrap into the underlying map
    pub fn into_inner(self) -> HashMap<String, ProviderResult> {
        self.results
    }
}

impl IntoIterator for DispatchResults {
    type Item = (String, ProviderResult);
    type IntoIter = std::collections::hash_map::IntoIter<String, ProviderResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl FromIterator<ProviderResult> for DispatchResults {
    fn from_iter<T: IntoIterator<Item = ProviderResult>>(iter: T) -> Self {
        let mut results = Self::default();
        for result in iter {
            results.insert(result);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multichat_llm::TokenUsage;

    fn reply(text: &str) -> ProviderReply {
        ProviderReply {
            text: text.to_string(),
            model: "gpt-4".to_string(),
            usage: Some(TokenUsage::new(10, 5)),
        }
    }

    #[test]
    fn test_success_copies_usage() {
        let result = ProviderResult::success("openai", reply("hello"), 1.234_567);
        assert!(result.is_success());
        assert_eq!(result.response_text, "hello");
        assert_eq!(result.tokens_used, Some(15));
        assert_eq!(result.prompt_tokens, Some(10));
        assert_eq!(result.completion_tokens, Some(5));
        assert!(result.error_detail.is_none());
        assert!((result.elapsed_display() - 1.23).abs() < f64::EPSILON);
    }

    #[test]
    fn test_error_detail_never_empty() {
        let result = ProviderResult::error("llama", None, "  ", 0.5);
        assert_eq!(result.status, Status::Error);
        assert_eq!(result.error_detail.as_deref(), Some("unknown error"));
        assert_eq!(result.response_text, "Error: unknown error");
    }

    #[test]
    fn test_unavailable() {
        let result = ProviderResult::unavailable("gemini", "GOOGLE_API_KEY not set");
        assert_eq!(result.status, Status::Unavailable);
        assert_eq!(result.response_text, UNAVAILABLE_TEXT);
        assert!(result.elapsed_seconds.abs() < f64::EPSILON);
    }

    #[test]
    fn test_negative_elapsed_is_clamped() {
        let result = ProviderResult::error("x", None, "boom", -1.0);
        assert!(result.elapsed_seconds >= 0.0);
    }

    #[test]
    fn test_ordered() {
        let results: DispatchResults = vec![
            ProviderResult::unavailable("zeta", "n/a"),
            ProviderResult::unavailable("gemini", "n/a"),
            ProviderResult::unavailable("alpha", "n/a"),
            ProviderResult::unavailable("openai", "n/a"),
        ]
        .into_iter()
        .collect();

        let ids: Vec<&str> = results
            .ordered(&["openai".to_string(), "gemini".to_string()])
            .into_iter()
            .map(|r| r.provider_id.as_str())
            .collect();
        assert_eq!(ids, vec!["openai", "gemini", "alpha", "zeta"]);
    }

    #[test]
    fn test_serializes_as_map() {
        let results: DispatchResults =
            std::iter::once(ProviderResult::success("openai", reply("hi"), 0.1)).collect();
        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(json["openai"]["status"], "success");
        assert_eq!(json["openai"]["response_text"], "hi");
    }
}
