//! Primary response selection
//!
//! A dispatch returns one result per provider with no ordering. Callers that
//! need a single answer, for example to continue a conversation, choose one
//! with a [`PrimaryPolicy`].

use crate::result::{DispatchResults, ProviderResult};

/// Rule for picking the primary result of a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryPolicy {
    /// First successful result walking this priority list
    FirstSuccessIn(Vec<String>),
    /// Successful result with the shortest elapsed time (ties by provider id)
    Fastest,
    /// Never pick a primary
    NoPrimary,
}

impl PrimaryPolicy {
    /// Priority-list policy
    pub fn first_success_in<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::FirstSuccessIn(ids.into_iter().map(Into::into).collect())
    }

    /// Apply the policy
    pub fn select<'a>(&self, results: &'a DispatchResults) -> Option<&'a ProviderResult> {
        match self {
            Self::FirstSuccessIn(priority) => priority
                .iter()
                .filter_map(|id| results.get(id))
                .find(|r| r.is_success()),
            Self::Fastest => results.successes().min_by(|a, b| {
                a.elapsed_seconds
                    .total_cmp(&b.elapsed_seconds)
                    .then_with(|| a.provider_id.cmp(&b.provider_id))
            }),
            Self::NoPrimary => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multichat_llm::ProviderReply;

    fn ok(id: &str, elapsed: f64) -> ProviderResult {
        ProviderResult::success(
            id,
            ProviderReply {
                text: format!("from {id}"),
                model: "m".into(),
                usage: None,
            },
            elapsed,
        )
    }

    fn sample() -> DispatchResults {
        vec![
            ok("gemini", 0.4),
            ProviderResult::error("openai", None, "quota", 0.1),
            ok("llama", 0.9),
            ProviderResult::unavailable("claude", "no key"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_first_success_skips_failures() {
        let results = sample();
        let policy = PrimaryPolicy::first_success_in(["openai", "llama", "gemini"]);
        let primary = policy.select(&results).unwrap();
        assert_eq!(primary.provider_id, "llama");
    }

    #[test]
    fn test_first_success_ignores_unlisted() {
        let policy = PrimaryPolicy::first_success_in(["openai", "claude"]);
        assert!(policy.select(&sample()).is_none());
    }

    #[test]
    fn test_fastest_success() {
        let results = sample();
        let primary = PrimaryPolicy::Fastest.select(&results).unwrap();
        assert_eq!(primary.provider_id, "gemini");
    }

    #[test]
    fn test_fastest_tie_breaks_by_id() {
        let results: DispatchResults = vec![ok("b", 0.5), ok("a", 0.5)].into_iter().collect();
        let primary = PrimaryPolicy::Fastest.select(&results).unwrap();
        assert_eq!(primary.provider_id, "a");
    }

    #[test]
    fn test_no_primary() {
        assert!(PrimaryPolicy::NoPrimary.select(&sample()).is_none());
    }
}
