//! Bounded conversation history

use crate::policy::PrimaryPolicy;
use crate::result::DispatchResults;
use multichat_llm::Turn;
use tracing::debug;

/// Default number of turns kept
pub const DEFAULT_MAX_TURNS: usize = 20;

/// Conversation history capped at `max_turns`; the oldest turns drop first
#[derive(Debug, Clone)]
pub struct Conversation {
    turns: Vec<Turn>,
    max_turns: usize,
}

impl Conversation {
    /// Create an empty conversation keeping at most `max_turns` turns (minimum 1)
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: Vec::new(),
            max_turns: max_turns.max(1),
        }
    }

    /// Turns, oldest first
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns held
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the conversation is empty
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Capacity in turns
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Append a turn, dropping the oldest ones past capacity
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
        if self.turns.len() > self.max_turns {
            let excess = self.turns.len() - self.max_turns;
            self.turns.drain(..excess);
        }
    }

    /// Append a user turn
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Turn::user(content));
    }

    /// Append an assistant turn
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Turn::assistant(content));
    }

    /// Forget every turn
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Record a finished exchange
    ///
    /// Appends `prompt` as a user turn, then the primary result chosen by
    /// `policy` as the assistant turn. Returns the id of the provider whose
    /// reply was kept, if any.
    pub fn record_exchange(
        &mut self,
        prompt: &str,
        results: &DispatchResults,
        policy: &PrimaryPolicy,
    ) -> Option<String> {
        self.push_user(prompt);

        let primary = policy.select(results)?;
        debug!(provider = %primary.provider_id, "Keeping primary reply in history");
        self.push_assistant(primary.response_text.clone());
        Some(primary.provider_id.clone())
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderResult;
    use multichat_llm::{ProviderReply, Role};

    #[test]
    fn test_cap_drops_oldest() {
        let mut conversation = Conversation::new(3);
        for i in 0..5 {
            conversation.push_user(format!("m{i}"));
        }

        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.turns()[0].content, "m2");
        assert_eq!(conversation.turns()[2].content, "m4");
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut conversation = Conversation::new(0);
        conversation.push_user("a");
        conversation.push_user("b");
        assert_eq!(conversation.max_turns(), 1);
        assert_eq!(conversation.turns(), &[Turn::user("b")]);
    }

    #[test]
    fn test_record_exchange_with_primary() {
        let results: DispatchResults = vec![
            ProviderResult::error("openai", None, "quota exceeded", 0.2),
            ProviderResult::success(
                "llama",
                ProviderReply {
                    text: "Paris".into(),
                    model: "llama".into(),
                    usage: None,
                },
                0.3,
            ),
        ]
        .into_iter()
        .collect();

        let mut conversation = Conversation::default();
        let kept = conversation.record_exchange(
            "Capital of France?",
            &results,
            &PrimaryPolicy::first_success_in(["openai", "llama"]),
        );

        assert_eq!(kept.as_deref(), Some("llama"));
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.turns()[0].role, Role::User);
        assert_eq!(conversation.turns()[1], Turn::assistant("Paris"));
    }

    #[test]
    fn test_record_exchange_without_primary() {
        let results: DispatchResults =
            std::iter::once(ProviderResult::unavailable("gemini", "no key")).collect();

        let mut conversation = Conversation::default();
        let kept = conversation.record_exchange("hi", &results, &PrimaryPolicy::Fastest);

        assert!(kept.is_none());
        assert_eq!(conversation.turns(), &[Turn::user("hi")]);
    }

    #[test]
    fn test_clear() {
        let mut conversation = Conversation::default();
        conversation.push_user("a");
        conversation.push_assistant("b");
        conversation.clear();
        assert!(conversation.is_empty());
    }
}
