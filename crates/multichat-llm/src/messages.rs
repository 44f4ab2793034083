//! Conversation turn types
//!
//! A conversation is an ordered list of [`Turn`]s, each tagged with the
//! [`Role`] of its author. Providers that accept structured history get the
//! turns as-is; providers that do not get an inlined [`transcript`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Assistant message
    Assistant,
}

impl Role {
    /// Wire name of the role ("user" / "assistant")
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Speaker label used in inlined transcripts
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who wrote the turn
    pub role: Role,

    /// Turn text
    pub content: String,
}

impl Turn {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Render the last `window` turns of `history` followed by `prompt` as plain text
///
/// ```
/// use multichat_llm::{Turn, transcript};
///
/// let history = vec![Turn::user("Hi"), Turn::assistant("Hello!")];
/// assert_eq!(
///     transcript(&history, "How are you?", 5),
///     "User: Hi\nAssistant: Hello!\n\nUser: How are you?"
/// );
/// ```
pub fn transcript(history: &[Turn], prompt: &str, window: usize) -> String {
    if history.is_empty() || window == 0 {
        return prompt.to_string();
    }

    let start = history.len().saturating_sub(window);
    let context = history[start..]
        .iter()
        .map(|turn| format!("{}: {}", turn.role.label(), turn.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!("{context}\n\n{}: {prompt}", Role::User.label())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_constructors() {
        let turn = Turn::user("Hello");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "Hello");

        let turn = Turn::assistant("Hi there");
        assert_eq!(turn.role, Role::Assistant);
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Turn::assistant("ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);
    }

    #[test]
    fn test_transcript_without_history_is_prompt() {
        assert_eq!(transcript(&[], "just this", 5), "just this");
    }

    #[test]
    fn test_transcript_keeps_only_window() {
        let history: Vec<Turn> = (0..8)
            .map(|i| {
                if i % 2 == 0 {
                    Turn::user(format!("q{i}"))
                } else {
                    Turn::assistant(format!("a{i}"))
                }
            })
            .collect();

        let text = transcript(&history, "next", 5);
        assert!(!text.contains("q2"));
        assert!(text.starts_with("Assistant: a3\nUser: q4"));
        assert!(text.ends_with("Assistant: a7\n\nUser: next"));
    }
}
