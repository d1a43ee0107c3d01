//! Turn model shared by the window and transcript stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Speaker role for a turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User-authored question.
    User,
    /// Assistant-authored answer.
    Assistant,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in the conversation. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_count: Option<usize>,
}

impl Turn {
    /// Create a turn stamped now, with an estimated token count.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        let content = content.into();
        let token_count = Some(estimate_tokens(&content));
        Self {
            role,
            content,
            created_at: Utc::now(),
            token_count,
        }
    }

    /// Speaker role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Message text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Estimated token count, when known.
    pub fn token_count(&self) -> Option<usize> {
        self.token_count
    }
}

/// A user question followed by the assistant answer to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnPair {
    /// User turn.
    pub user: Turn,
    /// Assistant turn.
    pub assistant: Turn,
}

impl TurnPair {
    /// Build a pair from question and answer text.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            user: Turn::new(Role::User, question),
            assistant: Turn::new(Role::Assistant, answer),
        }
    }

    /// Question text.
    pub fn question(&self) -> &str {
        self.user.content()
    }

    /// Answer text.
    pub fn answer(&self) -> &str {
        self.assistant.content()
    }

    /// Combined character length of both turns.
    pub fn char_len(&self) -> usize {
        self.user.content().chars().count() + self.assistant.content().chars().count()
    }

    /// Rebuild pairs from a flat turn list, skipping turns that do not form a
    /// user→assistant pair.
    pub fn from_turns(turns: impl IntoIterator<Item = Turn>) -> Vec<TurnPair> {
        let mut pairs = Vec::new();
        let mut pending_user: Option<Turn> = None;
        for turn in turns {
            match turn.role() {
                Role::User => pending_user = Some(turn),
                Role::Assistant => {
                    if let Some(user) = pending_user.take() {
                        pairs.push(TurnPair {
                            user,
                            assistant: turn,
                        });
                    }
                }
            }
        }
        pairs
    }
}

/// Rough token estimate: one token per four characters, rounded up.
pub fn estimate_tokens(content: &str) -> usize {
    content.chars().count().div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::{Role, Turn, TurnPair, estimate_tokens};
    use pretty_assertions::assert_eq;

    #[test]
    fn turn_carries_token_estimate() {
        let turn = Turn::new(Role::User, "hello");
        assert_eq!(turn.token_count(), Some(2));
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
    }

    #[test]
    fn from_turns_drops_orphans() {
        let turns = vec![
            Turn::new(Role::Assistant, "orphan answer"),
            Turn::new(Role::User, "Q1"),
            Turn::new(Role::Assistant, "A1"),
            Turn::new(Role::User, "dangling"),
            Turn::new(Role::User, "Q2"),
            Turn::new(Role::Assistant, "A2"),
            Turn::new(Role::User, "unanswered"),
        ];
        let pairs = TurnPair::from_turns(turns);
        let flat: Vec<(&str, &str)> = pairs
            .iter()
            .map(|pair| (pair.question(), pair.answer()))
            .collect();
        assert_eq!(flat, vec![("Q1", "A1"), ("Q2", "A2")]);
    }

    #[test]
    fn turn_serializes_lowercase_role() {
        let turn = Turn::new(Role::Assistant, "ok");
        let value = serde_json::to_value(&turn).expect("serialize");
        assert_eq!(value["role"], "assistant");
        let decoded: Turn = serde_json::from_value(value).expect("deserialize");
        assert_eq!(decoded, turn);
    }
}
