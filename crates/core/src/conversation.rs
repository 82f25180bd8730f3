//! Conversation turn types
//!
//! A transcript is an ordered, append-only sequence of turns. The chat
//! endpoint receives the full transcript on every request and all dialogue
//! state is re-derived from it, so turns carry no server-side identity.

use serde::{Deserialize, Serialize};

/// Role of the speaker in a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// End-user message
    User,
    /// Assistant reply
    Assistant,
    /// System instruction
    System,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
            TurnRole::System => "system",
        }
    }

    /// Parse a wire role string; unknown roles are treated as user input.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "assistant" => TurnRole::Assistant,
            "system" => TurnRole::System,
            _ => TurnRole::User,
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single turn in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }

    /// Create a system turn
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(TurnRole::System, content)
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(TurnRole::parse("assistant"), TurnRole::Assistant);
        assert_eq!(TurnRole::parse("SYSTEM"), TurnRole::System);
        assert_eq!(TurnRole::parse("user"), TurnRole::User);
        assert_eq!(TurnRole::parse("bot"), TurnRole::User);
    }

    #[test]
    fn test_role_serde() {
        let json = serde_json::to_string(&TurnRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn test_turn_creation() {
        let turn = Turn::user("I need a PG in Bangalore");
        assert_eq!(turn.role, TurnRole::User);
        assert_eq!(turn.word_count(), 6);
    }

    #[test]
    fn test_turn_wire_shape() {
        let turn: Turn = serde_json::from_str(r#"{"role":"user","content":"hi"}"#).unwrap();
        assert_eq!(turn.role, TurnRole::User);
        assert_eq!(turn.content, "hi");
    }
}
