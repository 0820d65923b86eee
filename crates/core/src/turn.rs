//! Conversation turn and session domain types.
//!
//! These are the core value objects that flow through the engine:
//! the editor produces attachment items → the store merges them into the
//! last turn → the assembler renders all turns → the model replies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attachment::Attachments;

/// Unique identifier for a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatContextId(pub String);

impl ChatContextId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ChatContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChatContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The end user
    Human,
    /// The model
    Ai,
    /// System instructions
    System,
}

/// Audit record of one agent execution on a turn. Appended, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
}

/// Audit log entry paired with an [`AgentRecord`]. Appended, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub agent_id: String,
}

/// A single turn in a conversation.
///
/// Immutable once a later turn exists; tool-call reconciliation replaces the
/// *last* turn with a new version carrying merged attachments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Unique turn ID
    pub id: String,

    /// Who authored this turn
    pub role: TurnRole,

    /// The text content
    pub text: String,

    /// Optional rich-text rendering of `text` (editor markup)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<String>,

    /// Per-kind attached context
    #[serde(default)]
    pub attachments: Attachments,

    /// Append-only audit trail of agent executions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<AgentRecord>,

    /// Append-only audit log entries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<LogRecord>,

    /// Timestamp
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            rich_text: None,
            attachments: Attachments::default(),
            agents: Vec::new(),
            logs: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Create a new human turn with empty attachments.
    pub fn human(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Human, text)
    }

    /// Create a new AI turn.
    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Ai, text)
    }

    /// Create a new system turn.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(TurnRole::System, text)
    }

    /// Replace this turn's attachments, returning a new turn value.
    pub fn with_attachments(mut self, attachments: Attachments) -> Self {
        self.attachments = attachments;
        self
    }
}

/// A chat session: an ordered sequence of turns.
///
/// Never mutated in place by the engine — operations return a new value and
/// the caller commits it as a single atomic replace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatContext {
    /// Unique session ID
    pub id: ChatContextId,

    /// Ordered turns
    pub conversations: Vec<ConversationTurn>,

    /// When this session was created
    pub created_at: DateTime<Utc>,
}

impl ChatContext {
    /// Create a new empty session.
    pub fn new() -> Self {
        Self {
            id: ChatContextId::new(),
            conversations: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Append a turn, returning a new context value.
    pub fn with_turn(&self, turn: ConversationTurn) -> Self {
        let mut next = self.clone();
        next.conversations.push(turn);
        next
    }

    /// Replace the last turn, returning a new context value.
    ///
    /// This is the only sanctioned way to "mutate" history: reconciliation
    /// produces a new version of the last turn and splices it in.
    pub fn with_replaced_last(&self, turn: ConversationTurn) -> Self {
        let mut next = self.clone();
        if let Some(last) = next.conversations.last_mut() {
            *last = turn;
        } else {
            next.conversations.push(turn);
        }
        next
    }

    /// The last turn, if any.
    pub fn last_turn(&self) -> Option<&ConversationTurn> {
        self.conversations.last()
    }

    /// The last turn if it is a human turn (the only reconcilable turn).
    pub fn last_human_turn(&self) -> Option<&ConversationTurn> {
        self.conversations
            .last()
            .filter(|t| t.role == TurnRole::Human)
    }
}

impl Default for ChatContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::{ContextInfoSource, FileAttachment};

    #[test]
    fn create_human_turn() {
        let turn = ConversationTurn::human("Convert this file to Rust");
        assert_eq!(turn.role, TurnRole::Human);
        assert!(turn.attachments.is_empty());
        assert!(turn.agents.is_empty());
        assert!(turn.logs.is_empty());
    }

    #[test]
    fn with_turn_does_not_mutate_original() {
        let ctx = ChatContext::new();
        let next = ctx.with_turn(ConversationTurn::human("hi"));
        assert_eq!(ctx.conversations.len(), 0);
        assert_eq!(next.conversations.len(), 1);
        assert_eq!(ctx.id, next.id);
    }

    #[test]
    fn with_replaced_last_swaps_only_final_turn() {
        let ctx = ChatContext::new()
            .with_turn(ConversationTurn::human("first"))
            .with_turn(ConversationTurn::human("second"));

        let mut attachments = Attachments::default();
        attachments.files.push(FileAttachment {
            full_path: "/w/a.rs".into(),
            content: String::new(),
            source: ContextInfoSource::ToolResult,
        });
        let replacement = ctx.conversations[1].clone().with_attachments(attachments);
        let next = ctx.with_replaced_last(replacement);

        assert_eq!(next.conversations.len(), 2);
        assert_eq!(next.conversations[0].text, "first");
        assert_eq!(next.conversations[1].attachments.files.len(), 1);
        // original untouched
        assert!(ctx.conversations[1].attachments.is_empty());
    }

    #[test]
    fn last_human_turn_requires_human_role() {
        let ctx = ChatContext::new().with_turn(ConversationTurn::human("q"));
        assert!(ctx.last_human_turn().is_some());

        let ctx = ctx.with_turn(ConversationTurn::ai("a"));
        assert!(ctx.last_human_turn().is_none());
    }

    #[test]
    fn turn_serialization_roundtrip() {
        let turn = ConversationTurn::human("Test message");
        let json = serde_json::to_string(&turn).unwrap();
        let back: ConversationTurn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, turn);
    }
}
