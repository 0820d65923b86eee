//! Model runtime boundary — the abstraction over the LLM calling layer.
//!
//! The engine hands the runtime a message list plus tool descriptors and
//! gets back either final content or a batch of tool-call requests.
//! Streaming vs. non-streaming is immaterial to the orchestration contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::content::ContentBlock;
use crate::error::ModelError;
use crate::turn::TurnRole;

/// A role-tagged message handed to the model runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: TurnRole,
    pub blocks: Vec<ContentBlock>,
}

impl ChatMessage {
    pub fn new(role: TurnRole, blocks: Vec<ContentBlock>) -> Self {
        Self { role, blocks }
    }
}

/// A tool descriptor advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// The tool name (globally unique within one turn)
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's input
    pub input_schema: serde_json::Value,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Unique call ID (matches the runtime's tool_call id)
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a JSON value
    pub args: serde_json::Value,
}

/// A complete request to the model runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    /// The assembled conversation messages
    pub messages: Vec<ChatMessage>,

    /// Tools the model may call this round
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDescriptor>,
}

/// What the model runtime returns: final content or tool-call requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelReply {
    /// Final content — terminal for the turn.
    Content(Vec<ContentBlock>),
    /// The model wants tools executed before it answers.
    ToolCalls(Vec<ToolCallRequest>),
}

/// The model runtime trait.
///
/// The engine calls `complete()` without knowing which backend is wired in.
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    /// A human-readable name for this runtime.
    fn name(&self) -> &str;

    /// Send a request and get a reply.
    async fn complete(&self, request: ModelRequest) -> Result<ModelReply, ModelError>;
}
