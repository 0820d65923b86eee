//! Error types for the codeloom domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all codeloom operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Orchestration errors (turn-build, registry) ---
    #[error("Orchestration error: {0}")]
    Orchestration(#[from] OrchestrationError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Agent errors ---
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    // --- Model runtime errors ---
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    // --- Retrieval back-end errors ---
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Programmer errors detected while building a turn. These abort the turn;
/// nothing else does.
#[derive(Debug, Clone, Error)]
pub enum OrchestrationError {
    #[error("Duplicate tool name '{name}' advertised by {first_kind} and {second_kind}")]
    DuplicateToolName {
        name: String,
        first_kind: String,
        second_kind: String,
    },

    #[error("Tool '{name}' has an empty input schema")]
    MissingSchema { name: String },

    #[error("Conversation has no turns to orchestrate")]
    EmptyConversation,

    #[error("Last turn is not a human turn, cannot reconcile tool results into it")]
    NoHumanTurn,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Tool cancelled: {tool_name}")]
    Cancelled { tool_name: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Reconcile failed for {tool_name}: {reason}")]
    ReconcileFailed { tool_name: String, reason: String },
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent not registered: {0}")]
    NotRegistered(String),

    #[error("Agent '{agent}' input failed schema validation: {errors:?}")]
    InputValidation { agent: String, errors: Vec<String> },

    #[error("Agent '{agent}' output failed schema validation: {errors:?}")]
    OutputValidation { agent: String, errors: Vec<String> },

    #[error("Agent '{agent}' schema failed to compile: {message}")]
    SchemaCompile { agent: String, message: String },

    #[error("Agent execution failed: {agent} — {reason}")]
    ExecutionFailed { agent: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by model runtime, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed model reply: {0}")]
    MalformedReply(String),
}

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Back-end error: {0}")]
    Backend(String),

    #[error("Back-end timed out: {0}")]
    Timeout(String),
}
