//! # Codeloom Core
//!
//! Domain types, traits, and error definitions for the codeloom conversation
//! context & tool-orchestration engine. This crate has **zero framework
//! dependencies** — it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (model runtime, retrieval back-ends) is
//! defined as a trait here. Implementations live with the caller. All
//! conversation state is a plain value: operations return new values and the
//! caller commits them as a single atomic replace.

pub mod attachment;
pub mod content;
pub mod error;
pub mod event;
pub mod model;
pub mod retrieval;
pub mod tool;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use attachment::{
    AttachmentItem, AttachmentKind, Attachments, CodeAttachment, CodebaseAttachment, CodebaseHit,
    ContextInfoSource, DiffChunk, DocResult, DocSite, DocsAttachment, FileAttachment,
    FolderAttachment, GitCommitAttachment, GitDiffAttachment, GitPullRequestAttachment,
    ImageAttachment, ToolToggle, WebAttachment, WebResult,
};
pub use content::ContentBlock;
pub use error::{
    AgentError, Error, ModelError, OrchestrationError, Result, RetrievalError, ToolError,
};
pub use event::{EngineEvent, EventBus};
pub use model::{ChatMessage, ModelReply, ModelRequest, ModelRuntime, ToolCallRequest, ToolDescriptor};
pub use retrieval::{CodebaseSearchBackend, DocSearchBackend, WebSearchBackend};
pub use tool::{ReconcileFn, ToolCallbackFn, ToolConfig, ToolFuture, boxed_callback};
pub use turn::{AgentRecord, ChatContext, ChatContextId, ConversationTurn, LogRecord, TurnRole};
