//! # Codeloom Context
//!
//! Context processors — one per attachment kind — and the message assembler.
//!
//! A processor renders its kind's items into typed content blocks; the three
//! tool-capable kinds (Web, Docs, Codebase) additionally advertise callable
//! tool descriptors. The assembler walks a conversation's turns and emits one
//! role-tagged message per turn, threading the live/compacted distinction
//! (`is_last_turn`) into every processor call so prompt growth stays bounded
//! as history accumulates.

pub mod assembler;
pub mod code;
pub mod codebase;
pub mod docs;
pub mod files;
pub mod git;
pub mod images;
pub mod processor;
pub mod set;
pub mod web;

pub use assembler::MessageAssembler;
pub use code::CodeProcessor;
pub use codebase::{CODEBASE_TOOL_NAME, CodebaseProcessor};
pub use docs::{DOCS_TOOL_NAME, DocsProcessor};
pub use files::{FilesProcessor, FoldersProcessor};
pub use git::{GitCommitsProcessor, GitDiffsProcessor, GitPullRequestsProcessor};
pub use images::ImagesProcessor;
pub use processor::{ContextProcessor, RenderContext, SECTION_SPLITTER, ToolCapable};
pub use set::{ProcessorSet, RetrievalBackends};
pub use web::{WEB_TOOL_NAME, WebProcessor};
