//! # Codeloom Agents
//!
//! The agent/node capability layer: typed, schema-validated functions
//! ("agents") wrapped as callable tools and orchestrated by "nodes".
//!
//! A node scans the most recent graph message for tool-call requests
//! addressed to a registered agent, executes matches concurrently with
//! best-effort semantics, and returns paired Agent + Log audit records for
//! the caller to append immutably onto the conversation turn. Registries are
//! rebuilt from graph state on every call, so agent availability can depend
//! on runtime state.

pub mod agent;
pub mod behavior;
pub mod node;

pub use agent::{Agent, AgentTool};
pub use behavior::{AgentBehavior, AgentContext};
pub use node::{GraphMessage, GraphState, Node, NodeEntry, NodeFailure, NodeOutput, PostProcessFn};
