//! Node orchestration: scan a model message for agent tool calls, execute
//! matches concurrently best-effort, and emit an append-only audit trail.
//!
//! The agent registry is rebuilt from the current graph state on every call,
//! so the available agents can depend on runtime state (feature flags,
//! session mode). No process-wide mutable map of agents exists.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use codeloom_core::error::AgentError;
use codeloom_core::model::ToolCallRequest;
use codeloom_core::turn::{AgentRecord, ConversationTurn, LogRecord, TurnRole};

use crate::agent::Agent;
use crate::behavior::{AgentBehavior, AgentContext};

/// Reshapes an agent's validated output before it is recorded.
pub type PostProcessFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// One registry slot: the agent, its context, and an optional post-process.
#[derive(Clone)]
pub struct NodeEntry {
    pub behavior: Arc<dyn AgentBehavior>,
    pub context: AgentContext,
    pub post_process: Option<PostProcessFn>,
}

impl NodeEntry {
    pub fn new(behavior: Arc<dyn AgentBehavior>) -> Self {
        Self {
            behavior,
            context: AgentContext::new(),
            post_process: None,
        }
    }

    pub fn with_context(mut self, context: AgentContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_post_process(mut self, post_process: PostProcessFn) -> Self {
        self.post_process = Some(post_process);
        self
    }
}

/// A message in the conversational graph a node operates over.
#[derive(Debug, Clone)]
pub struct GraphMessage {
    pub role: TurnRole,
    pub text: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl GraphMessage {
    pub fn ai_with_calls(text: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: TurnRole::Ai,
            text: text.into(),
            tool_calls,
        }
    }
}

/// The state a node's registry is rebuilt from.
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    pub messages: Vec<GraphMessage>,
}

/// What one node execution produced: audit records for the caller to append
/// plus the failures the best-effort join settled.
#[derive(Debug, Default)]
pub struct NodeOutput {
    pub agents: Vec<AgentRecord>,
    pub logs: Vec<LogRecord>,
    pub failures: Vec<NodeFailure>,
}

/// A single settled failure inside a node batch.
#[derive(Debug, Clone)]
pub struct NodeFailure {
    pub call_id: String,
    pub reason: String,
}

impl NodeOutput {
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty() && self.logs.is_empty() && self.failures.is_empty()
    }

    /// Append this output's records onto a turn, returning a new turn value.
    pub fn apply_to_turn(&self, turn: &ConversationTurn) -> ConversationTurn {
        let mut next = turn.clone();
        next.agents.extend(self.agents.iter().cloned());
        next.logs.extend(self.logs.iter().cloned());
        next
    }
}

type RegistryBuilder = Box<dyn Fn(&GraphState) -> HashMap<String, NodeEntry> + Send + Sync>;

/// A node: a registry builder plus the execution step.
pub struct Node {
    build_registry: RegistryBuilder,
}

impl Node {
    pub fn new(
        build_registry: impl Fn(&GraphState) -> HashMap<String, NodeEntry> + Send + Sync + 'static,
    ) -> Self {
        Self {
            build_registry: Box::new(build_registry),
        }
    }

    /// The agent names available under the given state, sorted.
    pub fn registry_names(&self, state: &GraphState) -> Vec<String> {
        let mut names: Vec<String> = (self.build_registry)(state).into_keys().collect();
        names.sort_unstable();
        names
    }

    /// Execute one agent against the most recent message's matching calls.
    ///
    /// Matches run concurrently; a failing call lands in
    /// [`NodeOutput::failures`] and does not disturb its siblings. Only a
    /// missing registry entry or a schema that fails to compile is a hard
    /// error.
    pub async fn execute_agent_tool(
        &self,
        state: &GraphState,
        agent_name: &str,
    ) -> Result<NodeOutput, AgentError> {
        let registry = (self.build_registry)(state);
        let entry = registry
            .get(agent_name)
            .ok_or_else(|| AgentError::NotRegistered(agent_name.to_string()))?;

        let agent = Agent::new(entry.behavior.clone(), entry.context.clone());
        let tool = agent.create_tool()?;

        let matches: Vec<&ToolCallRequest> = state
            .messages
            .last()
            .map(|message| {
                message
                    .tool_calls
                    .iter()
                    .filter(|call| call.name == agent_name)
                    .collect()
            })
            .unwrap_or_default();

        if matches.is_empty() {
            return Ok(NodeOutput::default());
        }
        debug!(agent = agent_name, matches = matches.len(), "Executing agent tool calls");

        let executions = matches.iter().map(|&call| {
            let tool = &tool;
            async move { (call, tool.invoke(call.args.clone()).await) }
        });
        let settled = join_all(executions).await;

        let mut output = NodeOutput::default();
        for (call, result) in settled {
            match result {
                Ok(value) => {
                    let value = match &entry.post_process {
                        Some(post_process) => post_process(value),
                        None => value,
                    };
                    let record = AgentRecord {
                        id: Uuid::new_v4().to_string(),
                        name: agent_name.to_string(),
                        input: call.args.clone(),
                        output: value,
                    };
                    output.logs.push(LogRecord {
                        id: Uuid::new_v4().to_string(),
                        created_at: Utc::now(),
                        title: agent.log_title(),
                        agent_id: record.id.clone(),
                    });
                    output.agents.push(record);
                }
                Err(e) => {
                    warn!(agent = agent_name, call_id = %call.id, error = %e, "Agent call failed");
                    output.failures.push(NodeFailure {
                        call_id: call.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(output)
    }
}
