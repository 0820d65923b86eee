//! The agent capability trait.
//!
//! An agent is a stateless, typed function: JSON in, JSON out, with both
//! sides described by JSON Schemas. Agents are wrapped into callable tools
//! on demand; they never hold conversation state themselves.

use async_trait::async_trait;
use serde_json::Value;

use codeloom_core::error::AgentError;

/// Arbitrary runtime state handed to an agent at execution time
/// (workspace root, feature flags, session facts).
#[derive(Debug, Clone, Default)]
pub struct AgentContext {
    pub values: serde_json::Map<String, Value>,
}

impl AgentContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// A standalone typed capability exposed as a model-callable tool.
#[async_trait]
pub trait AgentBehavior: Send + Sync {
    /// Unique agent name; doubles as the tool name.
    fn name(&self) -> &str;

    /// Description advertised to the model.
    fn description(&self) -> &str;

    /// JSON Schema the input must satisfy.
    fn input_schema(&self) -> Value;

    /// JSON Schema the output must satisfy.
    fn output_schema(&self) -> Value;

    /// Title used for the audit log entry written per execution.
    fn log_title(&self) -> String {
        format!("Ran {}", self.name())
    }

    /// Execute with already-validated input.
    async fn execute(&self, input: Value, context: &AgentContext) -> Result<Value, AgentError>;
}
