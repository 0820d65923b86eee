//! The agent wrapper: schema-validated, callable tools.
//!
//! `Agent::create_tool()` compiles both schemas up front and returns a
//! callable whose handler validates input before `execute` and output after.
//! A validation failure on either side is a hard error for that single call,
//! never for the batch it runs in.

use std::sync::Arc;

use jsonschema::JSONSchema;
use serde_json::Value;

use codeloom_core::error::AgentError;
use codeloom_core::model::ToolDescriptor;

use crate::behavior::{AgentBehavior, AgentContext};

/// One agent capability bound to a context object.
pub struct Agent {
    behavior: Arc<dyn AgentBehavior>,
    context: AgentContext,
}

impl Agent {
    pub fn new(behavior: Arc<dyn AgentBehavior>, context: AgentContext) -> Self {
        Self { behavior, context }
    }

    pub fn name(&self) -> &str {
        self.behavior.name()
    }

    pub fn log_title(&self) -> String {
        self.behavior.log_title()
    }

    /// The descriptor advertised to the model for this agent.
    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.behavior.name().to_string(),
            description: self.behavior.description().to_string(),
            input_schema: self.behavior.input_schema(),
        }
    }

    /// Compile the schemas and return the callable tool.
    ///
    /// A schema that fails to compile is a configuration error surfaced
    /// here, before any call runs.
    pub fn create_tool(&self) -> Result<AgentTool, AgentError> {
        let name = self.behavior.name().to_string();
        let input_validator =
            JSONSchema::compile(&self.behavior.input_schema()).map_err(|e| {
                AgentError::SchemaCompile {
                    agent: name.clone(),
                    message: e.to_string(),
                }
            })?;
        let output_validator =
            JSONSchema::compile(&self.behavior.output_schema()).map_err(|e| {
                AgentError::SchemaCompile {
                    agent: name.clone(),
                    message: e.to_string(),
                }
            })?;

        Ok(AgentTool {
            behavior: self.behavior.clone(),
            context: self.context.clone(),
            input_validator,
            output_validator,
        })
    }
}

/// The callable form of an agent: validate in, execute, validate out.
pub struct AgentTool {
    behavior: Arc<dyn AgentBehavior>,
    context: AgentContext,
    input_validator: JSONSchema,
    output_validator: JSONSchema,
}

impl AgentTool {
    pub fn name(&self) -> &str {
        self.behavior.name()
    }

    /// Invoke the agent with model-provided input.
    pub async fn invoke(&self, input: Value) -> Result<Value, AgentError> {
        if let Err(violations) = self.input_validator.validate(&input) {
            return Err(AgentError::InputValidation {
                agent: self.behavior.name().to_string(),
                errors: violations.map(|e| e.to_string()).collect(),
            });
        }

        let output = self.behavior.execute(input, &self.context).await?;

        if let Err(violations) = self.output_validator.validate(&output) {
            return Err(AgentError::OutputValidation {
                agent: self.behavior.name().to_string(),
                errors: violations.map(|e| e.to_string()).collect(),
            });
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Adds two numbers.
    struct AdderAgent;

    #[async_trait]
    impl AgentBehavior for AdderAgent {
        fn name(&self) -> &str {
            "adder"
        }
        fn description(&self) -> &str {
            "Adds two numbers"
        }
        fn input_schema(&self) -> Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "a": { "type": "number" },
                    "b": { "type": "number" }
                },
                "required": ["a", "b"]
            })
        }
        fn output_schema(&self) -> Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "sum": { "type": "number" }
                },
                "required": ["sum"]
            })
        }
        async fn execute(&self, input: Value, _context: &AgentContext) -> Result<Value, AgentError> {
            let a = input["a"].as_f64().unwrap_or(0.0);
            let b = input["b"].as_f64().unwrap_or(0.0);
            Ok(serde_json::json!({ "sum": a + b }))
        }
    }

    /// Returns an output that violates its own schema.
    struct LiarAgent;

    #[async_trait]
    impl AgentBehavior for LiarAgent {
        fn name(&self) -> &str {
            "liar"
        }
        fn description(&self) -> &str {
            "Claims numbers, returns strings"
        }
        fn input_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }
        fn output_schema(&self) -> Value {
            serde_json::json!({
                "type": "object",
                "properties": { "sum": { "type": "number" } },
                "required": ["sum"]
            })
        }
        async fn execute(&self, _input: Value, _context: &AgentContext) -> Result<Value, AgentError> {
            Ok(serde_json::json!({ "sum": "not a number" }))
        }
    }

    #[tokio::test]
    async fn valid_input_executes() {
        let tool = Agent::new(Arc::new(AdderAgent), AgentContext::new())
            .create_tool()
            .unwrap();
        let out = tool.invoke(serde_json::json!({"a": 2, "b": 3})).await.unwrap();
        assert_eq!(out["sum"], 5.0);
    }

    #[tokio::test]
    async fn invalid_input_fails_that_call() {
        let tool = Agent::new(Arc::new(AdderAgent), AgentContext::new())
            .create_tool()
            .unwrap();
        let err = tool.invoke(serde_json::json!({"a": 2})).await.unwrap_err();
        match err {
            AgentError::InputValidation { agent, errors } => {
                assert_eq!(agent, "adder");
                assert!(!errors.is_empty());
            }
            other => panic!("Expected input validation error, got {other}"),
        }
    }

    #[tokio::test]
    async fn invalid_output_fails_that_call() {
        let tool = Agent::new(Arc::new(LiarAgent), AgentContext::new())
            .create_tool()
            .unwrap();
        let err = tool.invoke(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, AgentError::OutputValidation { .. }));
    }

    #[test]
    fn descriptor_exposes_input_schema() {
        let agent = Agent::new(Arc::new(AdderAgent), AgentContext::new());
        let descriptor = agent.descriptor();
        assert_eq!(descriptor.name, "adder");
        assert_eq!(descriptor.input_schema["required"][0], "a");
    }
}
