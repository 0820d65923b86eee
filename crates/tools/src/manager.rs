//! Tool-call execution and reconciliation.
//!
//! All calls from one model reply are dispatched together and awaited with
//! settle-all semantics: a failing call is recorded as failed and does not
//! cancel or invalidate sibling calls. Successful results are then folded
//! sequentially into a new version of the last turn's attachments; the
//! store's key-based merge keeps the fold order-independent.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use codeloom_core::error::{OrchestrationError, ToolError};
use codeloom_core::event::{EngineEvent, EventBus};
use codeloom_core::model::ToolCallRequest;
use codeloom_core::turn::{ChatContext, TurnRole};

use crate::registry::ToolRegistry;

/// Per-batch execution options.
#[derive(Debug, Clone)]
pub struct ToolRunOptions {
    /// Hard per-call timeout.
    pub timeout: Duration,

    /// Cancellation signal; each call gets a child token.
    pub cancel: CancellationToken,
}

impl Default for ToolRunOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            cancel: CancellationToken::new(),
        }
    }
}

/// Explicit per-call result — failures are data, never control flow across
/// the batch join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { value: serde_json::Value },
    Failed { reason: String },
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// The settled result of one tool call in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallOutcome {
    pub call_id: String,
    pub tool_name: String,
    pub outcome: ToolOutcome,
    pub duration_ms: u64,
}

/// Bridges the attachment store and the model runtime's function-calling
/// protocol.
pub struct ToolManager {
    events: Arc<EventBus>,
}

impl ToolManager {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self { events }
    }

    /// Execute a batch of model-issued tool calls and reconcile the results
    /// into a new context value.
    ///
    /// The returned context differs from the input only in its last turn,
    /// which carries the reconciled attachments. The input is never mutated.
    pub async fn apply_tool_calls(
        &self,
        calls: &[ToolCallRequest],
        registry: &ToolRegistry,
        context: &ChatContext,
        options: &ToolRunOptions,
    ) -> Result<(ChatContext, Vec<ToolCallOutcome>), OrchestrationError> {
        let last_turn = context
            .last_turn()
            .ok_or(OrchestrationError::EmptyConversation)?;
        if last_turn.role != TurnRole::Human {
            return Err(OrchestrationError::NoHumanTurn);
        }

        // ── Execute all calls concurrently, settle-all ──
        let executions = calls.iter().map(|call| self.execute_one(call, registry, options));
        let outcomes: Vec<ToolCallOutcome> = join_all(executions).await;

        // ── Reconcile successes sequentially against the batch snapshot ──
        let mut attachments = last_turn.attachments.clone();
        let mut outcomes = outcomes;
        for outcome in outcomes.iter_mut() {
            let ToolOutcome::Success { value } = &outcome.outcome else {
                continue;
            };
            let Some(entry) = registry.get(&outcome.tool_name) else {
                continue;
            };
            match (entry.config.reconcile)(value, &attachments) {
                Ok(next) => attachments = next,
                Err(e) => {
                    // A reconcile error is a call-level failure; prior
                    // reconciled state is kept.
                    warn!(tool = %outcome.tool_name, error = %e, "Reconcile failed");
                    outcome.outcome = ToolOutcome::Failed {
                        reason: e.to_string(),
                    };
                }
            }
        }

        let new_turn = last_turn.clone().with_attachments(attachments);
        let new_context = context.with_replaced_last(new_turn);

        debug!(
            calls = calls.len(),
            succeeded = outcomes.iter().filter(|o| o.outcome.is_success()).count(),
            "Applied tool-call batch"
        );
        Ok((new_context, outcomes))
    }

    /// Run one call: lookup, cancellation race, timeout. Never returns an
    /// error — every failure mode settles into `ToolOutcome::Failed`.
    async fn execute_one(
        &self,
        call: &ToolCallRequest,
        registry: &ToolRegistry,
        options: &ToolRunOptions,
    ) -> ToolCallOutcome {
        let start = std::time::Instant::now();

        let outcome = match registry.get(&call.name) {
            None => ToolOutcome::Failed {
                reason: ToolError::NotFound(call.name.clone()).to_string(),
            },
            Some(entry) => {
                let signal = options.cancel.child_token();
                let invocation = (entry.config.callback)(call.args.clone(), signal.clone());
                tokio::select! {
                    biased;
                    _ = options.cancel.cancelled() => ToolOutcome::Failed {
                        reason: ToolError::Cancelled {
                            tool_name: call.name.clone(),
                        }
                        .to_string(),
                    },
                    settled = tokio::time::timeout(options.timeout, invocation) => match settled {
                        Ok(Ok(value)) => ToolOutcome::Success { value },
                        Ok(Err(e)) => ToolOutcome::Failed {
                            reason: e.to_string(),
                        },
                        Err(_) => {
                            signal.cancel();
                            ToolOutcome::Failed {
                                reason: ToolError::Timeout {
                                    tool_name: call.name.clone(),
                                    timeout_secs: options.timeout.as_secs(),
                                }
                                .to_string(),
                            }
                        }
                    },
                }
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        if let ToolOutcome::Failed { reason } = &outcome {
            warn!(tool = %call.name, %reason, "Tool call failed");
        }
        self.events.publish(EngineEvent::ToolExecuted {
            tool_name: call.name.clone(),
            success: outcome.is_success(),
            duration_ms,
            timestamp: Utc::now(),
        });

        ToolCallOutcome {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            outcome,
            duration_ms,
        }
    }
}
