//! The per-turn orchestration loop.
//!
//! Drives one conversation turn to completion:
//!
//! 1. Build the tool registry for the last turn (config errors abort here)
//! 2. Assemble all turns into role-tagged messages
//! 3. Call the model runtime
//! 4. On tool calls: execute the batch, reconcile attachments, re-assemble,
//!    loop back to step 1
//! 5. On content: append the AI turn and return
//!
//! The loop continues until the model returns plain content or the round
//! limit is reached.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use codeloom_config::EngineConfig;
use codeloom_context::{MessageAssembler, ProcessorSet, RetrievalBackends};
use codeloom_core::attachment::AttachmentItem;
use codeloom_core::content::{ContentBlock, blocks_to_text};
use codeloom_core::error::Error;
use codeloom_core::event::{EngineEvent, EventBus};
use codeloom_core::model::{ModelReply, ModelRequest, ModelRuntime};
use codeloom_core::turn::{ChatContext, ConversationTurn};
use codeloom_store::{MergePriority, add_items, override_by_source};
use codeloom_tools::{ToolCallOutcome, ToolManager, ToolRunOptions, build_tool_registry};

/// The per-turn state machine phases, reported for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    Composing,
    ToolsAdvertised,
    ToolCallsPending,
    ToolsExecuted,
    AttachmentsReconciled,
    Reassembled,
    Final,
}

/// The result of driving one turn to its terminal state.
#[derive(Debug)]
pub struct TurnOutcome {
    /// The new context value, AI turn appended. The caller commits it.
    pub context: ChatContext,

    /// The model's final content blocks.
    pub reply: Vec<ContentBlock>,

    /// How many tool rounds ran before the final answer.
    pub tool_rounds: u32,

    /// Every tool call's settled outcome, across all rounds.
    pub tool_outcomes: Vec<ToolCallOutcome>,

    /// Always `Final` on a returned outcome.
    pub phase: TurnPhase,
}

/// Orchestrates model calls and tool execution for one conversation.
pub struct TurnRunner {
    /// The model runtime to call
    runtime: Arc<dyn ModelRuntime>,

    /// One processor per attachment kind
    processors: Arc<ProcessorSet>,

    /// Renders turns into messages
    assembler: MessageAssembler,

    /// Executes and reconciles tool calls
    tools: ToolManager,

    /// Engine settings
    config: EngineConfig,

    /// Event bus for engine events
    events: Arc<EventBus>,
}

impl TurnRunner {
    /// Create a runner wiring the runtime to the given retrieval back-ends.
    pub fn new(
        runtime: Arc<dyn ModelRuntime>,
        backends: RetrievalBackends,
        config: EngineConfig,
        events: Arc<EventBus>,
    ) -> Self {
        let processors = Arc::new(ProcessorSet::with_max_results(
            backends,
            config.max_results_per_tool,
        ));
        Self {
            runtime,
            processors,
            assembler: MessageAssembler::new(),
            tools: ToolManager::new(events.clone()),
            config,
            events,
        }
    }

    /// The collision policy configured for this engine.
    pub fn merge_priority(&self) -> MergePriority {
        self.config
            .deprioritized_sources
            .iter()
            .fold(MergePriority::none(), |priority, source| {
                priority.deprioritize(*source)
            })
    }

    /// Merge items into the last turn under the configured priority,
    /// returning a new context value.
    pub fn attach_items(&self, context: &ChatContext, items: &[AttachmentItem]) -> ChatContext {
        let Some(last) = context.last_turn() else {
            return context.clone();
        };
        let merged = add_items(&last.attachments, items, &self.merge_priority());
        self.events.publish(EngineEvent::AttachmentsMerged {
            items_added: items.len(),
            timestamp: Utc::now(),
        });
        context.with_replaced_last(last.clone().with_attachments(merged))
    }

    /// Replace everything a source produced on the last turn (e.g. the live
    /// editor selection changed), returning a new context value.
    pub fn override_source(
        &self,
        context: &ChatContext,
        source: codeloom_core::attachment::ContextInfoSource,
        items: &[AttachmentItem],
    ) -> ChatContext {
        let Some(last) = context.last_turn() else {
            return context.clone();
        };
        let merged = override_by_source(source, &last.attachments, items);
        context.with_replaced_last(last.clone().with_attachments(merged))
    }

    /// Drive the current turn to completion.
    pub async fn run_turn(&self, context: ChatContext) -> Result<TurnOutcome, Error> {
        self.run_turn_with_cancel(context, CancellationToken::new())
            .await
    }

    /// Drive the current turn to completion under a cancellation signal.
    pub async fn run_turn_with_cancel(
        &self,
        context: ChatContext,
        cancel: CancellationToken,
    ) -> Result<TurnOutcome, Error> {
        info!(
            phase = ?TurnPhase::Composing,
            context_id = %context.id,
            turns = context.conversations.len(),
            "Processing turn"
        );

        let mut context = context;
        let mut tool_rounds = 0u32;
        let mut tool_outcomes: Vec<ToolCallOutcome> = Vec::new();

        loop {
            let last_turn = context
                .last_turn()
                .ok_or(codeloom_core::error::OrchestrationError::EmptyConversation)?;

            // ── ToolsAdvertised ──
            let registry = build_tool_registry(&self.processors, last_turn)?;
            debug!(
                phase = ?TurnPhase::ToolsAdvertised,
                tools = registry.len(),
                "Registry built"
            );

            // ── (Re)Assembled ──
            let messages = self.assembler.assemble(&context, &self.processors);
            let request = ModelRequest {
                messages,
                tools: registry.descriptors(),
            };

            let reply = self.runtime.complete(request).await?;

            match reply {
                ModelReply::Content(blocks) => {
                    // ── Final ──
                    return Ok(self.finish(context, blocks, tool_rounds, tool_outcomes));
                }
                ModelReply::ToolCalls(calls) => {
                    // ── ToolCallsPending ──
                    tool_rounds += 1;
                    if tool_rounds > self.config.max_tool_rounds {
                        warn!(
                            context_id = %context.id,
                            rounds = tool_rounds,
                            "Max tool rounds reached, forcing final response"
                        );
                        let fallback = vec![ContentBlock::text(
                            "Tool-call limit reached before the model settled on an answer.",
                        )];
                        return Ok(self.finish(context, fallback, tool_rounds - 1, tool_outcomes));
                    }

                    debug!(
                        phase = ?TurnPhase::ToolCallsPending,
                        context_id = %context.id,
                        round = tool_rounds,
                        calls = calls.len(),
                        "Executing tool-call round"
                    );

                    // ── ToolsExecuted → AttachmentsReconciled ──
                    let options = ToolRunOptions {
                        timeout: Duration::from_secs(self.config.tool_timeout_secs),
                        cancel: cancel.child_token(),
                    };
                    let (next, outcomes) = self
                        .tools
                        .apply_tool_calls(&calls, &registry, &context, &options)
                        .await?;
                    tool_outcomes.extend(outcomes);
                    context = next;
                    debug!(
                        phase = ?TurnPhase::AttachmentsReconciled,
                        context_id = %context.id,
                        "Tool results folded into the last turn"
                    );
                    // Loop back — the model sees the reconciled context.
                }
            }
        }
    }

    fn finish(
        &self,
        context: ChatContext,
        blocks: Vec<ContentBlock>,
        tool_rounds: u32,
        tool_outcomes: Vec<ToolCallOutcome>,
    ) -> TurnOutcome {
        let text = blocks_to_text(&blocks);
        let next = context.with_turn(ConversationTurn::ai(text));

        self.events.publish(EngineEvent::TurnCompleted {
            context_id: next.id.to_string(),
            tool_rounds,
            timestamp: Utc::now(),
        });

        TurnOutcome {
            context: next,
            reply: blocks,
            tool_rounds,
            tool_outcomes,
            phase: TurnPhase::Final,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use codeloom_core::attachment::{
        ContextInfoSource, FileAttachment, ToolToggle, WebResult,
    };
    use codeloom_core::error::{ModelError, RetrievalError};
    use codeloom_core::model::{ChatMessage, ToolCallRequest};
    use codeloom_core::retrieval::WebSearchBackend;

    /// Replays a scripted sequence of replies and records every request.
    struct ScriptedRuntime {
        script: Mutex<Vec<ModelReply>>,
        requests: Mutex<Vec<ModelRequest>>,
    }

    impl ScriptedRuntime {
        fn new(script: Vec<ModelReply>) -> Self {
            Self {
                script: Mutex::new(script),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn seen_requests(&self) -> Vec<ModelRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelRuntime for ScriptedRuntime {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: ModelRequest) -> Result<ModelReply, ModelError> {
            self.requests.lock().unwrap().push(request);
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                return Ok(ModelReply::Content(vec![ContentBlock::text("done")]));
            }
            Ok(script.remove(0))
        }
    }

    struct OneHitWeb;

    #[async_trait]
    impl WebSearchBackend for OneHitWeb {
        async fn search(
            &self,
            query: &str,
            _signal: CancellationToken,
        ) -> Result<Vec<WebResult>, RetrievalError> {
            Ok(vec![WebResult {
                url: format!("https://example.com/{query}"),
                title: query.into(),
                snippet: "found".into(),
                source: ContextInfoSource::ToolResult,
            }])
        }
    }

    fn backends_with_web() -> RetrievalBackends {
        let mut backends = RetrievalBackends::noop();
        backends.web = Arc::new(OneHitWeb);
        backends
    }

    fn runner(runtime: Arc<ScriptedRuntime>, backends: RetrievalBackends) -> TurnRunner {
        TurnRunner::new(
            runtime,
            backends,
            EngineConfig::default(),
            Arc::new(EventBus::default()),
        )
    }

    fn web_enabled_context() -> ChatContext {
        let mut turn = ConversationTurn::human("What changed upstream?");
        turn.attachments.web.tool = ToolToggle::on(ContextInfoSource::UserPicked);
        ChatContext::new().with_turn(turn)
    }

    fn last_message_text(request: &ModelRequest) -> String {
        request
            .messages
            .last()
            .map(|m: &ChatMessage| blocks_to_text(&m.blocks))
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn plain_content_finishes_in_one_round() {
        let runtime = Arc::new(ScriptedRuntime::new(vec![ModelReply::Content(vec![
            ContentBlock::text("Hello!"),
        ])]));
        let runner = runner(runtime.clone(), RetrievalBackends::noop());

        let context = ChatContext::new().with_turn(ConversationTurn::human("Hi"));
        let outcome = runner.run_turn(context).await.unwrap();

        assert_eq!(outcome.phase, TurnPhase::Final);
        assert_eq!(outcome.tool_rounds, 0);
        assert_eq!(outcome.context.conversations.len(), 2);
        assert_eq!(outcome.context.conversations[1].text, "Hello!");
        // no tools advertised without toggles
        assert!(runtime.seen_requests()[0].tools.is_empty());
    }

    #[tokio::test]
    async fn tool_round_reconciles_then_reassembles() {
        let runtime = Arc::new(ScriptedRuntime::new(vec![
            ModelReply::ToolCalls(vec![ToolCallRequest {
                id: "c1".into(),
                name: "search_web".into(),
                args: serde_json::json!({"query": "upstream"}),
            }]),
            ModelReply::Content(vec![ContentBlock::text("Summarized.")]),
        ]));
        let runner = runner(runtime.clone(), backends_with_web());

        let outcome = runner.run_turn(web_enabled_context()).await.unwrap();

        assert_eq!(outcome.tool_rounds, 1);
        assert_eq!(outcome.tool_outcomes.len(), 1);
        assert!(outcome.tool_outcomes[0].outcome.is_success());

        // The reconciled result landed on the human turn.
        let human = &outcome.context.conversations[0];
        assert_eq!(human.attachments.web.results.len(), 1);

        // The second model request saw the folded-in search results.
        let requests = runtime.seen_requests();
        assert_eq!(requests.len(), 2);
        assert!(last_message_text(&requests[1]).contains("https://example.com/upstream"));
        assert!(!last_message_text(&requests[0]).contains("https://example.com"));

        // First request advertised the web tool.
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[0].tools[0].name, "search_web");
    }

    #[tokio::test]
    async fn round_limit_forces_final_answer() {
        // The model asks for tools forever.
        let looping: Vec<ModelReply> = (0..20)
            .map(|i| {
                ModelReply::ToolCalls(vec![ToolCallRequest {
                    id: format!("c{i}"),
                    name: "search_web".into(),
                    args: serde_json::json!({"query": format!("q{i}")}),
                }])
            })
            .collect();
        let runtime = Arc::new(ScriptedRuntime::new(looping));

        let mut config = EngineConfig::default();
        config.max_tool_rounds = 2;
        let runner = TurnRunner::new(
            runtime,
            backends_with_web(),
            config,
            Arc::new(EventBus::default()),
        );

        let outcome = runner.run_turn(web_enabled_context()).await.unwrap();
        assert_eq!(outcome.phase, TurnPhase::Final);
        assert_eq!(outcome.tool_rounds, 2);
        assert!(blocks_to_text(&outcome.reply).contains("limit"));
    }

    #[tokio::test]
    async fn empty_context_is_an_error() {
        let runtime = Arc::new(ScriptedRuntime::new(vec![]));
        let runner = runner(runtime, RetrievalBackends::noop());
        let err = runner.run_turn(ChatContext::new()).await.unwrap_err();
        assert!(matches!(err, Error::Orchestration(_)));
    }

    #[tokio::test]
    async fn attach_items_respects_configured_priority() {
        let runtime = Arc::new(ScriptedRuntime::new(vec![]));
        let runner = runner(runtime, RetrievalBackends::noop());
        let context = ChatContext::new().with_turn(ConversationTurn::human("q"));

        let mention = AttachmentItem::File(FileAttachment {
            full_path: "a.ts".into(),
            content: "stale".into(),
            source: ContextInfoSource::EditorMention,
        });
        let picked = AttachmentItem::File(FileAttachment {
            full_path: "a.ts".into(),
            content: "fresh".into(),
            source: ContextInfoSource::UserPicked,
        });

        let context = runner.attach_items(&context, &[mention]);
        let context = runner.attach_items(&context, &[picked]);

        let files = &context.last_turn().unwrap().attachments.files;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].source, ContextInfoSource::UserPicked);
    }

    #[tokio::test]
    async fn override_source_replaces_editor_state() {
        let runtime = Arc::new(ScriptedRuntime::new(vec![]));
        let runner = runner(runtime, RetrievalBackends::noop());
        let context = ChatContext::new().with_turn(ConversationTurn::human("q"));

        let old = AttachmentItem::File(FileAttachment {
            full_path: "old.ts".into(),
            content: String::new(),
            source: ContextInfoSource::EditorMention,
        });
        let new = AttachmentItem::File(FileAttachment {
            full_path: "new.ts".into(),
            content: String::new(),
            source: ContextInfoSource::EditorMention,
        });

        let context = runner.attach_items(&context, &[old]);
        let context = runner.override_source(&context, ContextInfoSource::EditorMention, &[new]);

        let files = &context.last_turn().unwrap().attachments.files;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].full_path, "new.ts");
    }

    #[tokio::test]
    async fn turn_completed_event_is_published() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let runtime = Arc::new(ScriptedRuntime::new(vec![]));
        let runner = TurnRunner::new(
            runtime,
            RetrievalBackends::noop(),
            EngineConfig::default(),
            bus,
        );

        let context = ChatContext::new().with_turn(ConversationTurn::human("Hi"));
        runner.run_turn(context).await.unwrap();

        let mut completed = false;
        while let Ok(event) = rx.try_recv() {
            if matches!(event.as_ref(), EngineEvent::TurnCompleted { .. }) {
                completed = true;
            }
        }
        assert!(completed);
    }
}
