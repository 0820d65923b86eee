//! Web search processor — tool-capable.
//!
//! Advertises `search_web` when the turn's web toggle is on; the callback
//! queries the web back-end and the reconcile folds results into the Web
//! collection through the store's idempotent merge.

use std::sync::Arc;

use tracing::warn;

use codeloom_core::attachment::{
    AttachmentItem, AttachmentKind, Attachments, ContextInfoSource, WebResult,
};
use codeloom_core::content::ContentBlock;
use codeloom_core::error::ToolError;
use codeloom_core::model::ToolDescriptor;
use codeloom_core::retrieval::WebSearchBackend;
use codeloom_core::tool::{ReconcileFn, ToolConfig, boxed_callback};
use codeloom_core::turn::ConversationTurn;
use codeloom_store::{MergePriority, add_items};

use crate::processor::{
    ContextProcessor, RenderContext, SECTION_SPLITTER, ToolCapable, push_section,
};

pub const WEB_TOOL_NAME: &str = "search_web";

pub struct WebProcessor {
    backend: Arc<dyn WebSearchBackend>,
    max_results: usize,
}

impl WebProcessor {
    pub fn new(backend: Arc<dyn WebSearchBackend>) -> Self {
        Self {
            backend,
            max_results: 5,
        }
    }

    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }
}

impl ContextProcessor for WebProcessor {
    fn kind(&self) -> AttachmentKind {
        AttachmentKind::Web
    }

    fn build_message_contents(
        &self,
        attachments: &Attachments,
        _turn: &ConversationTurn,
        cx: &RenderContext,
    ) -> Vec<ContentBlock> {
        let results = &attachments.web.results;
        if results.is_empty() {
            return Vec::new();
        }

        let mut section = String::from("[Web Search Results]\n");
        if cx.is_last_turn {
            for result in results {
                section.push_str(&format!(
                    "- {} — {}\n  {}\n",
                    result.title, result.url, result.snippet
                ));
            }
            section.push_str(SECTION_SPLITTER);
        } else {
            section.push_str(&format!("{} results\n", results.len()));
        }

        let mut blocks = Vec::new();
        push_section(&mut blocks, section);
        blocks
    }
}

impl ToolCapable for WebProcessor {
    fn build_agent_tools(&self, attachments: &Attachments) -> Vec<ToolConfig> {
        if !attachments.web.tool.enabled {
            return Vec::new();
        }

        let descriptor = ToolDescriptor {
            name: WEB_TOOL_NAME.into(),
            description: "Search the web for up-to-date information. Returns result titles, URLs, and snippets.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    }
                },
                "required": ["query"]
            }),
        };

        let backend = self.backend.clone();
        let max_results = self.max_results;
        let callback = boxed_callback(move |input, signal| {
            let backend = backend.clone();
            async move {
                let query = input
                    .get("query")
                    .and_then(|q| q.as_str())
                    .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?
                    .to_string();

                // A failing back-end degrades to an empty result set.
                let results = match backend.search(&query, signal).await {
                    Ok(results) => results,
                    Err(e) => {
                        warn!(tool = WEB_TOOL_NAME, error = %e, "Web search back-end failed");
                        Vec::new()
                    }
                };

                let results: Vec<WebResult> = results
                    .into_iter()
                    .take(max_results)
                    .map(|mut r| {
                        r.source = ContextInfoSource::ToolResult;
                        r
                    })
                    .collect();

                serde_json::to_value(results).map_err(|e| ToolError::ExecutionFailed {
                    tool_name: WEB_TOOL_NAME.into(),
                    reason: e.to_string(),
                })
            }
        });

        let reconcile: ReconcileFn = Arc::new(|result, current| {
            let results: Vec<WebResult> =
                serde_json::from_value(result.clone()).map_err(|e| ToolError::ReconcileFailed {
                    tool_name: WEB_TOOL_NAME.into(),
                    reason: e.to_string(),
                })?;
            let items: Vec<AttachmentItem> =
                results.into_iter().map(AttachmentItem::WebResult).collect();
            Ok(add_items(
                current,
                &items,
                &MergePriority::none().deprioritize(ContextInfoSource::EditorMention),
            ))
        });

        vec![ToolConfig::new(descriptor, callback, reconcile)]
    }
}
