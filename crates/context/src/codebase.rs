//! Codebase retrieval processor — tool-capable.
//!
//! `search_codebase` runs similarity search over the workspace index and
//! folds hits into the Codebase collection.

use std::sync::Arc;

use tracing::warn;

use codeloom_core::attachment::{
    AttachmentItem, AttachmentKind, Attachments, CodebaseHit, ContextInfoSource,
};
use codeloom_core::content::ContentBlock;
use codeloom_core::error::ToolError;
use codeloom_core::model::ToolDescriptor;
use codeloom_core::retrieval::CodebaseSearchBackend;
use codeloom_core::tool::{ReconcileFn, ToolConfig, boxed_callback};
use codeloom_core::turn::ConversationTurn;
use codeloom_store::{MergePriority, add_items};

use crate::processor::{
    ContextProcessor, RenderContext, SECTION_SPLITTER, ToolCapable, push_section,
};

pub const CODEBASE_TOOL_NAME: &str = "search_codebase";

pub struct CodebaseProcessor {
    backend: Arc<dyn CodebaseSearchBackend>,
    max_results: usize,
}

impl CodebaseProcessor {
    pub fn new(backend: Arc<dyn CodebaseSearchBackend>) -> Self {
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

impl ContextProcessor for CodebaseProcessor {
    fn kind(&self) -> AttachmentKind {
        AttachmentKind::Codebase
    }

    fn build_message_contents(
        &self,
        attachments: &Attachments,
        _turn: &ConversationTurn,
        cx: &RenderContext,
    ) -> Vec<ContentBlock> {
        let hits = &attachments.codebase.hits;
        if hits.is_empty() {
            return Vec::new();
        }

        let mut section = String::from("[Codebase Context]\n");
        if cx.is_last_turn {
            for hit in hits {
                section.push_str(&format!("{}:\n```\n{}\n```\n", hit.path, hit.snippet));
            }
            section.push_str(SECTION_SPLITTER);
        } else {
            section.push_str(&format!("{} snippets\n", hits.len()));
        }

        let mut blocks = Vec::new();
        push_section(&mut blocks, section);
        blocks
    }
}

impl ToolCapable for CodebaseProcessor {
    fn build_agent_tools(&self, attachments: &Attachments) -> Vec<ToolConfig> {
        if !attachments.codebase.tool.enabled {
            return Vec::new();
        }

        let descriptor = ToolDescriptor {
            name: CODEBASE_TOOL_NAME.into(),
            description: "Retrieve the most relevant code snippets from the current workspace for a natural-language query.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to look for in the codebase"
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

                let hits = match backend.search(&query, signal).await {
                    Ok(hits) => hits,
                    Err(e) => {
                        warn!(tool = CODEBASE_TOOL_NAME, error = %e, "Codebase search back-end failed");
                        Vec::new()
                    }
                };

                let hits: Vec<CodebaseHit> = hits
                    .into_iter()
                    .take(max_results)
                    .map(|mut h| {
                        h.source = ContextInfoSource::ToolResult;
                        h
                    })
                    .collect();

                serde_json::to_value(hits).map_err(|e| ToolError::ExecutionFailed {
                    tool_name: CODEBASE_TOOL_NAME.into(),
                    reason: e.to_string(),
                })
            }
        });

        let reconcile: ReconcileFn = Arc::new(|result, current| {
            let hits: Vec<CodebaseHit> =
                serde_json::from_value(result.clone()).map_err(|e| ToolError::ReconcileFailed {
                    tool_name: CODEBASE_TOOL_NAME.into(),
                    reason: e.to_string(),
                })?;
            let items: Vec<AttachmentItem> =
                hits.into_iter().map(AttachmentItem::CodebaseHit).collect();
            Ok(add_items(
                current,
                &items,
                &MergePriority::none().deprioritize(ContextInfoSource::EditorMention),
            ))
        });

        vec![ToolConfig::new(descriptor, callback, reconcile)]
    }
}
