//! Doc search processor — tool-capable.
//!
//! `search_docs` is advertised only when the toggle is on *and* the site
//! allow-list is non-empty; there is nothing to search otherwise.

use std::sync::Arc;

use tracing::warn;

use codeloom_core::attachment::{
    AttachmentItem, AttachmentKind, Attachments, ContextInfoSource, DocResult,
};
use codeloom_core::content::ContentBlock;
use codeloom_core::error::ToolError;
use codeloom_core::model::ToolDescriptor;
use codeloom_core::retrieval::DocSearchBackend;
use codeloom_core::tool::{ReconcileFn, ToolConfig, boxed_callback};
use codeloom_core::turn::ConversationTurn;
use codeloom_store::{MergePriority, add_items};

use crate::processor::{
    ContextProcessor, RenderContext, SECTION_SPLITTER, ToolCapable, push_section,
};

pub const DOCS_TOOL_NAME: &str = "search_docs";

pub struct DocsProcessor {
    backend: Arc<dyn DocSearchBackend>,
    max_results: usize,
}

impl DocsProcessor {
    pub fn new(backend: Arc<dyn DocSearchBackend>) -> Self {
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

impl ContextProcessor for DocsProcessor {
    fn kind(&self) -> AttachmentKind {
        AttachmentKind::Docs
    }

    fn build_message_contents(
        &self,
        attachments: &Attachments,
        _turn: &ConversationTurn,
        cx: &RenderContext,
    ) -> Vec<ContentBlock> {
        let results = &attachments.docs.results;
        if results.is_empty() {
            return Vec::new();
        }

        let mut section = String::from("[Documentation]\n");
        if cx.is_last_turn {
            for result in results {
                section.push_str(&format!(
                    "- [{}] {}\n  {}\n",
                    result.site, result.url, result.excerpt
                ));
            }
            section.push_str(SECTION_SPLITTER);
        } else {
            section.push_str(&format!("{} excerpts\n", results.len()));
        }

        let mut blocks = Vec::new();
        push_section(&mut blocks, section);
        blocks
    }
}

impl ToolCapable for DocsProcessor {
    fn build_agent_tools(&self, attachments: &Attachments) -> Vec<ToolConfig> {
        if !attachments.docs.tool.enabled || attachments.docs.sites.is_empty() {
            return Vec::new();
        }

        let site_names: Vec<String> = attachments
            .docs
            .sites
            .iter()
            .map(|s| s.name.clone())
            .collect();
        let descriptor = ToolDescriptor {
            name: DOCS_TOOL_NAME.into(),
            description: format!(
                "Search documentation on the allow-listed sites: {}.",
                site_names.join(", ")
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The documentation search query"
                    }
                },
                "required": ["query"]
            }),
        };

        let backend = self.backend.clone();
        let sites = attachments.docs.sites.clone();
        let max_results = self.max_results;
        let callback = boxed_callback(move |input, signal| {
            let backend = backend.clone();
            let sites = sites.clone();
            async move {
                let query = input
                    .get("query")
                    .and_then(|q| q.as_str())
                    .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?
                    .to_string();

                let results = match backend.search(&query, &sites, signal).await {
                    Ok(results) => results,
                    Err(e) => {
                        warn!(tool = DOCS_TOOL_NAME, error = %e, "Doc search back-end failed");
                        Vec::new()
                    }
                };

                let results: Vec<DocResult> = results
                    .into_iter()
                    .take(max_results)
                    .map(|mut r| {
                        r.source = ContextInfoSource::ToolResult;
                        r
                    })
                    .collect();

                serde_json::to_value(results).map_err(|e| ToolError::ExecutionFailed {
                    tool_name: DOCS_TOOL_NAME.into(),
                    reason: e.to_string(),
                })
            }
        });

        let reconcile: ReconcileFn = Arc::new(|result, current| {
            let results: Vec<DocResult> =
                serde_json::from_value(result.clone()).map_err(|e| ToolError::ReconcileFailed {
                    tool_name: DOCS_TOOL_NAME.into(),
                    reason: e.to_string(),
                })?;
            let items: Vec<AttachmentItem> =
                results.into_iter().map(AttachmentItem::DocResult).collect();
            Ok(add_items(
                current,
                &items,
                &MergePriority::none().deprioritize(ContextInfoSource::EditorMention),
            ))
        });

        vec![ToolConfig::new(descriptor, callback, reconcile)]
    }
}
