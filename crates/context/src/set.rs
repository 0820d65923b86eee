//! The full processor set: one processor per attachment kind, rebuilt
//! per session from the wired retrieval back-ends.

use std::sync::Arc;

use codeloom_core::retrieval::{CodebaseSearchBackend, DocSearchBackend, WebSearchBackend};

use crate::code::CodeProcessor;
use crate::codebase::CodebaseProcessor;
use crate::docs::DocsProcessor;
use crate::files::{FilesProcessor, FoldersProcessor};
use crate::git::{GitCommitsProcessor, GitDiffsProcessor, GitPullRequestsProcessor};
use crate::images::ImagesProcessor;
use crate::processor::{ContextProcessor, ToolCapable};
use crate::web::WebProcessor;

/// The retrieval back-ends the tool-capable processors call into.
#[derive(Clone)]
pub struct RetrievalBackends {
    pub web: Arc<dyn WebSearchBackend>,
    pub docs: Arc<dyn DocSearchBackend>,
    pub codebase: Arc<dyn CodebaseSearchBackend>,
}

impl RetrievalBackends {
    /// Back-ends that always return empty result sets. Useful for sessions
    /// with retrieval disabled and for tests.
    pub fn noop() -> Self {
        Self {
            web: Arc::new(noop::NoopSearch),
            docs: Arc::new(noop::NoopSearch),
            codebase: Arc::new(noop::NoopSearch),
        }
    }
}

/// All ten processors in kind order.
///
/// The render list covers every kind; the tool-capable list is exactly the
/// statically known capability set (Web, Docs, Codebase).
pub struct ProcessorSet {
    renderers: Vec<Arc<dyn ContextProcessor>>,
    tool_capable: Vec<Arc<dyn ToolCapable>>,
}

impl ProcessorSet {
    /// Build the set with the default per-tool result cap.
    pub fn new(backends: RetrievalBackends) -> Self {
        Self::with_max_results(backends, 5)
    }

    /// Build the set, capping every retrieval tool at `max_results`.
    pub fn with_max_results(backends: RetrievalBackends, max_results: usize) -> Self {
        let web = Arc::new(WebProcessor::new(backends.web).with_max_results(max_results));
        let docs = Arc::new(DocsProcessor::new(backends.docs).with_max_results(max_results));
        let codebase =
            Arc::new(CodebaseProcessor::new(backends.codebase).with_max_results(max_results));

        let renderers: Vec<Arc<dyn ContextProcessor>> = vec![
            Arc::new(FilesProcessor),
            Arc::new(FoldersProcessor),
            Arc::new(ImagesProcessor),
            Arc::new(GitCommitsProcessor),
            Arc::new(GitDiffsProcessor),
            Arc::new(GitPullRequestsProcessor),
            web.clone(),
            docs.clone(),
            Arc::new(CodeProcessor),
            codebase.clone(),
        ];
        let tool_capable: Vec<Arc<dyn ToolCapable>> = vec![web, docs, codebase];

        Self {
            renderers,
            tool_capable,
        }
    }

    /// Every processor, in render order.
    pub fn renderers(&self) -> impl Iterator<Item = &dyn ContextProcessor> {
        self.renderers.iter().map(|p| p.as_ref())
    }

    /// The tool-capable processors only.
    pub fn tool_capable(&self) -> impl Iterator<Item = &dyn ToolCapable> {
        self.tool_capable.iter().map(|p| p.as_ref())
    }
}

mod noop {
    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use codeloom_core::attachment::{CodebaseHit, DocResult, DocSite, WebResult};
    use codeloom_core::error::RetrievalError;
    use codeloom_core::retrieval::{CodebaseSearchBackend, DocSearchBackend, WebSearchBackend};

    pub struct NoopSearch;

    #[async_trait]
    impl WebSearchBackend for NoopSearch {
        async fn search(
            &self,
            _query: &str,
            _signal: CancellationToken,
        ) -> Result<Vec<WebResult>, RetrievalError> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl DocSearchBackend for NoopSearch {
        async fn search(
            &self,
            _query: &str,
            _sites: &[DocSite],
            _signal: CancellationToken,
        ) -> Result<Vec<DocResult>, RetrievalError> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl CodebaseSearchBackend for NoopSearch {
        async fn search(
            &self,
            _query: &str,
            _signal: CancellationToken,
        ) -> Result<Vec<CodebaseHit>, RetrievalError> {
            Ok(Vec::new())
        }
    }
}
