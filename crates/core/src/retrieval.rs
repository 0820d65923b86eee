//! Retrieval back-end boundary — web search, doc search, codebase search.
//!
//! Back-ends are side-effect-free from the engine's point of view and are
//! invoked only via tool callbacks. Every call accepts a cancellation token;
//! a back-end that errors yields `Err` and the calling tool degrades it to
//! an empty result set, so reconciliation always folds a well-defined value.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::attachment::{CodebaseHit, DocResult, DocSite, WebResult};
use crate::error::RetrievalError;

/// Web search back-end.
#[async_trait]
pub trait WebSearchBackend: Send + Sync {
    async fn search(
        &self,
        query: &str,
        signal: CancellationToken,
    ) -> Result<Vec<WebResult>, RetrievalError>;
}

/// Documentation search back-end, restricted to an allow-list of sites.
#[async_trait]
pub trait DocSearchBackend: Send + Sync {
    async fn search(
        &self,
        query: &str,
        sites: &[DocSite],
        signal: CancellationToken,
    ) -> Result<Vec<DocResult>, RetrievalError>;
}

/// Codebase similarity-search back-end.
#[async_trait]
pub trait CodebaseSearchBackend: Send + Sync {
    async fn search(
        &self,
        query: &str,
        signal: CancellationToken,
    ) -> Result<Vec<CodebaseHit>, RetrievalError>;
}
