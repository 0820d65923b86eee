//! Tool capability types — what a processor declares when it is tool-capable.
//!
//! A `ToolConfig` bundles the descriptor advertised to the model, the async
//! callback that executes the call, and the pure `reconcile` function that
//! folds the raw result back into an `Attachments` value. Configs are
//! stateless and rebuilt per turn.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::attachment::Attachments;
use crate::error::ToolError;
use crate::model::ToolDescriptor;

/// Boxed future returned by a tool callback.
pub type ToolFuture =
    Pin<Box<dyn Future<Output = std::result::Result<serde_json::Value, ToolError>> + Send>>;

/// The async callback executed when the model calls the tool.
///
/// Accepts the model-provided input and a cancellation signal; the manager
/// wraps the await in a hard timeout.
pub type ToolCallbackFn =
    Arc<dyn Fn(serde_json::Value, CancellationToken) -> ToolFuture + Send + Sync>;

/// The pure function folding a raw tool result into a new attachment value.
pub type ReconcileFn = Arc<
    dyn Fn(&serde_json::Value, &Attachments) -> std::result::Result<Attachments, ToolError>
        + Send
        + Sync,
>;

/// A processor-declared, model-callable capability tied to one attachment
/// kind.
#[derive(Clone)]
pub struct ToolConfig {
    /// Name, description, and input schema advertised to the model.
    pub descriptor: ToolDescriptor,

    /// Executes the call.
    pub callback: ToolCallbackFn,

    /// Folds the callback's result back into the owning attachment kind.
    pub reconcile: ReconcileFn,
}

impl ToolConfig {
    pub fn new(descriptor: ToolDescriptor, callback: ToolCallbackFn, reconcile: ReconcileFn) -> Self {
        Self {
            descriptor,
            callback,
            reconcile,
        }
    }
}

impl std::fmt::Debug for ToolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolConfig")
            .field("name", &self.descriptor.name)
            .finish_non_exhaustive()
    }
}

/// Wrap an async closure into a [`ToolCallbackFn`].
pub fn boxed_callback<F, Fut>(f: F) -> ToolCallbackFn
where
    F: Fn(serde_json::Value, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<serde_json::Value, ToolError>> + Send + 'static,
{
    Arc::new(move |input, signal| Box::pin(f(input, signal)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn boxed_callback_invokes_closure() {
        let callback = boxed_callback(|input, _signal| async move {
            Ok(serde_json::json!({ "echo": input }))
        });
        let out = callback(serde_json::json!("hi"), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out["echo"], "hi");
    }
}
