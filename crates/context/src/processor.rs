//! The processor interface: one implementation per attachment kind.
//!
//! A processor renders its kind's items into content blocks; tool-capable
//! kinds additionally advertise callable tool descriptors. Whether the
//! owning turn is the *last* turn is threaded explicitly into every call —
//! only the last turn renders live, expensive context.

use codeloom_core::attachment::{AttachmentKind, Attachments};
use codeloom_core::content::ContentBlock;
use codeloom_core::tool::ToolConfig;
use codeloom_core::turn::ConversationTurn;

/// Marker appended after the last turn's expensive sections so the model can
/// tell live context apart from the surrounding prose.
pub const SECTION_SPLITTER: &str = "\n---";

/// Per-call rendering inputs.
///
/// `is_last_turn` is the live/compacted switch: the last turn renders full
/// bodies, historical turns render bounded summaries.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    pub is_last_turn: bool,
}

/// Renders one attachment kind into model message content.
///
/// A kind with zero items must return an empty vec — never a block holding
/// only a section header.
pub trait ContextProcessor: Send + Sync {
    /// Which kind this processor owns.
    fn kind(&self) -> AttachmentKind;

    /// Render the kind's current items into zero or more content blocks.
    fn build_message_contents(
        &self,
        attachments: &Attachments,
        turn: &ConversationTurn,
        cx: &RenderContext,
    ) -> Vec<ContentBlock>;
}

/// The explicit capability interface for tool-capable kinds (Web, Docs,
/// Codebase). A kind is tool-capable if and only if its processor
/// implements this trait, so the set is statically enumerable.
pub trait ToolCapable: ContextProcessor {
    /// Advertise this kind's callable tools for the current turn.
    ///
    /// Returns zero descriptors when the kind's enable flag is off or the
    /// kind has no eligible targets.
    fn build_agent_tools(&self, attachments: &Attachments) -> Vec<ToolConfig>;
}

/// Push a text block only when the section actually has content.
pub(crate) fn push_section(blocks: &mut Vec<ContentBlock>, section: String) {
    if !section.is_empty() {
        blocks.push(ContentBlock::text(section));
    }
}
