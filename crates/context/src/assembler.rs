//! The message assembler.
//!
//! Walks a conversation's turns in order, asks each turn's processors for
//! content blocks, and concatenates them into the final message list handed
//! to the model runtime. Historical turns are read as frozen snapshots;
//! `is_last_turn` is true only for the final turn, which is the single
//! mutable, "live" turn during the tool-call loop.

use tracing::debug;

use codeloom_core::content::ContentBlock;
use codeloom_core::model::ChatMessage;
use codeloom_core::turn::ChatContext;

use crate::processor::RenderContext;
use crate::set::ProcessorSet;

/// The assembler. Stateless — create one and reuse it.
pub struct MessageAssembler;

impl MessageAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Render every turn into one role-tagged message.
    ///
    /// Attachment sections come first, the turn's own text last, so the
    /// model reads context before the question it qualifies.
    pub fn assemble(&self, context: &ChatContext, processors: &ProcessorSet) -> Vec<ChatMessage> {
        let turn_count = context.conversations.len();

        let messages: Vec<ChatMessage> = context
            .conversations
            .iter()
            .enumerate()
            .map(|(index, turn)| {
                let cx = RenderContext {
                    is_last_turn: index + 1 == turn_count,
                };

                let mut blocks: Vec<ContentBlock> = Vec::new();
                for processor in processors.renderers() {
                    blocks.extend(processor.build_message_contents(&turn.attachments, turn, &cx));
                }
                if !turn.text.is_empty() {
                    blocks.push(ContentBlock::text(&turn.text));
                }

                ChatMessage::new(turn.role, blocks)
            })
            .collect();

        debug!(
            context_id = %context.id,
            turns = turn_count,
            "Assembled conversation messages"
        );
        messages
    }
}

impl Default for MessageAssembler {
    fn default() -> Self {
        Self::new()
    }
}
