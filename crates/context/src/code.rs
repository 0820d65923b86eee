//! Code snippet processor.
//!
//! One of the "live" kinds: the last turn renders snippet bodies followed by
//! the section splitter, historical turns keep only the path list.

use codeloom_core::attachment::{AttachmentKind, Attachments};
use codeloom_core::content::ContentBlock;
use codeloom_core::turn::ConversationTurn;

use crate::processor::{ContextProcessor, RenderContext, SECTION_SPLITTER, push_section};

pub struct CodeProcessor;

impl ContextProcessor for CodeProcessor {
    fn kind(&self) -> AttachmentKind {
        AttachmentKind::Code
    }

    fn build_message_contents(
        &self,
        attachments: &Attachments,
        _turn: &ConversationTurn,
        cx: &RenderContext,
    ) -> Vec<ContentBlock> {
        if attachments.code.is_empty() {
            return Vec::new();
        }

        let mut section = String::from("[Code Snippets]\n");
        for snippet in &attachments.code {
            if cx.is_last_turn {
                section.push_str(&format!(
                    "{}:\n```\n{}\n```\n",
                    snippet.relative_path, snippet.code
                ));
            } else {
                section.push_str(&format!("- {}\n", snippet.relative_path));
            }
        }
        if cx.is_last_turn {
            section.push_str(SECTION_SPLITTER);
        }

        let mut blocks = Vec::new();
        push_section(&mut blocks, section);
        blocks
    }
}
