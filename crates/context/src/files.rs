//! File and folder processors.
//!
//! Files carry full bodies and are the most expensive kind: only the last
//! turn renders content, historical turns keep the path list so the model
//! still sees what was attached.

use codeloom_core::attachment::{AttachmentKind, Attachments};
use codeloom_core::content::ContentBlock;
use codeloom_core::turn::ConversationTurn;

use crate::processor::{ContextProcessor, RenderContext, push_section};

pub struct FilesProcessor;

impl ContextProcessor for FilesProcessor {
    fn kind(&self) -> AttachmentKind {
        AttachmentKind::Files
    }

    fn build_message_contents(
        &self,
        attachments: &Attachments,
        _turn: &ConversationTurn,
        cx: &RenderContext,
    ) -> Vec<ContentBlock> {
        if attachments.files.is_empty() {
            return Vec::new();
        }

        let mut section = String::from("[Attached Files]\n");
        for file in &attachments.files {
            if cx.is_last_turn {
                section.push_str(&format!("{}:\n```\n{}\n```\n", file.full_path, file.content));
            } else {
                section.push_str(&format!("- {}\n", file.full_path));
            }
        }

        let mut blocks = Vec::new();
        push_section(&mut blocks, section);
        blocks
    }
}

pub struct FoldersProcessor;

impl ContextProcessor for FoldersProcessor {
    fn kind(&self) -> AttachmentKind {
        AttachmentKind::Folders
    }

    fn build_message_contents(
        &self,
        attachments: &Attachments,
        _turn: &ConversationTurn,
        _cx: &RenderContext,
    ) -> Vec<ContentBlock> {
        if attachments.folders.is_empty() {
            return Vec::new();
        }

        let mut section = String::from("[Attached Folders]\n");
        for folder in &attachments.folders {
            section.push_str(&format!("- {}\n", folder.full_path));
        }

        let mut blocks = Vec::new();
        push_section(&mut blocks, section);
        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeloom_core::attachment::{ContextInfoSource, FileAttachment, FolderAttachment};

    fn attachments_with_file() -> Attachments {
        let mut attachments = Attachments::default();
        attachments.files.push(FileAttachment {
            full_path: "/w/src/main.rs".into(),
            content: "fn main() {}".into(),
            source: ContextInfoSource::UserPicked,
        });
        attachments
    }

    #[test]
    fn empty_files_render_nothing() {
        let blocks = FilesProcessor.build_message_contents(
            &Attachments::default(),
            &ConversationTurn::human("q"),
            &RenderContext { is_last_turn: true },
        );
        assert!(blocks.is_empty());
    }

    #[test]
    fn last_turn_renders_file_bodies() {
        let blocks = FilesProcessor.build_message_contents(
            &attachments_with_file(),
            &ConversationTurn::human("q"),
            &RenderContext { is_last_turn: true },
        );
        assert_eq!(blocks.len(), 1);
        let text = blocks[0].as_text().unwrap();
        assert!(text.contains("/w/src/main.rs"));
        assert!(text.contains("fn main() {}"));
    }

    #[test]
    fn historical_turn_omits_file_bodies() {
        let blocks = FilesProcessor.build_message_contents(
            &attachments_with_file(),
            &ConversationTurn::human("q"),
            &RenderContext {
                is_last_turn: false,
            },
        );
        let text = blocks[0].as_text().unwrap();
        assert!(text.contains("/w/src/main.rs"));
        assert!(!text.contains("fn main() {}"));
    }

    #[test]
    fn folders_render_path_list() {
        let mut attachments = Attachments::default();
        attachments.folders.push(FolderAttachment {
            full_path: "/w/src".into(),
            source: ContextInfoSource::EditorMention,
        });
        let blocks = FoldersProcessor.build_message_contents(
            &attachments,
            &ConversationTurn::human("q"),
            &RenderContext { is_last_turn: true },
        );
        assert!(blocks[0].as_text().unwrap().contains("- /w/src"));
    }
}
