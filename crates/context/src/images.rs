//! Image processor — emits one image block per attached image.

use codeloom_core::attachment::{AttachmentKind, Attachments};
use codeloom_core::content::ContentBlock;
use codeloom_core::turn::ConversationTurn;

use crate::processor::{ContextProcessor, RenderContext};

pub struct ImagesProcessor;

impl ContextProcessor for ImagesProcessor {
    fn kind(&self) -> AttachmentKind {
        AttachmentKind::Images
    }

    fn build_message_contents(
        &self,
        attachments: &Attachments,
        _turn: &ConversationTurn,
        _cx: &RenderContext,
    ) -> Vec<ContentBlock> {
        attachments
            .images
            .iter()
            .map(|image| ContentBlock::image(&image.url))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeloom_core::attachment::{ContextInfoSource, ImageAttachment};

    #[test]
    fn images_become_image_blocks() {
        let mut attachments = Attachments::default();
        attachments.images.push(ImageAttachment {
            url: "https://example.com/screenshot.png".into(),
            source: ContextInfoSource::UserPicked,
        });

        let blocks = ImagesProcessor.build_message_contents(
            &attachments,
            &ConversationTurn::human("q"),
            &RenderContext { is_last_turn: true },
        );
        assert_eq!(
            blocks,
            vec![ContentBlock::image("https://example.com/screenshot.png")]
        );
    }

    #[test]
    fn no_images_no_blocks() {
        let blocks = ImagesProcessor.build_message_contents(
            &Attachments::default(),
            &ConversationTurn::human("q"),
            &RenderContext { is_last_turn: true },
        );
        assert!(blocks.is_empty());
    }
}
