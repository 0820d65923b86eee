//! Content blocks — the typed units of model message content.
//!
//! Processors render attachments into blocks; the assembler concatenates
//! blocks into role-tagged messages for the model runtime.

use serde::{Deserialize, Serialize};

/// A single typed block of message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    /// Plain text content.
    Text { text: String },
    /// An image referenced by URL (data: or https:).
    Image { url: String },
}

impl ContentBlock {
    /// Create a text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create an image block.
    pub fn image(url: impl Into<String>) -> Self {
        Self::Image { url: url.into() }
    }

    /// The text content, if this is a text block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Image { .. } => None,
        }
    }
}

/// Flatten a block list into one plain-text string (images rendered as URLs).
/// Useful for logging and for runtimes that only accept text.
pub fn blocks_to_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .map(|b| match b {
            ContentBlock::Text { text } => text.clone(),
            ContentBlock::Image { url } => format!("[image: {url}]"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_serialization_tags_type() {
        let block = ContentBlock::text("hello");
        let json = serde_json::to_string(&block).unwrap();
        assert!(json.contains("\"type\":\"text\""));

        let image = ContentBlock::image("https://example.com/a.png");
        let json = serde_json::to_string(&image).unwrap();
        assert!(json.contains("\"type\":\"image\""));
    }

    #[test]
    fn blocks_to_text_renders_images_inline() {
        let blocks = vec![
            ContentBlock::text("before"),
            ContentBlock::image("https://example.com/x.png"),
        ];
        let text = blocks_to_text(&blocks);
        assert!(text.contains("before"));
        assert!(text.contains("[image: https://example.com/x.png]"));
    }
}
