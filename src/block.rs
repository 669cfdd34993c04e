use serde::{Deserialize, Serialize};

use crate::normalize::plain_text;

/// Kind of a content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockKind {
    Subtitle,
    Paragraph,
    #[serde(alias = "IMAGE_URL")]
    Image,
}

/// One typed unit of article content, in display order.
///
/// For text kinds `content` is the element's inner HTML (inline formatting
/// kept for rendering); for [`BlockKind::Image`] it is an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(alias = "type")]
    pub kind: BlockKind,
    pub content: String,
}

impl ContentBlock {
    pub fn subtitle(html: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Subtitle,
            content: html.into(),
        }
    }

    pub fn paragraph(html: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            content: html.into(),
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Image,
            content: url.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.kind == BlockKind::Image
    }

    /// Plain text of a text block; `None` for images.
    pub fn plain_text(&self) -> Option<String> {
        if self.is_image() {
            None
        } else {
            Some(plain_text(&self.content))
        }
    }
}
