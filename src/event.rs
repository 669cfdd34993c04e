use serde::{Deserialize, Serialize};

use crate::block::ContentBlock;
use crate::identity::event_id;

/// One announcement scraped from the news listing.
///
/// The stable id is derived from `title` and `link` and is never stored;
/// see [`Event::id`]. Older collections written with Portuguese keys are
/// still accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(alias = "titulo")]
    pub title: String,
    #[serde(default, alias = "tag_evento")]
    pub tag: String,
    #[serde(default, alias = "blocos_conteudo")]
    pub blocks: Vec<ContentBlock>,
    #[serde(default, alias = "imagem_url")]
    pub banner_image_url: String,
    #[serde(alias = "link_evento")]
    pub link: String,
    #[serde(default, alias = "fonte")]
    pub source: String,
    #[serde(default, alias = "data_exibicao")]
    pub displayed_date: String,
}

impl Event {
    pub fn id(&self) -> String {
        event_id(&self.title, &self.link)
    }

    /// Plain texts of the text blocks, in order. Images are skipped.
    pub fn block_texts(&self) -> Vec<String> {
        self.blocks.iter().filter_map(ContentBlock::plain_text).collect()
    }
}
