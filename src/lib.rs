//! Event scraping and archival for the Funcultural news listing.
//!
//! The crate turns noisy news-article HTML into an ordered list of typed
//! content blocks (subtitle / paragraph / image), gives each event a stable
//! content-derived id, and partitions stored events by the year they
//! happened in.
//!
//! # Quick start
//!
//! ```rust
//! use funcultural::{segment_html, BlockKind, Config};
//! use scraper::Selector;
//! use url::Url;
//!
//! let html = r#"<html><body><article class="noticia-conteudo">
//!     <p>O festival reúne grupos de teatro de todo o estado.</p>
//! </article></body></html>"#;
//! let selector = Selector::parse("article.noticia-conteudo").unwrap();
//! let base = Url::parse("https://funcultural.portovelho.ro.gov.br").unwrap();
//!
//! let blocks = segment_html(html, &selector, &base, &Config::default()).unwrap();
//! assert_eq!(blocks[0].kind, BlockKind::Paragraph);
//! ```

pub mod archive;
mod block;
mod classify;
pub mod crawl;
mod error;
mod event;
pub mod fetch;
mod identity;
pub mod normalize;
mod preprocess;
pub mod render;
pub mod settings;
pub mod storage;
pub mod tags;
pub mod temporal;

pub use archive::{Archiver, YearPartition};
pub use block::{BlockKind, ContentBlock};
pub use classify::classify;
pub use error::{Error, FetchError};
pub use event::Event;
pub use identity::{dedup_events, event_id, CrawlSession};
pub use preprocess::{prepare_article, PreparedArticle};
pub use temporal::resolve_year;

use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

/// Tuning for the block classifier.
///
/// Defaults match the behavior the published collections were built with.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct Config {
    /// Blocks with fewer words than this are dropped.
    pub min_words: usize,
    /// Leading alphanumeric characters compared for near-duplicate blocks.
    pub fingerprint_len: usize,
    /// A block at least this long is always treated as the article body.
    pub giant_block_chars: usize,
    /// Minimum length for the ratio-based dominant block rule.
    pub dominant_block_chars: usize,
    pub dominant_ratio: f64,
    /// Interleave one image after this many paragraphs.
    pub images_every: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_words: 5,
            fingerprint_len: 80,
            giant_block_chars: 600,
            dominant_block_chars: 300,
            dominant_ratio: 1.6,
            images_every: 2,
        }
    }
}

impl Config {
    pub fn with_min_words(mut self, n: usize) -> Self {
        self.min_words = n;
        self
    }
    pub fn with_fingerprint_len(mut self, n: usize) -> Self {
        self.fingerprint_len = n;
        self
    }
    pub fn with_giant_block_chars(mut self, n: usize) -> Self {
        self.giant_block_chars = n;
        self
    }
    pub fn with_dominant_block_chars(mut self, n: usize) -> Self {
        self.dominant_block_chars = n;
        self
    }
    pub fn with_dominant_ratio(mut self, v: f64) -> Self {
        self.dominant_ratio = v;
        self
    }
    pub fn with_images_every(mut self, n: usize) -> Self {
        self.images_every = n;
        self
    }
}

/// Segment a parsed article page into content blocks.
///
/// Returns `None` when the page has no node matching `article_selector`.
/// An article with no qualifying text or images yields an empty list.
pub fn segment_article(
    page: &Html,
    article_selector: &Selector,
    site_base: &Url,
    config: &Config,
) -> Option<Vec<ContentBlock>> {
    let article = prepare_article(page, article_selector, site_base)?;
    let root = article.root()?;
    Some(classify(root, &article.images, config))
}

/// Convenience: parse `html` and run [`segment_article`].
pub fn segment_html(
    html: &str,
    article_selector: &Selector,
    site_base: &Url,
    config: &Config,
) -> Option<Vec<ContentBlock>> {
    segment_article(&Html::parse_document(html), article_selector, site_base, config)
}
