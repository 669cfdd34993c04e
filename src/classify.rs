use std::collections::HashSet;

use scraper::ElementRef;

use crate::block::{BlockKind, ContentBlock};
use crate::normalize::{fingerprint, normalize, strip_credits, word_count};
use crate::Config;

/// Structural tags that may carry a block of article text.
const CANDIDATE_TAGS: &[&str] = &["p", "div", "h2", "h3"];

const HEADING_TAGS: &[&str] = &["h2", "h3"];

/// Inline markup that promotes a candidate to a subtitle.
const EMPHASIS_TAGS: &[&str] = &["strong", "em", "b"];

/// A retained text candidate before image placement.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub kind: BlockKind,
    /// Inner HTML, trimmed.
    pub html: String,
    /// Normalized, credit-free text.
    pub plain: String,
}

impl Candidate {
    fn plain_len(&self) -> usize {
        self.plain.chars().count()
    }

    fn into_block(self) -> ContentBlock {
        ContentBlock {
            kind: self.kind,
            content: self.html,
        }
    }
}

/// Turn a prepared article root into an ordered block sequence.
///
/// Collection runs over the direct children first and only falls back to
/// all descendants when that yields nothing. Text-less articles become a
/// run of images; a single dominant block is returned alone (plus trailing
/// images); everything else gets images interleaved between paragraphs.
pub fn classify(article: ElementRef<'_>, images: &[String], config: &Config) -> Vec<ContentBlock> {
    let mut candidates = collect_shallow(article, config);
    if candidates.is_empty() {
        candidates = collect_deep(article, config);
        if !candidates.is_empty() {
            tracing::debug!(count = candidates.len(), "deep fallback collected blocks");
        }
    }

    if candidates.is_empty() {
        return images.iter().map(ContentBlock::image).collect();
    }

    if let Some(index) = dominant_block(&candidates, config) {
        tracing::debug!(
            chars = candidates[index].plain_len(),
            "article collapsed to a single dominant block"
        );
        let block = candidates.swap_remove(index).into_block();
        let has_inline_image = block.content.to_ascii_lowercase().contains("<img");
        let mut out = vec![block];
        if !has_inline_image {
            out.extend(images.iter().map(ContentBlock::image));
        }
        return out;
    }

    interleave_images(candidates, images, config.images_every)
}

/// Stage A: direct element children only.
pub(crate) fn collect_shallow(article: ElementRef<'_>, config: &Config) -> Vec<Candidate> {
    collect(article.children().filter_map(ElementRef::wrap), config)
}

/// Stage B: every descendant element.
pub(crate) fn collect_deep(article: ElementRef<'_>, config: &Config) -> Vec<Candidate> {
    collect(
        article.descendants().skip(1).filter_map(ElementRef::wrap),
        config,
    )
}

fn collect<'a>(elements: impl Iterator<Item = ElementRef<'a>>, config: &Config) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    elements
        .filter(|el| CANDIDATE_TAGS.contains(&el.value().name()))
        .filter_map(|el| build_candidate(el, config))
        .filter(|c| seen.insert(fingerprint(&c.plain, config.fingerprint_len)))
        .collect()
}

fn build_candidate(el: ElementRef<'_>, config: &Config) -> Option<Candidate> {
    let raw: String = el.text().collect();
    let plain = strip_credits(&normalize(&raw));
    if word_count(&plain) < config.min_words {
        return None;
    }

    let kind = if HEADING_TAGS.contains(&el.value().name()) || has_emphasis(el) {
        BlockKind::Subtitle
    } else {
        BlockKind::Paragraph
    };

    Some(Candidate {
        kind,
        html: el.inner_html().trim().to_string(),
        plain,
    })
}

fn has_emphasis(el: ElementRef<'_>) -> bool {
    el.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|e| EMPHASIS_TAGS.contains(&e.value().name()))
}

/// Stage D: index of the block that holds a whole pasted release, if any.
///
/// Ties on the maximum length resolve to the first block in DOM order.
pub(crate) fn dominant_block(candidates: &[Candidate], config: &Config) -> Option<usize> {
    let lengths: Vec<usize> = candidates.iter().map(Candidate::plain_len).collect();
    let (index, max) = lengths
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best: Option<(usize, usize)>, (i, len)| match best {
            Some((_, m)) if m >= len => best,
            _ => Some((i, len)),
        })?;

    let mut sorted = lengths.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let second = sorted.get(1).copied().unwrap_or(0) as f64;
    let avg = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;

    let giant = max >= config.giant_block_chars;
    let dominant =
        max >= config.dominant_block_chars && max as f64 > config.dominant_ratio * second.max(avg);

    (giant || dominant).then_some(index)
}

/// Stage E: one image after every `every`-th paragraph, leftovers at the end.
///
/// Subtitles never advance the paragraph counter.
pub(crate) fn interleave_images(
    candidates: Vec<Candidate>,
    images: &[String],
    every: usize,
) -> Vec<ContentBlock> {
    let every = every.max(1);
    let mut pending = images.iter();
    let mut out = Vec::with_capacity(candidates.len() + images.len());
    let mut paragraphs = 0usize;

    for candidate in candidates {
        let is_paragraph = candidate.kind == BlockKind::Paragraph;
        out.push(candidate.into_block());
        if is_paragraph {
            paragraphs += 1;
            if paragraphs % every == 0 {
                if let Some(url) = pending.next() {
                    out.push(ContentBlock::image(url));
                }
            }
        }
    }

    out.extend(pending.map(ContentBlock::image));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const SENTENCE: &str = "A prefeitura abriu inscrições para oficinas culturais";

    fn with_article<R>(inner: &str, f: impl FnOnce(ElementRef<'_>) -> R) -> R {
        let doc = Html::parse_fragment(&format!("<article>{inner}</article>"));
        let root = doc
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "article")
            .unwrap();
        f(root)
    }

    fn images(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("https://img.example/{i}.jpg")).collect()
    }

    /// Distinct paragraph of roughly `len` characters.
    fn para_text(tag: usize, len: usize) -> String {
        let mut s = format!("Bloco {tag} ");
        while s.chars().count() < len {
            s.push_str("palavra ");
        }
        s.trim_end().to_string()
    }

    fn kinds(blocks: &[ContentBlock]) -> Vec<BlockKind> {
        blocks.iter().map(|b| b.kind).collect()
    }

    #[test]
    fn test_short_blocks_are_noise() {
        let blocks = with_article("<p>Só quatro palavras aqui</p>", |root| {
            classify(root, &[], &Config::default())
        });
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_heading_and_emphasis_become_subtitles() {
        let html = format!(
            "<h2>{SENTENCE}</h2><p><strong>Serviço:</strong> {SENTENCE} hoje</p><p>{SENTENCE} amanhã</p>"
        );
        let blocks = with_article(&html, |root| classify(root, &[], &Config::default()));
        assert_eq!(
            kinds(&blocks),
            vec![BlockKind::Subtitle, BlockKind::Subtitle, BlockKind::Paragraph]
        );
    }

    #[test]
    fn test_content_keeps_inner_html() {
        let html = format!("<p>{SENTENCE} com <a href=\"/x\">link</a></p>");
        let blocks = with_article(&html, |root| classify(root, &[], &Config::default()));
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, format!("{SENTENCE} com <a href=\"/x\">link</a>"));
    }

    #[test]
    fn test_duplicate_teaser_is_dropped() {
        let html = format!("<p>{SENTENCE}!</p><div>{SENTENCE}.</div><p>{SENTENCE} novamente</p>");
        let blocks = with_article(&html, |root| classify(root, &[], &Config::default()));
        // The second block differs only in punctuation from the first.
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_credit_only_block_is_noise() {
        let html = "<p>Fotos: João da Silva Pereira Santos</p>";
        let blocks = with_article(html, |root| classify(root, &[], &Config::default()));
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_deep_fallback() {
        let html = format!(
            "<section><span><p>{SENTENCE} um</p><p>{SENTENCE} dois</p></span></section>"
        );
        let blocks = with_article(&html, |root| {
            assert!(collect_shallow(root, &Config::default()).is_empty());
            classify(root, &[], &Config::default())
        });
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].content, format!("{SENTENCE} um"));
    }

    #[test]
    fn test_shallow_hit_skips_deep_pass() {
        let html = format!("<p>{SENTENCE} topo</p><section><p>{SENTENCE} aninhado</p></section>");
        let blocks = with_article(&html, |root| classify(root, &[], &Config::default()));
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_image_only_article() {
        let blocks = with_article("<p>curto</p>", |root| {
            classify(root, &images(2), &Config::default())
        });
        assert_eq!(
            blocks,
            vec![
                ContentBlock::image("https://img.example/1.jpg"),
                ContentBlock::image("https://img.example/2.jpg"),
            ]
        );
    }

    #[test]
    fn test_dominant_block_with_trailing_images() {
        let mut html = format!("<p>{}</p>", para_text(0, 700));
        for i in 1..=3 {
            html.push_str(&format!("<p>{}</p>", para_text(i, 50)));
        }
        let blocks = with_article(&html, |root| classify(root, &images(2), &Config::default()));
        assert_eq!(
            kinds(&blocks),
            vec![BlockKind::Paragraph, BlockKind::Image, BlockKind::Image]
        );
        assert!(blocks[0].content.starts_with("Bloco 0"));
    }

    #[test]
    fn test_dominant_block_with_inline_image_gets_no_trailing_images() {
        let html = format!(
            "<div><img src=\"/inline.jpg\"> {}</div><p>{}</p>",
            para_text(0, 650),
            para_text(1, 60)
        );
        let blocks = with_article(&html, |root| classify(root, &images(2), &Config::default()));
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].content.contains("<img"));
    }

    #[test]
    fn test_ratio_rule() {
        // 350 vs 60: above 300 and more than 1.6x both the runner-up and the mean.
        let html = format!("<p>{}</p><p>{}</p>", para_text(0, 350), para_text(1, 60));
        let blocks = with_article(&html, |root| classify(root, &[], &Config::default()));
        assert_eq!(blocks.len(), 1);

        // 350 vs 250: ratio rule not met, no giant block.
        let html = format!("<p>{}</p><p>{}</p>", para_text(0, 350), para_text(1, 250));
        let blocks = with_article(&html, |root| classify(root, &[], &Config::default()));
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let html = format!("<p>{}</p><p>{}</p>", para_text(0, 350), para_text(1, 60));
        let config = Config::default().with_dominant_block_chars(1000);
        let blocks = with_article(&html, |root| classify(root, &[], &config));
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_interleave_every_second_paragraph() {
        let html: String = (1..=5).map(|i| format!("<p>{}</p>", para_text(i, 80))).collect();
        let blocks = with_article(&html, |root| classify(root, &images(3), &Config::default()));
        assert_eq!(blocks.len(), 8);
        assert_eq!(
            kinds(&blocks),
            vec![
                BlockKind::Paragraph,
                BlockKind::Paragraph,
                BlockKind::Image,
                BlockKind::Paragraph,
                BlockKind::Paragraph,
                BlockKind::Image,
                BlockKind::Paragraph,
                BlockKind::Image,
            ]
        );
        assert_eq!(blocks[2].content, "https://img.example/1.jpg");
        assert_eq!(blocks[5].content, "https://img.example/2.jpg");
        assert_eq!(blocks[7].content, "https://img.example/3.jpg");
    }

    #[test]
    fn test_subtitles_do_not_advance_image_counter() {
        let html = format!(
            "<h3>{SENTENCE} título</h3><p>{}</p><h2>{SENTENCE} outro</h2><p>{}</p>",
            para_text(1, 80),
            para_text(2, 80)
        );
        let blocks = with_article(&html, |root| classify(root, &images(1), &Config::default()));
        assert_eq!(
            kinds(&blocks),
            vec![
                BlockKind::Subtitle,
                BlockKind::Paragraph,
                BlockKind::Subtitle,
                BlockKind::Paragraph,
                BlockKind::Image,
            ]
        );
    }

    #[test]
    fn test_deterministic() {
        let html: String = (1..=4).map(|i| format!("<p>{}</p>", para_text(i, 120))).collect();
        let a = with_article(&html, |root| classify(root, &images(2), &Config::default()));
        let b = with_article(&html, |root| classify(root, &images(2), &Config::default()));
        assert_eq!(a, b);
    }
}
