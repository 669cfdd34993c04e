use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Photographer / author credit lines appended to captions and paragraphs,
/// e.g. "Fotos: Fulano de Tal". Runs up to, not including, the next period.
static CREDIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:fotos?|texto)\s*:[^.]*").unwrap());

/// Canonicalize raw text.
///
/// Applies Unicode NFC composition, strips embedded HTML tags, turns
/// no-break spaces into plain spaces, collapses whitespace runs and trims.
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let composed: String = raw.nfc().collect();
    let untagged = TAG_RE.replace_all(&composed, "");
    let spaced = untagged.replace('\u{00A0}', " ");
    collapse_whitespace(&spaced)
}

/// Remove photo/text credit runs, then re-collapse whitespace.
pub fn strip_credits(text: &str) -> String {
    let stripped = CREDIT_RE.replace_all(text, " ");
    collapse_whitespace(&stripped)
}

/// Plain text of an HTML fragment: tags become spaces so adjacent
/// elements do not glue their words together.
pub fn plain_text(html: &str) -> String {
    let spaced = TAG_RE.replace_all(html, " ");
    normalize(&spaced)
}

fn collapse_whitespace(text: &str) -> String {
    WS_RE.replace_all(text, " ").trim().to_string()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Cheap duplicate-content key: lowercase alphanumerics only, truncated
/// to `len` characters. Not a hash; collisions only mean "same opening".
pub fn fingerprint(text: &str, len: usize) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .take(len)
        .collect()
}
