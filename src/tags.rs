use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use crate::event::Event;

static SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s,/\-]+").unwrap());

/// Canonical form of a site tag.
///
/// "Música / Dança" and "dança e música" both become "dança e música":
/// lowercased words, split on spaces, commas, slashes and hyphens, the
/// connective "e" dropped, deduplicated, sorted and re-joined with " e ".
pub fn normalize_tag(tag: &str) -> String {
    let lower = tag.trim().to_lowercase();
    let words: BTreeSet<&str> = SPLIT_RE
        .split(&lower)
        .filter(|w| !w.is_empty() && *w != "e")
        .collect();
    words.into_iter().collect::<Vec<_>>().join(" e ")
}

/// Normalized tag frequencies, most common first (ties alphabetical).
pub fn count_tags(events: &[Event]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for ev in events {
        let normalized = normalize_tag(&ev.tag);
        if !normalized.is_empty() {
            *counts.entry(normalized).or_insert(0) += 1;
        }
    }
    let mut sorted: Vec<_> = counts.into_iter().collect();
    sorted.sort_by(|(ta, ca), (tb, cb)| cb.cmp(ca).then_with(|| ta.cmp(tb)));
    sorted
}
