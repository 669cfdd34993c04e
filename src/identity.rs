use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::event::Event;
use crate::normalize::normalize;

/// Stable id for an event: SHA-256 hex of `normalize(title)|normalize(link)`.
pub fn event_id(title: &str, link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(title).as_bytes());
    hasher.update(b"|");
    hasher.update(normalize(link).as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Keep the first event for each id, in input order.
///
/// Returns the survivors and the number of dropped duplicates.
pub fn dedup_events(events: Vec<Event>) -> (Vec<Event>, usize) {
    let mut seen = HashSet::with_capacity(events.len());
    let mut kept = Vec::with_capacity(events.len());
    let mut dropped = 0usize;
    for ev in events {
        if seen.insert(ev.id()) {
            kept.push(ev);
        } else {
            dropped += 1;
        }
    }
    (kept, dropped)
}

/// Per-run crawl state: which article links were already visited.
///
/// Scoped to a single run and passed explicitly into the crawl, so tests
/// and repeated runs never share it.
#[derive(Debug, Default)]
pub struct CrawlSession {
    seen_links: HashSet<String>,
}

impl CrawlSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `link`; returns `false` if it was already seen this run.
    pub fn mark_seen(&mut self, link: &str) -> bool {
        self.seen_links.insert(link.to_string())
    }

    pub fn seen_count(&self) -> usize {
        self.seen_links.len()
    }
}
