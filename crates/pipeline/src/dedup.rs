//! Two-pass deduplication for a single generation run.
//!
//! ## Algorithm
//! 1. Title pass (before enrichment): a candidate whose normalized
//!    title+year has been seen this run is skipped without a lookup
//! 2. Identity pass (after enrichment): a result is accepted only if none
//!    of its identity keys (TMDB id, IMDb id, title+year) belongs to an
//!    already accepted result
//!
//! The identity pass checks and records in one call, so there is no window
//! in which two results with the same key can both pass.

use catalog::{DedupKey, EnrichedResult, TitleKey};
use std::collections::HashSet;

/// Seen-keys and accepted-keys for one run; never shared between runs
#[derive(Debug, Default)]
pub struct DedupIndex {
    seen_titles: HashSet<TitleKey>,
    accepted: HashSet<DedupKey>,
    accepted_count: usize,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a candidate title; returns `false` if it was already seen
    pub fn first_sighting(&mut self, key: &TitleKey) -> bool {
        if self.seen_titles.contains(key) {
            return false;
        }
        self.seen_titles.insert(key.clone())
    }

    /// Accept a result unless one of its identity keys is already taken.
    pub fn try_accept(&mut self, result: &EnrichedResult) -> bool {
        let keys = result.identity_keys();
        if keys.iter().any(|k| self.accepted.contains(k)) {
            return false;
        }
        self.accepted.extend(keys);
        self.accepted_count += 1;
        true
    }

    /// Number of results accepted so far
    pub fn accepted(&self) -> usize {
        self.accepted_count
    }

    pub fn seen(&self) -> usize {
        self.seen_titles.len()
    }
}
