//! Per-session memoization of IRI contraction

use std::collections::HashMap;

/// Contraction results keyed by the uncontracted IRI.
///
/// Only valid for the prefix registry it was filled against, so a cache is
/// created fresh for every load session and never shared between sessions.
#[derive(Debug, Default)]
pub struct ContractionCache {
    entries: HashMap<String, String>,
    hits: u64,
    misses: u64,
}

impl ContractionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    pub fn get_or_compute<F>(&mut self, key: &str, compute: F) -> String
    where
        F: FnOnce(&str) -> String,
    {
        if let Some(value) = self.entries.get(key) {
            self.hits += 1;
            return value.clone();
        }
        self.misses += 1;
        let value = compute(key);
        self.entries.insert(key.to_string(), value.clone());
        value
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
