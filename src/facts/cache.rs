//! Memoizing cache for class facts lookups
//!
//! Keyed by the canonical, lowercased class name. Stores either the shared
//! snapshot or a negative marker for classes the provider does not know.
//! Faulted lookups are never stored so a later query can retry.

use super::ClassFacts;
use crate::names::canonical;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Cached outcome of one successful lookup
pub type CachedFacts = Option<Arc<ClassFacts>>;

/// Thread-safe facts cache
#[derive(Debug, Default)]
pub struct FactsCache {
    entries: DashMap<String, CachedFacts>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl FactsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for a class name
    pub fn key(name: &str) -> String {
        canonical(name).to_ascii_lowercase()
    }

    /// Look up a cached outcome; `None` when the class was never resolved
    pub fn get(&self, name: &str) -> Option<CachedFacts> {
        match self.entries.get(&Self::key(name)) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value().clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store an outcome and return the value now held by the cache.
    ///
    /// When two threads race on the same class, the first insert wins and
    /// both observe the same value.
    pub fn put(&self, name: &str, facts: CachedFacts) -> CachedFacts {
        self.entries
            .entry(Self::key(name))
            .or_insert(facts)
            .value()
            .clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&Self::key(name))
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let negative = self.entries.iter().filter(|e| e.value().is_none()).count();
        CacheStats {
            total_entries: self.entries.len(),
            negative_entries: negative,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Clear all entries
    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub negative_entries: usize,
    pub hits: usize,
    pub misses: usize,
}
