//! Cache Statistics Module
//!
//! Tracks fetch-cache outcomes: hits, misses, stale and corrupted entries, upstream fetches.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of a fetch cache's counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups served from a fresh entry
    pub hits: u64,
    /// Lookups that found no entry
    pub misses: u64,
    /// Lookups that found an entry past its freshness window
    pub stale: u64,
    /// Lookups that found an undecodable entry
    pub corrupted: u64,
    /// Upstream fetches that succeeded and were stored
    pub fetches: u64,
    /// Upstream fetches that failed
    pub fetch_failures: u64,
    /// Callers served by another caller's in-flight fetch
    pub coalesced: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns served / total lookups, or 0.0 if no lookups have been made.
    ///
    /// Every lookup records exactly one of hit, miss, stale or corrupted. A
    /// coalesced caller has already recorded its miss, so it moves from the
    /// unserved to the served side without adding to the total.
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.coalesced;
        let total = self.hits + self.misses + self.stale + self.corrupted;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Lock-free counters shared by concurrent callers of one fetch cache.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    stale: AtomicU64,
    corrupted: AtomicU64,
    fetches: AtomicU64,
    fetch_failures: AtomicU64,
    coalesced: AtomicU64,
}

impl StatsRecorder {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_corrupted(&self) {
        self.corrupted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the current counter values.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            corrupted: self.corrupted.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
        }
    }
}
