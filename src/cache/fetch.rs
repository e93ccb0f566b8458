//! Fetch Cache Module
//!
//! Get-or-fetch coordinator: serves fresh entries from the durable store, otherwise
//! throttles, calls the supplied fetch function, stores the result and returns it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::inflight::KeyLocks;
use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheStats, DurableStore};
use crate::error::{CacheError, Result, UpstreamError};
use crate::rate_limit::{RateLimiter, SourceId};

// == Lookup Outcome ==
/// Result of consulting the store for one key.
#[derive(Debug)]
pub enum Lookup<T> {
    /// Fresh, decodable entry
    Hit(T),
    /// No entry under the key
    NotFound,
    /// Entry past its freshness window (now deleted)
    Stale,
    /// Entry that failed to decode (now deleted)
    Corrupted,
}

// == Fetch Cache ==
/// Cache-aside coordinator bound to one upstream source.
///
/// Payloads are stored as JSON. Stale and corrupted entries are treated exactly
/// like a missing one: deleted, then refetched. Fetch failures propagate and leave
/// nothing behind.
#[derive(Debug)]
pub struct FetchCache {
    store: Arc<DurableStore>,
    limiter: Arc<RateLimiter>,
    source: SourceId,
    in_flight: KeyLocks,
    stats: StatsRecorder,
}

impl FetchCache {
    // == Constructor ==
    /// Creates a fetch cache that throttles `source` through `limiter` before each fetch.
    pub fn new(store: Arc<DurableStore>, limiter: Arc<RateLimiter>, source: SourceId) -> Self {
        Self {
            store,
            limiter,
            source,
            in_flight: KeyLocks::default(),
            stats: StatsRecorder::default(),
        }
    }

    /// The upstream source this cache throttles.
    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// The underlying durable store.
    pub fn store(&self) -> &Arc<DurableStore> {
        &self.store
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    // == Get Or Fetch ==
    /// Returns the value under `key` if it was written within `freshness`,
    /// otherwise fetches, stores and returns a new one.
    ///
    /// A zero `freshness` always refetches. Concurrent callers for the same key
    /// share one fetch: later callers wait, then read the entry the first stored.
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        key: &str,
        freshness: Duration,
        fetch: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, UpstreamError>>,
    {
        match self.lookup(key, freshness)? {
            Lookup::Hit(value) => {
                self.stats.record_hit();
                debug!("Cache hit for {}", key);
                return Ok(value);
            }
            Lookup::NotFound => self.stats.record_miss(),
            Lookup::Stale => self.stats.record_stale(),
            Lookup::Corrupted => self.stats.record_corrupted(),
        }

        let _guard = self.in_flight.acquire(key).await;

        // Another caller may have refreshed the key while we waited
        if let Lookup::Hit(value) = self.lookup(key, freshness)? {
            self.stats.record_coalesced();
            debug!("Served {} from a concurrent fetch", key);
            return Ok(value);
        }

        self.limiter.throttle(&self.source).await;

        debug!("Fetching {} from {}", key, self.source);
        let value = match fetch().await {
            Ok(value) => value,
            Err(err) => {
                self.stats.record_fetch_failure();
                warn!("Fetch for {} from {} failed: {}", key, self.source, err);
                return Err(CacheError::Upstream(err));
            }
        };

        let payload = serde_json::to_vec(&value)?;
        self.store.set(key, &payload)?;
        self.stats.record_fetch();
        Ok(value)
    }

    // == Lookup ==
    /// Reads `key` and classifies it, deleting stale or corrupted entries.
    ///
    /// Decode failures never escape: they surface as [`Lookup::Corrupted`].
    /// Storage failures do.
    pub fn lookup<T>(&self, key: &str, freshness: Duration) -> Result<Lookup<T>>
    where
        T: DeserializeOwned,
    {
        let Some(entry) = self.store.get(key)? else {
            return Ok(Lookup::NotFound);
        };

        if !entry.is_fresh(self.store.now_millis(), freshness) {
            debug!(
                "Entry {} is stale (age {}s)",
                key,
                entry.age(self.store.now_millis()).as_secs()
            );
            self.store.delete(key)?;
            return Ok(Lookup::Stale);
        }

        match serde_json::from_slice(&entry.payload) {
            Ok(value) => Ok(Lookup::Hit(value)),
            Err(err) => {
                warn!("Discarding corrupted entry {}: {}", key, err);
                self.store.delete(key)?;
                Ok(Lookup::Corrupted)
            }
        }
    }

    // == Invalidate ==
    /// Drops `key` so the next access refetches. Returns whether it existed.
    pub fn invalidate(&self, key: &str) -> Result<bool> {
        self.store.delete(key)
    }
}
