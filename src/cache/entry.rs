//! Cache Entry Module
//!
//! Defines a single persisted entry: opaque payload plus the time it was last written.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::{duration_to_millis, millis_to_datetime};

// == Cache Entry ==
/// A row of the durable store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Unique key (last write wins)
    pub key: String,
    /// Serialized payload, opaque to the store
    pub payload: Vec<u8>,
    /// Time of the most recent write (Unix milliseconds)
    pub stored_at: i64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stamped at `stored_at` (Unix milliseconds).
    pub fn new(key: impl Into<String>, payload: Vec<u8>, stored_at: i64) -> Self {
        Self {
            key: key.into(),
            payload,
            stored_at,
        }
    }

    // == Age ==
    /// Returns how long ago the entry was written, relative to `now_millis`.
    ///
    /// An entry stamped in the future (clock moved backwards) has age zero.
    pub fn age(&self, now_millis: i64) -> Duration {
        let elapsed = now_millis.saturating_sub(self.stored_at).max(0);
        Duration::from_millis(elapsed as u64)
    }

    // == Is Fresh ==
    /// Checks whether the entry may be served without refetching.
    ///
    /// Boundary condition: an entry whose age equals the window is still fresh.
    /// A zero window is never fresh, so it always forces a refetch.
    pub fn is_fresh(&self, now_millis: i64, window: Duration) -> bool {
        if window.is_zero() {
            return false;
        }
        now_millis.saturating_sub(self.stored_at) <= duration_to_millis(window)
    }

    // == Is Older Than ==
    /// Returns true if the entry falls outside a retention horizon of `max_age`.
    pub fn is_older_than(&self, now_millis: i64, max_age: Duration) -> bool {
        now_millis.saturating_sub(self.stored_at) > duration_to_millis(max_age)
    }

    /// Returns the write time as a UTC timestamp.
    pub fn stored_at_utc(&self) -> DateTime<Utc> {
        millis_to_datetime(self.stored_at)
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}
