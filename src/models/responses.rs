//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheEntry, StoreStats};

/// Response body for GET /entries/:key
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    /// The requested key
    pub key: String,
    /// Write time in RFC 3339
    pub stored_at: String,
    /// Seconds since the entry was written
    pub age_seconds: u64,
    /// Serialized payload size
    pub size_bytes: usize,
    /// Whether the payload parses as JSON
    pub decodable: bool,
}

impl EntryResponse {
    /// Describes `entry` as seen at `now_millis`.
    pub fn new(entry: &CacheEntry, now_millis: i64) -> Self {
        Self {
            key: entry.key.clone(),
            stored_at: entry.stored_at_utc().to_rfc3339(),
            age_seconds: entry.age(now_millis).as_secs(),
            size_bytes: entry.size(),
            decodable: serde_json::from_slice::<serde_json::Value>(&entry.payload).is_ok(),
        }
    }
}

/// Response body for DELETE /entries/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// The key that was targeted
    pub key: String,
    /// Whether an entry was actually present
    pub removed: bool,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>, removed: bool) -> Self {
        Self {
            key: key.into(),
            removed,
        }
    }
}

/// Response body for POST /sweep
#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    /// Number of entries deleted
    pub removed: usize,
    /// Horizon that was applied, in hours
    pub max_age_hours: u64,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub store: StoreStats,
}

impl From<StoreStats> for StatsResponse {
    fn from(store: StoreStats) -> Self {
        Self { store }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
