//! Cache Module
//!
//! Durable keyed storage and the get-or-fetch coordinator built on top of it.

mod entry;
mod fetch;
mod inflight;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use fetch::{FetchCache, Lookup};
pub use stats::CacheStats;
pub use store::{DurableStore, StoreStats, IN_MEMORY_PATH};
