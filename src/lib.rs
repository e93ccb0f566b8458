//! Ticker Cache - a durable fetch cache for market data and generated commentary
//!
//! Wraps slow, rate-limited providers with a SQLite-backed read-through cache:
//! freshness windows per path, content-derived keys for generated text, per-source
//! throttling and a commentary fallback that is never cached.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod keys;
pub mod models;
pub mod orchestrator;
pub mod rate_limit;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStats, DurableStore, FetchCache, Lookup};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, Result, UpstreamError};
pub use keys::{ContentKey, ContentKeyDeriver, FieldValue};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use rate_limit::{RateLimiter, SourceId};
pub use tasks::spawn_sweep_task;
