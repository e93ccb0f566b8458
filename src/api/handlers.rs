//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use tracing::info;

use crate::cache::DurableStore;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, EntryResponse, HealthResponse, StatsResponse, SweepRequest, SweepResponse,
};
use crate::tasks::run_sweep;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared durable store
    pub store: Arc<DurableStore>,
    /// Horizon applied when a sweep request names none
    pub retention: Duration,
}

impl AppState {
    /// Creates a new AppState over an already opened store.
    pub fn new(store: Arc<DurableStore>, retention: Duration) -> Self {
        Self { store, retention }
    }

    /// Creates a new AppState from configuration, opening the store at `config.db_path`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = DurableStore::open(&config.db_path)?;
        Ok(Self::new(Arc::new(store), config.retention()))
    }
}

/// Handler for GET /entries/:key
///
/// Reports write time, age, size and decodability of a stored entry.
pub async fn get_entry_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<EntryResponse>> {
    let entry = state
        .store
        .get(&key)?
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(EntryResponse::new(&entry, state.store.now_millis())))
}

/// Handler for DELETE /entries/:key
///
/// Deleting an absent key succeeds with `removed: false`.
pub async fn delete_entry_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let removed = state.store.delete(&key)?;
    if removed {
        info!("Deleted entry {} via admin API", key);
    }

    Ok(Json(DeleteResponse::new(key, removed)))
}

/// Handler for POST /sweep
///
/// The body is optional; without one the configured retention applies.
pub async fn sweep_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<SweepRequest>, JsonRejection>,
) -> Result<Json<SweepResponse>> {
    let req = match body {
        Ok(Json(req)) => req,
        Err(JsonRejection::MissingJsonContentType(_)) => SweepRequest::default(),
        Err(rejection) => return Err(CacheError::InvalidRequest(rejection.body_text())),
    };
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let max_age = req.max_age_or(state.retention);
    let removed = run_sweep(&state.store, max_age)?;

    Ok(Json(SweepResponse {
        removed,
        max_age_hours: max_age.as_secs() / 3600,
    }))
}

/// Handler for GET /stats
///
/// Returns entry count, payload size and write-time range.
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let stats = state.store.stats()?;
    Ok(Json(StatsResponse::from(stats)))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
