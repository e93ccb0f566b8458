//! Retention Sweep Task
//!
//! Background task that periodically removes entries older than the retention horizon.
//! Freshness windows never delete anything on their own, so without this the
//! table only grows.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::DurableStore;
use crate::error::Result;

/// Runs a single sweep and logs the outcome.
pub fn run_sweep(store: &DurableStore, retention: Duration) -> Result<usize> {
    let removed = store.sweep_older_than(retention)?;
    if removed > 0 {
        info!("Retention sweep: removed {} entries", removed);
    } else {
        debug!("Retention sweep: nothing older than {:?}", retention);
    }
    Ok(removed)
}

/// Spawns a background task that sweeps `store` every `interval`.
///
/// The first sweep runs after one full interval. Storage errors are logged and
/// the loop carries on. Abort the returned handle during shutdown.
///
/// # Example
/// ```ignore
/// let store = Arc::new(DurableStore::open("data/cache.db")?);
/// let handle = spawn_sweep_task(store.clone(), Duration::from_secs(3600), Duration::from_secs(7 * 86_400));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task(
    store: Arc<DurableStore>,
    interval: Duration,
    retention: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting retention sweep every {:?} (retention {:?})",
            interval, retention
        );

        loop {
            tokio::time::sleep(interval).await;

            if let Err(err) = run_sweep(&store, retention) {
                error!("Retention sweep failed: {}", err);
            }
        }
    })
}
