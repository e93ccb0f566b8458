//! Durable Store Module
//!
//! SQLite-backed key/value table holding serialized payloads and their write time.
//! Freshness is never judged here; callers decide what "too old" means.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::CacheEntry;
use crate::clock::{duration_to_millis, millis_to_datetime, Clock, SystemClock};
use crate::error::Result;

/// Path that selects a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS cache_entries (
        key TEXT PRIMARY KEY,
        payload BLOB NOT NULL,
        stored_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_cache_entries_stored_at ON cache_entries (stored_at);
";

// == Store Stats ==
/// Point-in-time summary of the store's contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    /// Number of entries currently held
    pub entries: u64,
    /// Sum of payload sizes in bytes
    pub payload_bytes: u64,
    /// Write time of the oldest entry (RFC 3339)
    pub oldest_stored_at: Option<String>,
    /// Write time of the newest entry (RFC 3339)
    pub newest_stored_at: Option<String>,
}

// == Durable Store ==
/// Persistent cache table.
///
/// The connection sits behind a mutex, so each statement runs to completion
/// before another begins; readers never observe a half-written payload.
#[derive(Debug)]
pub struct DurableStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl DurableStore {
    // == Constructors ==
    /// Opens (or creates) the store at `path` using the system clock.
    ///
    /// `":memory:"` opens a private in-memory database. For file paths the
    /// parent directory is created if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    /// Opens (or creates) the store at `path` with an explicit clock.
    pub fn open_with_clock(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str() == IN_MEMORY_PATH {
            return Self::in_memory_with_clock(clock);
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        info!(
            "Opened cache database at {} (journal_mode={})",
            path.display(),
            journal_mode
        );
        Self::init(conn, clock)
    }

    /// Opens an in-memory store using the system clock.
    pub fn in_memory() -> Result<Self> {
        Self::in_memory_with_clock(Arc::new(SystemClock))
    }

    /// Opens an in-memory store with an explicit clock.
    pub fn in_memory_with_clock(clock: Arc<dyn Clock>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, clock)
    }

    fn init(conn: Connection, clock: Arc<dyn Clock>) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            clock,
        })
    }

    // == Clock ==
    /// The time source used to stamp writes.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current time according to the store's clock (Unix milliseconds).
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    // == Get ==
    /// Exact-match lookup. No expiry check is applied.
    pub fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let conn = self.lock();
        let entry = conn
            .query_row(
                "SELECT payload, stored_at FROM cache_entries WHERE key = ?1",
                params![key],
                |row| Ok(CacheEntry::new(key, row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(entry)
    }

    // == Set ==
    /// Upserts `payload` under `key`, stamping it with the current time.
    ///
    /// Overwriting replaces the previous write time; the original creation
    /// time is not kept.
    pub fn set(&self, key: &str, payload: &[u8]) -> Result<()> {
        let stored_at = self.clock.now_millis();
        let conn = self.lock();
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, payload, stored_at) VALUES (?1, ?2, ?3)",
            params![key, payload, stored_at],
        )?;
        debug!("Stored {} ({} bytes)", key, payload.len());
        Ok(())
    }

    // == Delete ==
    /// Removes `key`. Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let conn = self.lock();
        let removed = conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    // == Sweep ==
    /// Removes every entry written more than `max_age` ago.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_older_than(&self, max_age: Duration) -> Result<usize> {
        let cutoff = self
            .clock
            .now_millis()
            .saturating_sub(duration_to_millis(max_age));
        let conn = self.lock();
        let removed = conn.execute(
            "DELETE FROM cache_entries WHERE stored_at < ?1",
            params![cutoff],
        )?;
        Ok(removed)
    }

    // == Stats ==
    /// Returns entry count, total payload size and write-time range.
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock();
        let (entries, payload_bytes, oldest, newest) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(LENGTH(payload)), 0), MIN(stored_at), MAX(stored_at)
             FROM cache_entries",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                ))
            },
        )?;

        Ok(StoreStats {
            entries: entries.max(0) as u64,
            payload_bytes: payload_bytes.max(0) as u64,
            oldest_stored_at: oldest.map(|ms| millis_to_datetime(ms).to_rfc3339()),
            newest_stored_at: newest.map(|ms| millis_to_datetime(ms).to_rfc3339()),
        })
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> Result<usize> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // Statements are atomic, so a poisoned lock never guards partial state.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const T0: i64 = 1_700_000_000_000;

    fn test_store() -> (DurableStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(T0));
        let store = DurableStore::in_memory_with_clock(clock.clone()).unwrap();
        (store, clock)
    }

    #[test]
    fn test_store_new_is_empty() {
        let (store, _) = test_store();
        assert!(store.is_empty().unwrap());
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn test_store_set_and_get() {
        let (store, _) = test_store();

        store.set("stock_AAPL_1mo", b"payload").unwrap();
        let entry = store.get("stock_AAPL_1mo").unwrap().unwrap();

        assert_eq!(entry.key, "stock_AAPL_1mo");
        assert_eq!(entry.payload, b"payload");
        assert_eq!(entry.stored_at, T0);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let (store, _) = test_store();
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_store_get_applies_no_expiry() {
        let (store, clock) = test_store();
        store.set("old", b"v").unwrap();

        clock.advance(Duration::from_secs(365 * 24 * 3600));
        assert!(store.get("old").unwrap().is_some());
    }

    #[test]
    fn test_store_overwrite_refreshes_timestamp() {
        let (store, clock) = test_store();

        store.set("k", b"first").unwrap();
        clock.advance(Duration::from_secs(60));
        store.set("k", b"second").unwrap();

        let entry = store.get("k").unwrap().unwrap();
        assert_eq!(entry.payload, b"second");
        assert_eq!(entry.stored_at, T0 + 60_000);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_store_delete_is_idempotent() {
        let (store, _) = test_store();

        store.set("k", b"v").unwrap();
        assert!(store.delete("k").unwrap());
        assert!(!store.delete("k").unwrap());
        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    fn test_store_sweep_older_than() {
        let (store, clock) = test_store();

        // Written one week and one hour before "now"
        store.set("stock_MSFT_1d", b"old").unwrap();
        clock.advance(Duration::from_secs(168 * 3600));
        store.set("stock_AAPL_1d", b"fresh").unwrap();
        clock.advance(Duration::from_secs(3600));

        let removed = store
            .sweep_older_than(Duration::from_secs(168 * 3600))
            .unwrap();

        assert_eq!(removed, 1);
        assert!(store.get("stock_MSFT_1d").unwrap().is_none());
        assert!(store.get("stock_AAPL_1d").unwrap().is_some());
    }

    #[test]
    fn test_store_sweep_keeps_entry_at_exact_horizon() {
        let (store, clock) = test_store();

        store.set("edge", b"v").unwrap();
        clock.advance(Duration::from_secs(100));

        assert_eq!(store.sweep_older_than(Duration::from_secs(100)).unwrap(), 0);
        clock.advance(Duration::from_millis(1));
        assert_eq!(store.sweep_older_than(Duration::from_secs(100)).unwrap(), 1);
    }

    #[test]
    fn test_store_sweep_matches_entry_horizon_check() {
        let (store, clock) = test_store();
        let horizon = Duration::from_secs(600);

        for (key, age_secs) in [("a", 0u64), ("b", 599), ("c", 600), ("d", 601), ("e", 3600)] {
            clock.set(millis_to_datetime(T0));
            clock.rewind(Duration::from_secs(age_secs));
            store.set(key, b"v").unwrap();
        }
        clock.set(millis_to_datetime(T0));

        let now = store.now_millis();
        let expected: Vec<&str> = ["a", "b", "c", "d", "e"]
            .into_iter()
            .filter(|key| {
                let entry = store.get(key).unwrap().unwrap();
                entry.is_older_than(now, horizon)
            })
            .collect();

        assert_eq!(expected, vec!["d", "e"]);
        assert_eq!(store.sweep_older_than(horizon).unwrap(), expected.len());
        for key in expected {
            assert!(store.get(key).unwrap().is_none());
        }
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn test_store_sweep_empty() {
        let (store, _) = test_store();
        assert_eq!(store.sweep_older_than(Duration::ZERO).unwrap(), 0);
    }

    #[test]
    fn test_store_stats() {
        let (store, clock) = test_store();

        let empty = store.stats().unwrap();
        assert_eq!(empty, StoreStats::default());

        store.set("a", b"12345").unwrap();
        clock.advance(Duration::from_secs(10));
        store.set("b", b"123").unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.payload_bytes, 8);
        assert_eq!(
            stats.oldest_stored_at,
            Some(millis_to_datetime(T0).to_rfc3339())
        );
        assert_eq!(
            stats.newest_stored_at,
            Some(millis_to_datetime(T0 + 10_000).to_rfc3339())
        );
    }

    #[test]
    fn test_store_open_memory_path() {
        let store = DurableStore::open(IN_MEMORY_PATH).unwrap();
        store.set("k", b"v").unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_store_file_backed_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.db");

        {
            let store = DurableStore::open(&path).unwrap();
            store.set("commentary_abc", b"\"text\"").unwrap();
        }

        assert!(path.exists());
        let reopened = DurableStore::open(&path).unwrap();
        let entry = reopened.get("commentary_abc").unwrap().unwrap();
        assert_eq!(entry.payload, b"\"text\"");
    }
}
