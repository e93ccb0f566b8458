//! In-Flight Key Locks
//!
//! One async lock per key currently being resolved, so concurrent callers for the
//! same key wait for a single upstream fetch instead of each issuing their own.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub(crate) struct KeyLocks {
    locks: Mutex<HashMap<String, Weak<AsyncMutex<()>>>>,
}

impl KeyLocks {
    /// Waits for exclusive ownership of `key`.
    ///
    /// The guard releases the key when dropped. Map slots whose lock is no longer
    /// held by anyone are pruned on each acquisition.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            locks.retain(|_, slot| slot.strong_count() > 0);

            match locks.get(key).and_then(Weak::upgrade) {
                Some(existing) => existing,
                None => {
                    let created = Arc::new(AsyncMutex::new(()));
                    locks.insert(key.to_string(), Arc::downgrade(&created));
                    created
                }
            }
        };
        lock.lock_owned().await
    }

    /// Number of keys with a live lock.
    #[cfg(test)]
    pub fn active(&self) -> usize {
        let locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.values().filter(|slot| slot.strong_count() > 0).count()
    }
}
