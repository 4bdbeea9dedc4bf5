//! Fine-grained mutual exclusion keyed by item identity
//!
//! Reconciliation and direct operations on the same catalog item must never
//! run concurrently. Lock entries are reference-counted: an entry exists only
//! while someone holds or waits for it, so the registry stays bounded by the
//! number of currently contended items rather than the historical total.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;
use tokio::time::Instant;

use crate::models::ItemId;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LockError {
    #[error("timed out waiting for lock on {0}")]
    Timeout(ItemId),
}

struct Entry {
    mutex: Arc<tokio::sync::Mutex<()>>,
    refs: usize,
}

/// Keyed mutual exclusion over catalog items.
pub struct Locker {
    registry: Mutex<HashMap<ItemId, Entry>>,
}

/// Exclusive ownership of one item id; released on drop.
pub struct LockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locker: Arc<Locker>,
    id: ItemId,
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Locker {
    pub fn new() -> Arc<Self> {
        Arc::new(Locker {
            registry: Mutex::new(HashMap::new()),
        })
    }

    /// Waits for exclusive ownership of `id`, however long it takes.
    pub async fn lock(self: &Arc<Self>, id: ItemId) -> LockGuard {
        let mutex = self.acquire_entry(&id);
        let guard = mutex.lock_owned().await;
        LockGuard {
            guard: Some(guard),
            locker: self.clone(),
            id,
        }
    }

    /// Polls for ownership of `id` every 100 ms, giving up at `deadline`.
    /// The registry entry is released on the failure path so cancellation
    /// never leaks bookkeeping.
    pub async fn lock_until(
        self: &Arc<Self>,
        deadline: Instant,
        id: ItemId,
    ) -> Result<LockGuard, LockError> {
        let mutex = self.acquire_entry(&id);
        loop {
            if let Ok(guard) = mutex.clone().try_lock_owned() {
                return Ok(LockGuard {
                    guard: Some(guard),
                    locker: self.clone(),
                    id,
                });
            }
            if Instant::now() + POLL_INTERVAL > deadline {
                self.release_entry(&id);
                return Err(LockError::Timeout(id));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Like [`Locker::lock_until`] with a relative timeout.
    pub async fn timed_lock(
        self: &Arc<Self>,
        timeout: Duration,
        id: ItemId,
    ) -> Result<LockGuard, LockError> {
        self.lock_until(Instant::now() + timeout, id).await
    }

    fn acquire_entry(&self, id: &ItemId) -> Arc<tokio::sync::Mutex<()>> {
        let mut registry = self.registry.lock();
        let entry = registry.entry(id.clone()).or_insert_with(|| Entry {
            mutex: Arc::new(tokio::sync::Mutex::new(())),
            refs: 0,
        });
        entry.refs += 1;
        entry.mutex.clone()
    }

    fn release_entry(&self, id: &ItemId) {
        let mut registry = self.registry.lock();
        if let Some(entry) = registry.get_mut(id) {
            entry.refs -= 1;
            if entry.refs == 0 {
                registry.remove(id);
            }
        }
    }

    #[cfg(test)]
    fn registry_len(&self) -> usize {
        self.registry.lock().len()
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // Release the mutex before dropping the registry entry so a waiter
        // polling the same entry observes it unlocked.
        self.guard.take();
        self.locker.release_entry(&self.id);
    }
}
