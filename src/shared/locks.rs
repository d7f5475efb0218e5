//! Keyed async mutexes
//!
//! Serializes operations that share an id (one booking, one room)
//! without a global lock. Entries are dropped again once the last
//! guard for a key is released, so the map does not grow forever.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A map of per-key mutexes. Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock for `key`, creating it on first use. The entry is
    /// evicted when the returned guard drops and nobody else holds or
    /// awaits the lock.
    pub async fn acquire(&self, key: i64) -> KeyedGuard {
        let lock = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;
        KeyedGuard {
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
            key,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.len()
    }
}

/// Guard for one key. Releases the mutex on drop and removes the map
/// entry if no other task holds a reference to it.
pub struct KeyedGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
    key: i64,
}

impl Drop for KeyedGuard {
    fn drop(&mut self) {
        // Release the mutex before checking the reference count; the
        // guard itself keeps the Arc alive. remove_if runs under the
        // shard lock, so a concurrent acquire cannot slip in between
        // the count check and the removal.
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn same_key_is_serialized() {
        let locks = KeyedLocks::new();
        let running = Arc::new(AtomicU32::new(0));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let locks = locks.clone();
            let running = Arc::clone(&running);
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(1).await;
                assert_eq!(running.fetch_add(1, Ordering::SeqCst), 0);
                tokio::task::yield_now().await;
                running.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn different_keys_do_not_block_each_other() {
        let locks = KeyedLocks::new();
        let _first = locks.acquire(1).await;
        // Completes immediately even though key 1 is held.
        let _second = locks.acquire(2).await;
    }

    #[tokio::test]
    async fn entries_are_evicted_after_release() {
        let locks = KeyedLocks::new();
        {
            let _a = locks.acquire(1).await;
            let _b = locks.acquire(2).await;
            assert_eq!(locks.len(), 2);
        }
        assert_eq!(locks.len(), 0);

        // A key stays while another task waits for it.
        let guard = locks.acquire(3).await;
        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.acquire(3).await;
            })
        };
        tokio::task::yield_now().await;
        assert_eq!(locks.len(), 1);
        drop(guard);
        waiter.await.unwrap();
        assert_eq!(locks.len(), 0);
    }
}
