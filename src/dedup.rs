//! Time-windowed dedup set (§4.10): suppresses immediate redelivery bursts
//! on the consumer side. Not a durable idempotency store — entries
//! self-remove after the configured window.
//!
//! Grounded in `kafkaconsumer/internal/repository/inmemory/inmemory.go`'s
//! `StorageTTL`, which spawns one goroutine per `Add` to schedule removal;
//! the Rust translation spawns one `tokio::task` per `Add` for the same
//! shape, which keeps pending removals bounded by the set's current size.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// A thread-safe set of keys where each entry self-removes after `window`
/// has elapsed since its most recent `add`.
///
/// Each key tracks its own current removal deadline. Re-adding a key
/// during its window schedules a new removal task for the new deadline;
/// the earlier task, when it eventually wakes, only removes the key if
/// its deadline is still the one on file — otherwise a later `add` has
/// superseded it and it no-ops.
pub struct DedupSet<K> {
    inner: Arc<RwLock<HashMap<K, Instant>>>,
    window: Duration,
}

impl<K> DedupSet<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    pub fn new(window: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            window,
        }
    }

    /// Mark `key` as seen. Schedules its removal after `window` elapses.
    /// Re-adding during the window extends presence to the new window end.
    pub fn add(&self, key: K) {
        let deadline = Instant::now() + self.window;
        self.inner
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.clone(), deadline);

        let inner = Arc::clone(&self.inner);
        let window = self.window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let mut guard = inner.write().unwrap_or_else(|e| e.into_inner());
            if guard.get(&key) == Some(&deadline) {
                guard.remove(&key);
            }
        });
    }

    pub fn is_exist(&self, key: &K) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entry_present_then_self_removes_after_window() {
        let set = DedupSet::new(Duration::from_secs(20));
        set.add("chat-1".to_string());
        assert!(set.is_exist(&"chat-1".to_string()));

        tokio::time::advance(Duration::from_secs(19)).await;
        assert!(set.is_exist(&"chat-1".to_string()));

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert!(!set.is_exist(&"chat-1".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn readd_during_window_extends_presence() {
        let set = DedupSet::new(Duration::from_secs(10));
        set.add("p".to_string());
        tokio::time::advance(Duration::from_secs(8)).await;
        set.add("p".to_string()); // extend: new deadline is 8s + 10s = 18s
        tokio::time::advance(Duration::from_secs(8)).await;
        tokio::task::yield_now().await;
        // 16s since first add (its own removal task fired at t=10 and
        // no-opped, since the map's deadline had already moved), but only
        // 8s since the second add's 10s window: still present.
        assert!(set.is_exist(&"p".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn eventually_removed_after_the_extended_window() {
        let set = DedupSet::new(Duration::from_secs(10));
        set.add("p".to_string());
        tokio::time::advance(Duration::from_secs(8)).await;
        set.add("p".to_string());
        tokio::time::advance(Duration::from_secs(11)).await;
        tokio::task::yield_now().await;
        assert!(!set.is_exist(&"p".to_string()));
    }
}
