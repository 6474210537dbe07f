//! Bounded recency map (C2): a fixed-capacity ordered mapping from handle to
//! value. On overflow the entry with the earliest insertion time is evicted.
//!
//! Deliberately NOT built on an LRU crate: most LRU implementations refresh
//! an entry's rank on read, which would turn insertion-order eviction into
//! recency-order eviction and break history ordering (P2/P3). A plain
//! `HashMap` paired with an explicit insertion-order ledger keeps the
//! contract exact: re-inserting an existing key updates its value but does
//! not move it in the ledger.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Fixed-capacity ordered mapping. Capacity is ≥ 1 for the map to accept
/// any insert; a capacity of 0 would reject every insert, which callers
/// never want, so `new` panics on it the same way the teacher's code treats
/// other invalid startup configuration as a panic.
pub struct BoundedRecencyMap<K, V> {
    capacity: usize,
    order: VecDeque<K>,
    entries: HashMap<K, V>,
}

impl<K, V> BoundedRecencyMap<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "BoundedRecencyMap capacity must be >= 1");
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// Insert `k -> v`. If `k` is new and the map is at capacity, the oldest
    /// entry (by insertion order) is evicted atomically with this insert.
    /// Returns the evicted entry, if any.
    ///
    /// Re-inserting an existing key updates its value but does not refresh
    /// its position in the insertion-order ledger.
    pub fn insert(&mut self, k: K, v: V) -> Option<(K, V)> {
        if self.entries.contains_key(&k) {
            self.entries.insert(k, v);
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };

        self.order.push_back(k.clone());
        self.entries.insert(k, v);
        evicted
    }

    pub fn get(&self, k: &K) -> Option<&V> {
        self.entries.get(k)
    }

    pub fn remove(&mut self, k: &K) -> Option<V> {
        let removed = self.entries.remove(k);
        if removed.is_some() {
            self.order.retain(|existing| existing != k);
        }
        removed
    }

    /// Keys in insertion order, oldest first.
    pub fn keys_in_insertion_order(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&mut self) -> Option<(K, V)> {
        let oldest = self.order.pop_front()?;
        let value = self.entries.remove(&oldest)?;
        Some((oldest, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_on_overflow() {
        let mut map = BoundedRecencyMap::new(3);
        map.insert(1, "a");
        map.insert(2, "b");
        map.insert(3, "c");
        let evicted = map.insert(4, "d");
        assert_eq!(evicted, Some((1, "a")));
        assert_eq!(
            map.keys_in_insertion_order().copied().collect::<Vec<_>>(),
            vec![2, 3, 4]
        );
    }

    #[test]
    fn reinsert_updates_value_without_refreshing_rank() {
        let mut map = BoundedRecencyMap::new(2);
        map.insert(1, "a");
        map.insert(2, "b");
        // Re-insert key 1: value updates, but it stays oldest.
        assert_eq!(map.insert(1, "a2"), None);
        assert_eq!(map.get(&1), Some(&"a2"));
        let evicted = map.insert(3, "c");
        assert_eq!(evicted, Some((1, "a2")));
    }

    #[test]
    fn remove_drops_from_ledger() {
        let mut map = BoundedRecencyMap::new(2);
        map.insert(1, "a");
        map.insert(2, "b");
        assert_eq!(map.remove(&1), Some("a"));
        assert_eq!(
            map.keys_in_insertion_order().copied().collect::<Vec<_>>(),
            vec![2]
        );
        // Capacity freed up, no eviction now.
        assert_eq!(map.insert(3, "c"), None);
    }

    #[test]
    fn history_order_is_oldest_first() {
        let mut map = BoundedRecencyMap::new(5);
        for i in 1..=5u32 {
            map.insert(i, i * 10);
        }
        // Reading values (simulating GetHistory) never refreshes rank.
        for i in 1..=5u32 {
            let _ = map.get(&i);
        }
        map.insert(6, 60);
        assert_eq!(
            map.keys_in_insertion_order().copied().collect::<Vec<_>>(),
            vec![2, 3, 4, 5, 6]
        );
    }
}
