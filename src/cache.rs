//! Bounded, append-only string-keyed cache.
//!
//! Entries are never evicted. Once `capacity` entries exist, further misses
//! are computed and returned without being stored, so memory stays bounded and
//! results are identical whether or not a key made it into the cache.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Default number of entries kept by the bridge's caches.
pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug)]
pub struct BoundedCache<V> {
    entries: DashMap<String, V>,
    capacity: usize,
    // Tracked separately: DashMap::len locks every shard, which would
    // deadlock against a held entry guard.
    len: AtomicUsize,
}

impl<V: Clone> BoundedCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            len: AtomicUsize::new(0),
        }
    }

    /// Return the cached value for `key`, computing it on a miss.
    ///
    /// Concurrent misses on the same key are resolved under the shard lock,
    /// so the key is stored at most once.
    pub fn get_or_insert_with<F>(&self, key: &str, compute: F) -> V
    where
        F: FnOnce(&str) -> V,
    {
        if let Some(hit) = self.entries.get(key) {
            return hit.value().clone();
        }
        if self.is_full() {
            return compute(key);
        }

        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => {
                let value = compute(key);
                if self.try_reserve() {
                    slot.insert(value.clone());
                }
                value
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn try_reserve(&self) -> bool {
        self.len
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.capacity).then_some(n + 1)
            })
            .is_ok()
    }
}

impl<V: Clone> Default for BoundedCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_stops_caching_at_capacity() {
        let cache = BoundedCache::new(3);
        for i in 0..10 {
            let key = format!("k{}", i);
            assert_eq!(cache.get_or_insert_with(&key, |k| k.len()), key.len());
        }
        assert_eq!(cache.len(), 3);
        assert!(cache.contains("k0"));
        assert!(!cache.contains("k9"));
    }

    #[test]
    fn test_hit_does_not_recompute() {
        let cache = BoundedCache::new(10);
        cache.get_or_insert_with("a", |_| 1);
        let v = cache.get_or_insert_with("a", |_| 2);
        assert_eq!(v, 1);
    }

    #[test]
    fn test_concurrent_inserts_stay_bounded() {
        let cache = Arc::new(BoundedCache::new(50));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        let key = format!("key-{}", (i * 7 + t) % 120);
                        let v = cache.get_or_insert_with(&key, |k| k.to_uppercase());
                        assert_eq!(v, key.to_uppercase());
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 50);
        assert!(cache.is_full());
    }
}
