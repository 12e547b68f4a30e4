//! # Page Mapping Cache
//!
//! Bounded least-recently-used map that keeps a small number of page files
//! mapped at once. Each page of the node table can be tens of megabytes, so
//! the cache is capped by entry count (default 10) rather than by bytes.
//!
//! ## Recency
//!
//! Every access stamps the entry with a monotonically increasing tick. The
//! victim on a full insert is the entry with the oldest stamp; with a
//! capacity of ten, a linear scan over the stamps is cheaper than keeping a
//! linked order list in sync.
//!
//! ## Eviction and Invalidation
//!
//! A full insert hands the victim back to the caller. For page mappings the
//! value is an `Arc<MappedPage>`; once the last clone is dropped the region
//! is unmapped and the descriptor closed. `invalidate` is used by the table
//! before a page file is rewritten, so a later lookup maps the new file.
//!
//! ## Statistics
//!
//! [`CacheStats`] counts hits, misses, evictions and invalidations. A full
//! scan of a large table should show one miss per page and hits for every
//! other record; repeated misses on the same pages mean the capacity is too
//! small for the access pattern.

use std::hash::Hash;

use hashbrown::HashMap;

/// Counters of one cache since it was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
}

struct Slot<V> {
    value: V,
    last_used: u64,
}

pub struct LruPageCache<K, V> {
    capacity: usize,
    tick: u64,
    slots: HashMap<K, Slot<V>>,
    stats: CacheStats,
}

impl<K: Clone + Eq + Hash, V> LruPageCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            tick: 0,
            slots: HashMap::with_capacity(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Looks up `key`, marking it most recently used on a hit.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.tick += 1;
        match self.slots.get_mut(key) {
            Some(slot) => {
                slot.last_used = self.tick;
                self.stats.hits += 1;
                Some(&slot.value)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    /// Inserts `value`, returning the evicted least-recently-used entry if
    /// the cache was full. Replacing an existing key never evicts.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        self.tick += 1;
        let last_used = self.tick;

        if let Some(slot) = self.slots.get_mut(&key) {
            *slot = Slot { value, last_used };
            return None;
        }

        let evicted = if self.slots.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };
        self.slots.insert(key, Slot { value, last_used });
        evicted
    }

    /// Drops `key` so the next lookup misses.
    pub fn invalidate(&mut self, key: &K) -> Option<V> {
        let slot = self.slots.remove(key)?;
        self.stats.invalidations += 1;
        Some(slot.value)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn evict_oldest(&mut self) -> Option<(K, V)> {
        let oldest = self
            .slots
            .iter()
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(key, _)| key.clone())?;
        let slot = self.slots.remove(&oldest)?;
        self.stats.evictions += 1;
        Some((oldest, slot.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = LruPageCache::new(2);

        assert!(cache.insert("page_000", 0).is_none());
        assert!(cache.insert("page_001", 1).is_none());
        assert_eq!(cache.get(&"page_000"), Some(&0));

        let evicted = cache.insert("page_002", 2);

        assert_eq!(evicted, Some(("page_001", 1)));
        assert!(cache.contains(&"page_000"));
        assert!(cache.contains(&"page_002"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn reinsert_replaces_without_eviction() {
        let mut cache = LruPageCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);

        assert!(cache.insert("a", 10).is_none());
        assert_eq!(cache.get(&"a"), Some(&10));
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.insert("c", 3), Some(("b", 2)));
    }

    #[test]
    fn invalidated_entry_misses() {
        let mut cache = LruPageCache::new(3);
        cache.insert("a", 1);
        cache.insert("b", 2);

        assert_eq!(cache.invalidate(&"a"), Some(1));
        assert_eq!(cache.invalidate(&"a"), None);
        assert!(cache.get(&"a").is_none());
        assert_eq!(cache.get(&"b"), Some(&2));

        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                evictions: 0,
                invalidations: 1,
            }
        );
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut cache = LruPageCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.insert(1, 'a');
        assert_eq!(cache.insert(2, 'b'), Some((1, 'a')));
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }
}
