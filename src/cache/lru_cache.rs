use dashmap::DashMap;
use std::{
    hash::Hash,
    sync::atomic::{AtomicU64, Ordering},
};
use tracing::debug;

/// Cache entry stamped with the logical time of its last access
#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    last_access: AtomicU64,
}

/// LRU cache over a `DashMap`, optionally bounded.
///
/// Without a capacity nothing is ever evicted. With one, inserting past the
/// bound drops the entry with the oldest access stamp. Finding that entry is
/// a linear scan, which is fine for the few hundred videos a chat references.
#[derive(Debug)]
pub struct LRUCache<K: Clone + Eq + Hash, V> {
    data: DashMap<K, CacheEntry<V>>,
    capacity: Option<usize>,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<K, V> LRUCache<K, V>
where
    K: Clone + Eq + Hash + std::fmt::Debug,
    V: Clone,
{
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            data: DashMap::new(),
            capacity: capacity.filter(|cap| *cap > 0),
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        match self.data.get(key) {
            Some(entry) => {
                entry.last_access.store(self.tick(), Ordering::Relaxed);
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let entry = CacheEntry {
            value,
            last_access: AtomicU64::new(self.tick()),
        };
        let previous = self.data.insert(key, entry).map(|old| old.value);

        if let Some(capacity) = self.capacity {
            while self.data.len() > capacity {
                if !self.evict_oldest() {
                    break;
                }
            }
        }

        previous
    }

    fn evict_oldest(&self) -> bool {
        let oldest = self
            .data
            .iter()
            .min_by_key(|entry| entry.value().last_access.load(Ordering::Relaxed))
            .map(|entry| entry.key().clone());

        match oldest.and_then(|key| self.data.remove(&key)) {
            Some((key, _)) => {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!("Evicted least recently used cache entry {:?}", key);
                true
            }
            None => false,
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            joined_in_flight: 0,
            entries: self.data.len(),
        }
    }
}

/// Hit, miss and eviction counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Misses served by attaching to a fetch already in progress
    pub joined_in_flight: u64,
    pub entries: usize,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }

    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }
}
