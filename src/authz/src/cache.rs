//! Shared cache primitives backing the resolver and realm caches
//!
//! Both caches sit on `DashMap`, so lookups and inserts only contend on a
//! single shard and never on a global lock. A wholesale `clear()` may run
//! concurrently with lookups: a racing lookup either sees the old entry or
//! misses and recomputes. Both are correct because every cached value is a
//! pure function of the configuration.

use dashmap::DashMap;
use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{trace, warn};

/// Cache statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Current number of entries
    pub entries: usize,
    /// Times the cache was emptied by its size guard or evicted a batch
    pub resets: u64,
}

impl CacheStats {
    /// Calculate cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    resets: AtomicU64,
}

impl Counters {
    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries,
            resets: self.resets.load(Ordering::Relaxed),
        }
    }
}

/// Unbounded map guarded by a "reset valve"
///
/// Once the map holds more than `high_water` entries the next insert clears
/// it completely instead of evicting selectively. With
/// [`insert_weighted`](Self::insert_weighted) the guard tracks the summed
/// weight of inserted entries instead of the entry count.
pub struct ResetCache<K, V> {
    name: &'static str,
    map: DashMap<K, V>,
    high_water: usize,
    weight: AtomicUsize,
    counters: Counters,
}

impl<K, V> ResetCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create a cache named `name` (used in logs) with the given size guard
    pub fn new(name: &'static str, high_water: usize) -> Self {
        Self {
            name,
            map: DashMap::new(),
            high_water,
            weight: AtomicUsize::new(0),
            counters: Counters::default(),
        }
    }

    /// Get a cloned value
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.map.get(key) {
            Some(entry) => {
                self.counters.hit();
                Some(entry.value().clone())
            }
            None => {
                self.counters.miss();
                None
            }
        }
    }

    /// Store a value, emptying the cache first if the size guard tripped
    pub fn insert(&self, key: K, value: V) {
        if self.map.len() > self.high_water {
            self.reset(self.map.len());
        }
        self.map.insert(key, value);
    }

    /// Store a value counting `weight` towards the size guard
    pub fn insert_weighted(&self, key: K, value: V, weight: usize) {
        let accumulated = self.weight.load(Ordering::Relaxed);
        if accumulated > self.high_water {
            self.reset(accumulated);
        }
        self.map.insert(key, value);
        self.weight.fetch_add(weight, Ordering::Relaxed);
    }

    fn reset(&self, size: usize) {
        warn!(
            cache = self.name,
            size,
            high_water = self.high_water,
            "Cache size guard reached, clearing"
        );
        self.clear();
        self.counters.reset();
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.map.clear();
        self.weight.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.map.len())
    }
}

/// Capacity-bounded set of keys with optional time-to-live
///
/// Used to memoise negative lookups. When full, the oldest tenth of the
/// entries is evicted in one batch.
pub struct BoundedSet<K> {
    name: &'static str,
    map: DashMap<K, Instant>,
    capacity: usize,
    ttl: Option<Duration>,
    counters: Counters,
}

impl<K> BoundedSet<K>
where
    K: Eq + Hash + Clone,
{
    /// Create a set holding at most `capacity` keys; `ttl` of `None` never expires
    pub fn new(name: &'static str, capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            name,
            map: DashMap::new(),
            capacity: capacity.max(1),
            ttl,
            counters: Counters::default(),
        }
    }

    /// True if the key is present and not expired
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let expired = match self.map.get(key) {
            Some(inserted_at) => match self.ttl {
                Some(ttl) if inserted_at.elapsed() > ttl => true,
                _ => {
                    self.counters.hit();
                    return true;
                }
            },
            None => false,
        };

        if expired {
            self.map.remove(key);
        }
        self.counters.miss();
        false
    }

    /// Remember a key
    pub fn insert(&self, key: K) {
        if self.map.len() >= self.capacity && !self.map.contains_key(&key) {
            self.evict_oldest();
        }
        self.map.insert(key, Instant::now());
    }

    /// Drop every key
    pub fn clear(&self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.map.len())
    }

    fn evict_oldest(&self) {
        let to_remove = (self.capacity / 10).max(1);

        let mut entries: Vec<(K, Instant)> = self
            .map
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        entries.sort_by_key(|(_, inserted_at)| *inserted_at);

        for (key, _) in entries.into_iter().take(to_remove) {
            self.map.remove(&key);
        }

        self.counters.reset();
        trace!(cache = self.name, removed = to_remove, "Evicted oldest entries");
    }
}
