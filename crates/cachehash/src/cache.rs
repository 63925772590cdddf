//! CacheHash: fixed-capacity LRU cache keyed by byte strings

use std::collections::HashMap;
use std::fmt;

use ahash::RandomState;
use tracing::{debug, trace};

use crate::arena::{Entry, SlotArena};
use crate::error::{Error, Result};
use crate::stats::CacheStats;

/// Callback receiving values displaced by capacity pressure
pub type EvictCallback<V> = Box<dyn FnMut(V)>;

/// LRU cache over a preallocated slot arena
///
/// Keys are non-empty byte strings copied into cache-owned storage; values
/// are opaque to the cache. Every operation except teardown is O(1).
///
/// Contract violations (zero capacity, empty key, inserting a key that is
/// already cached) panic. The `try_*` variants report them as [`Error`]
/// instead.
pub struct CacheHash<V> {
    /// Key bytes -> arena slot holding that key
    index: HashMap<Box<[u8]>, usize, RandomState>,

    /// Slots and recency list
    arena: SlotArena<V>,

    /// Occupied slots
    size: usize,

    /// Called with values evicted by `put`
    evict_cb: Option<EvictCallback<V>>,

    stats: CacheStats,
}

impl<V> CacheHash<V> {
    /// Create a cache holding at most `capacity` entries
    ///
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::build(capacity, None)
    }

    /// Create a cache that hands evicted values to `cb`
    ///
    /// The callback runs inline during [`put`](Self::put) and must not
    /// touch the cache.
    ///
    /// # Panics
    /// If `capacity` is zero.
    pub fn with_evict_callback<F>(capacity: usize, cb: F) -> Self
    where
        F: FnMut(V) + 'static,
    {
        Self::build(capacity, Some(Box::new(cb)))
    }

    /// Create a cache, rejecting a zero capacity instead of panicking
    pub fn try_new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        Ok(Self::new(capacity))
    }

    fn build(capacity: usize, evict_cb: Option<EvictCallback<V>>) -> Self {
        let arena = SlotArena::new(capacity);
        debug!(capacity, "cachehash created");

        Self {
            index: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            arena,
            size: 0,
            evict_cb,
            stats: CacheStats::new(),
        }
    }

    /// Install or replace the eviction callback
    pub fn set_evict_callback<F>(&mut self, cb: F)
    where
        F: FnMut(V) + 'static,
    {
        self.evict_cb = Some(Box::new(cb));
    }

    /// Look up a key without touching recency order
    ///
    /// # Panics
    /// If `key` is empty.
    pub fn has(&self, key: &[u8]) -> Option<&V> {
        assert_key(key);
        let &idx = self.index.get(key)?;
        Some(&self.occupied(idx).value)
    }

    /// Look up a key and mark it most recently used
    ///
    /// # Panics
    /// If `key` is empty.
    pub fn get(&mut self, key: &[u8]) -> Option<&V> {
        assert_key(key);
        match self.index.get(key) {
            Some(&idx) => {
                self.stats.record_hit();
                self.arena.promote(idx);
                Some(&self.occupied(idx).value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Evict the least recently used entry if the cache is full
    ///
    /// The value is returned to the caller; the eviction callback is not
    /// invoked.
    pub fn evict_if_full(&mut self) -> Option<V> {
        if !self.is_full() {
            return None;
        }

        let tail = self.arena.tail();
        let Some(Entry { key, value }) = self.arena.take(tail) else {
            panic!("cache is full but tail slot {} is free", tail);
        };
        match self.index.remove(&key) {
            Some(idx) if idx == tail => {}
            other => panic!(
                "index maps evicted key to slot {:?}, expected {}",
                other, tail
            ),
        }
        self.size -= 1;
        self.stats.record_eviction();
        trace!(slot = tail, key_len = key.len(), "evicted least recently used entry");

        Some(value)
    }

    /// Insert a new entry, evicting the least recently used one if full
    ///
    /// # Panics
    /// If `key` is empty or already cached. Keys are insert-only.
    pub fn put(&mut self, key: &[u8], value: V) {
        assert_key(key);
        assert!(
            !self.index.contains_key(key),
            "Key already present ({} bytes)",
            key.len()
        );
        self.insert(key, value);
    }

    /// Insert a new entry, reporting contract violations as errors
    pub fn try_put(&mut self, key: &[u8], value: V) -> Result<()> {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }
        if self.index.contains_key(key) {
            return Err(Error::DuplicateKey(key.len()));
        }
        self.insert(key, value);
        Ok(())
    }

    fn insert(&mut self, key: &[u8], value: V) {
        if let Some(evicted) = self.evict_if_full() {
            if let Some(cb) = self.evict_cb.as_mut() {
                cb(evicted);
            }
        }

        // Free slots trail the list, so the tail is free here
        let idx = self.arena.tail();
        self.arena.fill(idx, Box::from(key), value);
        self.arena.promote(idx);
        self.size += 1;
        self.index.insert(Box::from(key), idx);
        self.stats.record_insert();
    }

    /// Destroy the cache, dropping every cached value
    pub fn free(self) {
        self.free_with(drop);
    }

    /// Destroy the cache, handing every cached value to `release`
    ///
    /// `release` runs once per occupied slot, most recently used first. The
    /// eviction callback is not invoked.
    pub fn free_with<F>(self, mut release: F)
    where
        F: FnMut(V),
    {
        let CacheHash {
            mut index,
            arena,
            size,
            ..
        } = self;

        index.clear();
        drop(index);

        let drained = arena.drain(|entry| release(entry.value));
        debug_assert_eq!(drained, size);
        debug!(drained, "cachehash freed");
    }

    /// Iterate entries from most to least recently used
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &V)> + '_ {
        self.arena
            .iter()
            .map_while(|(_, slot)| slot.entry.as_ref())
            .map(|entry| (&*entry.key, &entry.value))
    }

    /// Get current number of entries
    pub fn len(&self) -> usize {
        self.size
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Check if the next insert will evict
    pub fn is_full(&self) -> bool {
        self.size == self.arena.capacity()
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Reset cache statistics (entries are untouched)
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Verify list, index and size agree
    pub fn check_invariants(&self) -> Result<()> {
        self.arena.check_links()?;

        let mut occupied = 0;
        let mut seen_free = false;
        for (idx, slot) in self.arena.iter() {
            let Some(entry) = &slot.entry else {
                seen_free = true;
                continue;
            };
            if seen_free {
                return Err(Error::Invariant(format!(
                    "occupied slot {} follows a free slot",
                    idx
                )));
            }
            if entry.key.is_empty() {
                return Err(Error::Invariant(format!("slot {} holds an empty key", idx)));
            }
            match self.index.get(&entry.key) {
                Some(&mapped) if mapped == idx => {}
                other => {
                    return Err(Error::Invariant(format!(
                        "slot {} is indexed as {:?}",
                        idx, other
                    )))
                }
            }
            occupied += 1;
        }

        if occupied != self.size {
            return Err(Error::Invariant(format!(
                "{} occupied slots, size is {}",
                occupied, self.size
            )));
        }
        if self.index.len() != self.size {
            return Err(Error::Invariant(format!(
                "index holds {} keys, size is {}",
                self.index.len(),
                self.size
            )));
        }
        Ok(())
    }

    fn occupied(&self, idx: usize) -> &Entry<V> {
        match self.arena.entry(idx) {
            Some(entry) => entry,
            None => panic!("index points at free slot {}", idx),
        }
    }
}

impl<V> fmt::Debug for CacheHash<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheHash")
            .field("capacity", &self.capacity())
            .field("len", &self.size)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

fn assert_key(key: &[u8]) {
    assert!(!key.is_empty(), "Key must not be empty");
}
