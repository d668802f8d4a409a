//! Cache Store Module
//!
//! Size-bounded response cache with LRU eviction by logical access time.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::entry::Slot;
use crate::cache::lru::{select_victim, LogicalClock};
use crate::cache::stats::StatsCounters;
use crate::cache::{CacheEntry, CacheStats};

// == Cache Store ==
/// Byte-bounded cache mapping absolute URLs to captured responses.
///
/// `lookup` takes `&self` and is meant to run under a shared lock; `insert`
/// takes `&mut self` and runs under the exclusive lock. The store does not
/// enforce any per-object size limit.
#[derive(Debug)]
pub struct CacheStore {
    /// Entry storage, unordered
    slots: Vec<Slot>,
    /// Key to position in `slots`
    index: HashMap<String, usize>,
    /// Sum of all slot sizes
    total_size: usize,
    /// Maximum total size in bytes
    capacity_bytes: usize,
    /// Shared access clock
    clock: LogicalClock,
    /// Monotonic insertion counter
    next_insert: u64,
    /// Performance statistics
    stats: StatsCounters,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store holding at most `capacity_bytes` of responses.
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            total_size: 0,
            capacity_bytes,
            clock: LogicalClock::new(),
            next_insert: 0,
            stats: StatsCounters::default(),
        }
    }

    // == Lookup ==
    /// Finds the entry stored under exactly `key`.
    ///
    /// Advances the clock once whether or not the key is present. A hit
    /// refreshes the entry's access stamp and returns a copy of it.
    pub fn lookup(&self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.tick();

        match self.index.get(key).map(|&i| &self.slots[i]) {
            Some(slot) => {
                slot.touch(now);
                self.stats.record_hit();
                Some(slot.snapshot())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Insert ==
    /// Adds `entry`, replacing any entry already stored under the same key.
    ///
    /// Afterwards evicts least recently used entries until the total size fits
    /// the capacity or the store is empty. Returns the number of evictions.
    pub fn insert(&mut self, entry: CacheEntry) -> usize {
        if let Some(&position) = self.index.get(&entry.key) {
            self.remove_at(position);
        }

        let stamp = self.clock.current();
        let inserted = self.next_insert;
        self.next_insert += 1;

        let slot = Slot::new(entry, stamp, inserted);
        self.total_size += slot.size();
        self.index.insert(slot.key.clone(), self.slots.len());
        self.slots.push(slot);
        self.stats.record_insertion();

        let mut evicted = 0;
        while self.total_size > self.capacity_bytes {
            let Some(victim) = select_victim(&self.slots) else {
                break;
            };
            let slot = self.remove_at(victim);
            debug!(url = %slot.key, size = slot.size(), "Evicted cache entry");
            self.stats.record_eviction();
            evicted += 1;
        }

        evicted
    }

    /// Removes the slot at `position` and keeps the index consistent.
    fn remove_at(&mut self, position: usize) -> Slot {
        let slot = self.slots.swap_remove(position);
        self.index.remove(&slot.key);
        if let Some(moved) = self.slots.get(position) {
            self.index.insert(moved.key.clone(), position);
        }
        self.total_size -= slot.size();
        slot
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.snapshot();
        stats.total_entries = self.slots.len();
        stats.total_bytes = self.total_size;
        stats.capacity_bytes = self.capacity_bytes;
        stats
    }

    // == Accessors ==
    /// Returns the sum of all cached body sizes.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Returns the configured capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity_bytes
    }

    /// Returns true if an entry is stored under `key`, without touching it.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
