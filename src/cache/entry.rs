//! Cache Entry Module
//!
//! Defines a cached origin response keyed by the absolute request URL.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// == Cache Entry ==
/// A captured origin response, as handed in to and copied out of the store.
///
/// The body is reference counted so a lookup copy shares bytes with the
/// stored slot instead of duplicating them under the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Absolute request URL exactly as received from the client
    pub key: String,
    /// Raw response bytes (status line, headers and body)
    pub body: Arc<[u8]>,
    /// Logical clock value of the most recent touch
    pub last_access: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry for `key` holding `body`.
    ///
    /// `last_access` is stamped by the store on insertion.
    pub fn new(key: impl Into<String>, body: impl Into<Arc<[u8]>>) -> Self {
        Self {
            key: key.into(),
            body: body.into(),
            last_access: 0,
        }
    }

    // == Size ==
    /// Byte length of the cached response.
    pub fn size(&self) -> usize {
        self.body.len()
    }
}

// == Slot ==
/// Store-owned form of an entry.
///
/// `last_access` is atomic so a hit can refresh recency while the store is
/// only borrowed immutably (shared lock).
#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) key: String,
    pub(crate) body: Arc<[u8]>,
    pub(crate) last_access: AtomicU64,
    /// Insertion sequence number, breaks ties between equal access stamps
    pub(crate) inserted: u64,
}

impl Slot {
    pub(crate) fn new(entry: CacheEntry, stamp: u64, inserted: u64) -> Self {
        Self {
            key: entry.key,
            body: entry.body,
            last_access: AtomicU64::new(stamp),
            inserted,
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.body.len()
    }

    pub(crate) fn stamp(&self) -> u64 {
        self.last_access.load(Ordering::Acquire)
    }

    /// Refreshes recency. Concurrent hits keep the larger stamp.
    pub(crate) fn touch(&self, stamp: u64) {
        self.last_access.fetch_max(stamp, Ordering::AcqRel);
    }

    pub(crate) fn snapshot(&self) -> CacheEntry {
        CacheEntry {
            key: self.key.clone(),
            body: Arc::clone(&self.body),
            last_access: self.stamp(),
        }
    }
}
