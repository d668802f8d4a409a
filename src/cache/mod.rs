//! Cache Module
//!
//! In-memory response cache bounded by total bytes, with LRU eviction.

mod entry;
mod lru;
mod stats;
mod store;


use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::CacheStore;

/// Cache store shared across connection tasks.
///
/// Lookups take the read lock, insertions the write lock. Neither guard is
/// held across network I/O.
pub type SharedCache = Arc<RwLock<CacheStore>>;

// == Public Constants ==
/// Default maximum total cache size in bytes
pub const DEFAULT_MAX_CACHE_SIZE: usize = 1_049_000;

/// Default maximum size of a single cacheable response in bytes
pub const DEFAULT_MAX_OBJECT_SIZE: usize = 102_400;

/// Wraps a store for sharing between tasks.
pub fn shared(store: CacheStore) -> SharedCache {
    Arc::new(RwLock::new(store))
}
