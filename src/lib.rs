//! Caching Proxy - A concurrent forwarding HTTP proxy
//!
//! Relays GET requests between browsers and origin servers, keeping a
//! size-bounded, thread-safe LRU cache of previously fetched responses.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod proxy;

pub use api::AppState;
pub use cache::{CacheEntry, CacheStore, SharedCache};
pub use config::Config;
pub use error::{ProxyError, Result};
pub use proxy::{ProxyContext, ProxyServer};
