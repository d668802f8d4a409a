//! Proxy Module
//!
//! Connection pipeline: accept loop, per-connection worker and origin fetcher.

mod fetch;
mod server;
mod worker;

use std::future::Future;
use std::io;
use std::time::Duration;

pub use fetch::{connect_origin, fetch, relay_response, FetchOutcome};
pub use server::ProxyServer;
pub use worker::handle_connection;

use crate::cache::{self, CacheStore, SharedCache};
use crate::config::Config;

/// Chunk size for relaying origin responses.
pub const RELAY_CHUNK: usize = 8192;

// == Proxy Context ==
/// Everything a connection worker needs, cloned into each task.
#[derive(Debug, Clone)]
pub struct ProxyContext {
    /// The process-wide response cache
    pub cache: SharedCache,
    /// Largest response that will be cached
    pub max_object_size: usize,
    /// Deadline for individual socket reads and origin connects
    pub io_timeout: Option<Duration>,
}

impl ProxyContext {
    /// Creates a context around an existing shared cache.
    pub fn new(cache: SharedCache, max_object_size: usize, io_timeout: Option<Duration>) -> Self {
        Self {
            cache,
            max_object_size,
            io_timeout,
        }
    }

    /// Builds a fresh cache sized from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            cache::shared(CacheStore::new(config.max_cache_size)),
            config.max_object_size,
            config.io_timeout,
        )
    }
}

// == Deadlines ==
/// Runs `fut` under an optional deadline.
///
/// Expiry surfaces as an `io::ErrorKind::TimedOut` error.
pub async fn with_deadline<T, F>(deadline: Option<Duration>, fut: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .unwrap_or_else(|_| Err(io::Error::new(io::ErrorKind::TimedOut, "deadline expired"))),
        None => fut.await,
    }
}
