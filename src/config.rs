//! Configuration Module
//!
//! Handles loading proxy configuration from the command line and environment.

use std::env;
use std::time::Duration;

use crate::cache::{DEFAULT_MAX_CACHE_SIZE, DEFAULT_MAX_OBJECT_SIZE};

/// Proxy configuration parameters.
///
/// The listen port comes from the command line; everything else can be
/// configured via environment variables with defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// TCP port the proxy listens on
    pub listen_port: u16,
    /// Maximum total bytes held by the cache
    pub max_cache_size: usize,
    /// Largest single response that will be cached
    pub max_object_size: usize,
    /// Port for the admin API, disabled when None
    pub admin_port: Option<u16>,
    /// Deadline for each socket read and origin connect, disabled when None
    pub io_timeout: Option<Duration>,
}

impl Config {
    /// Creates a new Config for `listen_port`, loading the rest from the environment.
    ///
    /// # Environment Variables
    /// - `MAX_CACHE_SIZE` - Maximum total cache bytes (default: 1049000)
    /// - `MAX_OBJECT_SIZE` - Maximum cacheable response bytes (default: 102400)
    /// - `ADMIN_PORT` - Admin API port (default: disabled)
    /// - `IO_TIMEOUT_SECS` - Socket deadline in seconds, 0 disables (default: disabled)
    pub fn from_env(listen_port: u16) -> Self {
        Self {
            listen_port,
            max_cache_size: env::var("MAX_CACHE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_CACHE_SIZE),
            max_object_size: env::var("MAX_OBJECT_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_OBJECT_SIZE),
            admin_port: env::var("ADMIN_PORT").ok().and_then(|v| v.parse().ok()),
            io_timeout: env::var("IO_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|&secs| secs > 0)
                .map(Duration::from_secs),
        }
    }

    /// Checks that the size limits are usable together.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_object_size == 0 {
            return Err("MAX_OBJECT_SIZE must be greater than zero".to_string());
        }
        if self.max_object_size > self.max_cache_size {
            return Err(format!(
                "MAX_OBJECT_SIZE ({}) exceeds MAX_CACHE_SIZE ({})",
                self.max_object_size, self.max_cache_size
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_port: 8080,
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            max_object_size: DEFAULT_MAX_OBJECT_SIZE,
            admin_port: None,
            io_timeout: None,
        }
    }
}
