//! API Handlers
//!
//! Read-only admin endpoints over the proxy's cache.

use axum::{extract::State, Json};

use crate::cache::SharedCache;
use crate::models::{HealthResponse, StatsResponse};

/// Application state shared across all handlers.
///
/// Holds the same cache the proxy workers use.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache store
    pub cache: SharedCache,
}

impl AppState {
    /// Creates a new AppState around the shared cache.
    pub fn new(cache: SharedCache) -> Self {
        Self { cache }
    }
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    // Shared lock, same as a proxy lookup
    let stats = state.cache.read().await.stats();
    Json(StatsResponse::from(stats))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
