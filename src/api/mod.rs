//! API Module
//!
//! Optional admin HTTP surface exposing cache statistics.
//!
//! # Endpoints
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
