//! Axum HTTP API server.
//!
//! This crate provides:
//! - The editor endpoints (cut, convert, resize, crop, merge)
//! - Object endpoints (upload, list, download, URL, delete)
//! - Health/readiness probes and Prometheus metrics
//! - Rate limiting, CORS and security headers

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
