//! HTTP middleware for the Arbitrage API.
//!
//! # Components
//!
//! - `auth` - Bearer token authentication for `/api/arbitrages` routes
//! - `http_metrics` - Request count and latency for every response

pub mod auth;
pub mod http_metrics;

pub use auth::{require_auth, AuthState};
pub use http_metrics::http_metrics_middleware;
