//! Arbitrage API Library
//!
//! REST CRUD over stored arbitrage betting opportunities, gated by bearer
//! tokens issued by an Auth0-style identity provider.
//!
//! # Architecture
//!
//! Handler -> Service -> Repository:
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/arbitrages.rs -> repositories/*.rs
//! ```
//!
//! Requests to `/api/arbitrages` pass `middleware::auth` first, which
//! validates the token with `auth::JwtValidator`.
//!
//! # Modules
//!
//! - `auth` - JWKS cache and token validation
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authentication and HTTP metrics layers
//! - `models` - Wire types and response envelope
//! - `observability` - Prometheus metrics
//! - `repositories` - Document store seam and its MongoDB/in-memory backends
//! - `routes` - Axum router setup
//! - `services` - Record Store Gateway

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
