//! Observability for the Arbitrage API.
//!
//! Metric definitions and the Prometheus recorder setup. Request logging is
//! handled by `tower_http::trace::TraceLayer` in `routes`.

pub mod metrics;
