//! Metrics definitions for the Arbitrage API.
//!
//! All metrics follow Prometheus naming conventions:
//! - `arb_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: HTTP methods only
//! - `endpoint`: route templates, never raw ids or sport names
//! - `status`: success, error, timeout
//! - `operation`: fixed set of store operations named by the gateway

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder and return its handle for `/metrics`.
///
/// # Errors
///
/// Returns an error if a recorder is already installed in this process.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("arb_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.300, 0.500, 1.000, 2.000, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("arb_store_operation".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.020, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set store operation buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion.
///
/// Metric: `arb_http_requests_total`, `arb_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status` / `status_code`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("arb_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("arb_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout.
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Replace dynamic path segments with route placeholders.
fn normalize_endpoint(path: &str) -> String {
    match path {
        "/health" | "/ready" | "/metrics" | "/api/home" | "/api/arbitrages" => path.to_string(),
        _ => normalize_dynamic_endpoint(path),
    }
}

fn normalize_dynamic_endpoint(path: &str) -> String {
    let parts: Vec<&str> = path.trim_end_matches('/').split('/').collect();

    // ["", "api", "arbitrages", key]
    if parts.len() == 4 && path.starts_with("/api/arbitrages/") {
        return "/api/arbitrages/{key}".to_string();
    }

    // ["", "api", "arbitrages", "sport", sport]
    if parts.len() == 5 && path.starts_with("/api/arbitrages/sport/") {
        return "/api/arbitrages/sport/{sport}".to_string();
    }

    "/other".to_string()
}

// ============================================================================
// Document Store Metrics
// ============================================================================

/// Record one document store operation issued by the gateway.
///
/// Metric: `arb_store_operations_total`, `arb_store_operation_duration_seconds`
/// Labels: `operation`, `status`
pub fn record_store_operation(operation: &str, status: &str, duration: Duration) {
    histogram!("arb_store_operation_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("arb_store_operations_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a JWKS fetch attempt against the identity provider.
///
/// Metric: `arb_jwks_fetches_total`
/// Labels: `status`
pub fn record_jwks_fetch(status: &str) {
    counter!("arb_jwks_fetches_total",
        "status" => status.to_string()
    )
    .increment(1);
}
