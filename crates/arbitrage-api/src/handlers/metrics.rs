//! Prometheus metrics endpoint handler.
//!
//! Unauthenticated so Prometheus can scrape it. Labels carry route templates
//! and status codes only; no record contents or token data.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// ```text
/// # TYPE arb_http_requests_total counter
/// arb_http_requests_total{method="GET",endpoint="/api/arbitrages",status_code="200"} 42
/// ```
#[tracing::instrument(skip_all, name = "arb.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
