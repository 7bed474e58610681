//! HTTP routes for the Arbitrage API.
//!
//! Defines the Axum router and application state.

use crate::auth::{JwksClient, JwtValidator};
use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_auth, AuthState};
use crate::services::ArbitrageGateway;
use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Request timeout applied to every route.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Record Store Gateway over the configured document store.
    pub gateway: ArbitrageGateway,

    pub config: Config,

    /// Signing keys of the identity provider, shared with startup prefetch.
    pub jwks_client: Arc<JwksClient>,
}

/// Build the application routes.
///
/// - `/api/home` - welcome text (public)
/// - `/health`, `/ready`, `/metrics` - operational endpoints (public)
/// - `/api/arbitrages...` - CRUD (bearer token required)
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let jwt_validator = Arc::new(JwtValidator::new(
        state.jwks_client.clone(),
        state.config.issuer.clone(),
        state.config.audience.clone(),
        state.config.jwt_clock_skew_seconds,
    ));
    let auth_state = Arc::new(AuthState { jwt_validator });

    let public_routes = Router::new()
        .route("/api/home", get(handlers::home))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let protected_routes = Router::new()
        .route(
            "/api/arbitrages",
            get(handlers::list_arbitrages).post(handlers::create_arbitrage),
        )
        .route(
            "/api/arbitrages/sport/:sport",
            get(handlers::get_arbitrages_by_sport),
        )
        .route(
            "/api/arbitrages/:key",
            get(handlers::get_arbitrage)
                .put(handlers::update_arbitrage)
                .delete(handlers::delete_arbitrage),
        )
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth))
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer (innermost)
    // 2. TraceLayer
    // 3. http_metrics_middleware (outermost, sees every response)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(middleware::from_fn(http_metrics_middleware))
}
