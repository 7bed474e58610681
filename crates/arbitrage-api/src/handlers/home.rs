//! Public landing endpoint.

/// Handler for GET /api/home
///
/// Unauthenticated; confirms the API is reachable.
pub async fn home() -> &'static str {
    "Welcome to the Arbitrage API!"
}
