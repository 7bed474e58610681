//! Authentication middleware for protected routes.
//!
//! Extracts the bearer token from the Authorization header, validates it with
//! the `JwtValidator`, and injects the claims into request extensions. A
//! rejected request never reaches its handler or the document store.

use crate::auth::JwtValidator;
use crate::errors::ApiError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub jwt_validator: Arc<JwtValidator>,
}

/// Authentication middleware that validates bearer tokens.
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// Returns 401 with `WWW-Authenticate` when the token is missing or invalid,
/// 503 when the signing keys cannot be fetched.
#[instrument(skip(state, req, next), name = "arb.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "arb.middleware.auth", "Missing Authorization header");
            ApiError::InvalidToken("Missing Authorization header".to_string())
        })?;

    let token = bearer_token(auth_header).ok_or_else(|| {
        tracing::debug!(target: "arb.middleware.auth", "Invalid Authorization header format");
        ApiError::InvalidToken("Invalid Authorization header format".to_string())
    })?;

    let claims = state.jwt_validator.validate(token).await?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Token part of a `Bearer` credential. The scheme is case-insensitive.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    // Full middleware behaviour against a mocked JWKS is covered in
    // tests/auth_tests.rs.

    use super::*;

    #[test]
    fn test_auth_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AuthState>();
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("BEARER  abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer a b"), None);
        assert_eq!(bearer_token("abc.def.ghi"), None);
    }
}
