//! Arbitrage API error types.
//!
//! All errors map to an HTTP status code and the `{message, data, error}`
//! envelope via the `IntoResponse` impl. Store failures are logged
//! server-side; clients only see a generic description.

use crate::models::ApiResponse;
use crate::repositories::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Arbitrage API error type.
///
/// Maps to HTTP status codes:
/// - Store: 500 Internal Server Error
/// - InvalidToken: 401 Unauthorized
/// - NotFound: 404 Not Found
/// - Conflict: 409 Conflict
/// - BadRequest: 400 Bad Request
/// - ServiceUnavailable: 503 Service Unavailable
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}: {source}")]
    Store {
        /// Client-facing description of the failed operation.
        message: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    /// Wrap a store failure with the message the client should see.
    ///
    /// Intended for `map_err`:
    ///
    /// ```rust,ignore
    /// gateway.list_all().await.map_err(ApiError::store("failed to retrieve all arbitrages"))?;
    /// ```
    pub fn store(message: &'static str) -> impl FnOnce(StoreError) -> ApiError {
        move |source| ApiError::Store { message, source }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (message, error) = match self {
            ApiError::Store { message, source } => {
                tracing::error!(target: "arb.store", error = %source, operation = message, "Document store operation failed");
                (
                    message.to_string(),
                    "An internal database error occurred",
                )
            }
            ApiError::InvalidToken(reason) => (reason, "Unauthorized"),
            ApiError::NotFound(message) => (message, "Not found"),
            ApiError::Conflict(message) => (message, "Conflict"),
            ApiError::BadRequest(message) => (message, "Bad Request"),
            ApiError::ServiceUnavailable(reason) => {
                tracing::warn!(target: "arb.availability", reason = %reason, "Service unavailable");
                (
                    "Service temporarily unavailable".to_string(),
                    "Service Unavailable",
                )
            }
        };

        let body = ApiResponse::<()>::failure(message, error);
        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) =
                "Bearer realm=\"arbitrage-api\", error=\"invalid_token\"".parse()
            {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}
