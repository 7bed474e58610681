//! JWT utilities shared by the Arbitrage API crates.
//!
//! This module provides the pieces of bearer-token validation that do not
//! depend on the HTTP layer:
//! - Size limits applied before any parsing
//! - Clock skew bounds for `exp` leeway configuration
//! - Key ID extraction from JWT headers
//! - Issuer and JWKS URL derivation from an identity provider domain
//! - Base64url decoding of JWK key material
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{extract_kid, issuer_from_domain, jwks_url_for_issuer};
//!
//! let issuer = issuer_from_domain("example.eu.auth0.com");
//! let jwks_url = jwks_url_for_issuer(&issuer);
//!
//! // Extract key ID for JWKS lookup (size-checked first)
//! let kid = extract_kid(token)?;
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Tokens larger than this are rejected before base64 decoding or signature
/// verification. Typical identity provider access tokens are under 2KB.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Default leeway applied to `exp` validation.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(60);

/// Maximum configurable leeway (10 minutes).
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// Path of the key set published by the identity provider, relative to the issuer.
pub const JWKS_PATH: &str = ".well-known/jwks.json";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while inspecting a JWT before verification.
///
/// Messages are intentionally generic; details are logged at debug level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Token is missing required `kid` header.
    #[error("The access token is invalid or expired")]
    MissingKid,
}

// =============================================================================
// Functions
// =============================================================================

/// Extract the `kid` (key ID) from a JWT header without verifying the signature.
///
/// The returned value must only be used to look up a key in a trusted JWKS;
/// the token still has to be verified with that key.
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Wrong structure, bad base64, or invalid JSON header
/// - `MissingKid` - Header has no `kid`, or it is empty or not a string
pub fn extract_kid(token: &str) -> Result<String, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    let header_part = parts.first().ok_or(JwtValidationError::MalformedToken)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingKid)
}

/// Build the expected `iss` claim from an identity provider domain.
///
/// A bare host (`tenant.eu.auth0.com`) is given an `https://` scheme; a value
/// that already carries a scheme is kept. The result always ends in `/`,
/// matching the issuer string Auth0-style providers put in their tokens.
#[must_use]
pub fn issuer_from_domain(domain: &str) -> String {
    let trimmed = domain.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        format!("{trimmed}/")
    } else {
        format!("https://{trimmed}/")
    }
}

/// JWKS discovery URL for an issuer produced by [`issuer_from_domain`].
#[must_use]
pub fn jwks_url_for_issuer(issuer: &str) -> String {
    if issuer.ends_with('/') {
        format!("{issuer}{JWKS_PATH}")
    } else {
        format!("{issuer}/{JWKS_PATH}")
    }
}

/// Decode an Ed25519 public key from a JWK `x` field (base64url, no padding).
///
/// # Errors
///
/// Returns `base64::DecodeError` if the content cannot be decoded.
pub fn decode_ed25519_public_key_jwk(x_b64url: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(x_b64url)
}

/// Whether RSA JWK components (`n`, `e`) are non-empty, well-formed base64url.
///
/// `jsonwebtoken` accepts the encoded components directly; this lets the
/// caller reject a broken key with a precise log line before building it.
#[must_use]
pub fn rsa_components_valid(n: &str, e: &str) -> bool {
    let decodes = |part: &str| URL_SAFE_NO_PAD.decode(part).is_ok_and(|bytes| !bytes.is_empty());
    decodes(n) && decodes(e)
}

// =============================================================================
// Tests
// =============================================================================
