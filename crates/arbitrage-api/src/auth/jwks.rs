//! JWKS client for the identity provider's public signing keys.
//!
//! The key set is fetched from `{issuer}/.well-known/jwks.json` once and kept
//! for the lifetime of the process. There is no TTL and no refresh on an
//! unknown `kid`: a token signed with a key that was not published at fetch
//! time is rejected.
//!
//! A failed fetch leaves the cache empty, so the next request that needs a key
//! tries again.

use crate::errors::ApiError;
use crate::observability::metrics::record_jwks_fetch;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::instrument;

/// Timeout for a single JWKS request.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON Web Key from the JWKS endpoint.
///
/// Carries the fields for both RSA (`n`, `e`) and OKP (`crv`, `x`) keys.
/// Other members Auth0 publishes (`x5c`, `x5t`) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" or "OKP").
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// Algorithm ("RS256" or "EdDSA").
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default)]
    pub e: Option<String>,

    /// Curve name ("Ed25519").
    #[serde(default)]
    pub crv: Option<String>,

    /// OKP public key (base64url).
    #[serde(default)]
    pub x: Option<String>,
}

/// JWKS document.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    pub keys: Vec<Jwk>,
}

/// Process-lifetime cache of the identity provider's signing keys.
pub struct JwksClient {
    jwks_url: String,
    http_client: reqwest::Client,

    /// `None` until the first successful fetch.
    keys: RwLock<Option<HashMap<String, Jwk>>>,
}

impl JwksClient {
    pub fn new(jwks_url: String) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "arb.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            keys: RwLock::new(None),
        }
    }

    /// Fetch the key set ahead of the first request.
    ///
    /// Returns the number of keys loaded. Does nothing if keys are already
    /// cached.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ServiceUnavailable` if the key set cannot be fetched.
    pub async fn prefetch(&self) -> Result<usize, ApiError> {
        if let Some(keys) = self.keys.read().await.as_ref() {
            return Ok(keys.len());
        }
        self.load().await
    }

    /// Get a JWK by key ID, fetching the key set on first use.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ServiceUnavailable` if the key set cannot be fetched.
    /// Returns `ApiError::InvalidToken` if the key ID is not in the set.
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn get_key(&self, kid: &str) -> Result<Jwk, ApiError> {
        {
            let keys = self.keys.read().await;
            if let Some(keys) = keys.as_ref() {
                return lookup(keys, kid);
            }
        }

        self.load().await?;

        let keys = self.keys.read().await;
        match keys.as_ref() {
            Some(keys) => lookup(keys, kid),
            None => Err(ApiError::ServiceUnavailable(
                "Authentication service unavailable".to_string(),
            )),
        }
    }

    /// Populate the cache, fetching at most once across concurrent callers.
    async fn load(&self) -> Result<usize, ApiError> {
        let mut keys = self.keys.write().await;
        if let Some(existing) = keys.as_ref() {
            return Ok(existing.len());
        }

        let fetched = self.fetch().await;
        record_jwks_fetch(if fetched.is_ok() { "success" } else { "error" });
        let fetched = fetched?;
        let count = fetched.len();
        *keys = Some(fetched);
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<HashMap<String, Jwk>, ApiError> {
        tracing::debug!(target: "arb.auth.jwks", url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "arb.auth.jwks", error = %e, "Failed to fetch JWKS");
                ApiError::ServiceUnavailable("Authentication service unavailable".to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "arb.auth.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(ApiError::ServiceUnavailable(
                "Authentication service unavailable".to_string(),
            ));
        }

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            tracing::error!(target: "arb.auth.jwks", error = %e, "Failed to parse JWKS response");
            ApiError::ServiceUnavailable("Authentication service unavailable".to_string())
        })?;

        let keys: HashMap<String, Jwk> = jwks
            .keys
            .into_iter()
            .map(|key| (key.kid.clone(), key))
            .collect();

        tracing::info!(target: "arb.auth.jwks", key_count = keys.len(), "JWKS loaded");
        Ok(keys)
    }
}

fn lookup(keys: &HashMap<String, Jwk>, kid: &str) -> Result<Jwk, ApiError> {
    keys.get(kid).cloned().ok_or_else(|| {
        tracing::debug!(target: "arb.auth.jwks", kid = %kid, "Key not found in JWKS");
        ApiError::InvalidToken("The access token is invalid or expired".to_string())
    })
}
