//! Bearer token validation.
//!
//! Validates access tokens against keys from the identity provider's JWKS.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - The algorithm comes from the JWK (`RSA` -> RS256, `OKP` -> EdDSA), never
//!   from the token header
//! - `exp`, `aud` and `iss` are required; expiry allows a bounded clock skew
//! - Every rejection carries the same generic message

use crate::auth::claims::Claims;
use crate::auth::jwks::{Jwk, JwksClient};
use crate::errors::ApiError;
use common::jwt::{decode_ed25519_public_key_jwk, extract_kid, rsa_components_valid};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use tracing::instrument;

const INVALID_TOKEN_MESSAGE: &str = "The access token is invalid or expired";

fn invalid_token() -> ApiError {
    ApiError::InvalidToken(INVALID_TOKEN_MESSAGE.to_string())
}

/// JWT validator bound to one issuer and audience.
pub struct JwtValidator {
    jwks_client: Arc<JwksClient>,
    issuer: String,
    audience: String,

    /// Leeway in seconds applied to `exp`.
    clock_skew_seconds: u64,
}

impl JwtValidator {
    pub fn new(
        jwks_client: Arc<JwksClient>,
        issuer: String,
        audience: String,
        clock_skew_seconds: u64,
    ) -> Self {
        Self {
            jwks_client,
            issuer,
            audience,
            clock_skew_seconds,
        }
    }

    /// Validate a bearer token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidToken` for any verification failure, and
    /// `ApiError::ServiceUnavailable` when the key set cannot be fetched.
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> Result<Claims, ApiError> {
        let kid = extract_kid(token).map_err(|e| {
            tracing::debug!(target: "arb.auth.jwt", error = ?e, "Token kid extraction failed");
            invalid_token()
        })?;

        let jwk = self.jwks_client.get_key(&kid).await?;
        let (decoding_key, algorithm) = decoding_key(&jwk)?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = self.clock_skew_seconds;
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            tracing::debug!(target: "arb.auth.jwt", error = %e, "Token verification failed");
            invalid_token()
        })?;

        tracing::debug!(target: "arb.auth.jwt", "Token validated successfully");
        Ok(token_data.claims)
    }
}

/// Build the verification key and algorithm for a JWK.
fn decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), ApiError> {
    if let Some(key_use) = &jwk.key_use {
        if key_use != "sig" {
            tracing::warn!(target: "arb.auth.jwt", kid = %jwk.kid, key_use = %key_use, "JWK is not a signing key");
            return Err(invalid_token());
        }
    }

    let (algorithm, expected_alg) = match jwk.kty.as_str() {
        "RSA" => (Algorithm::RS256, "RS256"),
        "OKP" => (Algorithm::EdDSA, "EdDSA"),
        other => {
            tracing::warn!(target: "arb.auth.jwt", kty = %other, "Unsupported JWK key type");
            return Err(invalid_token());
        }
    };

    if let Some(alg) = &jwk.alg {
        if alg != expected_alg {
            tracing::warn!(target: "arb.auth.jwt", alg = %alg, kty = %jwk.kty, "Unexpected JWK algorithm");
            return Err(invalid_token());
        }
    }

    let key = match algorithm {
        Algorithm::RS256 => rsa_key(jwk)?,
        _ => ed25519_key(jwk)?,
    };
    Ok((key, algorithm))
}

fn rsa_key(jwk: &Jwk) -> Result<DecodingKey, ApiError> {
    let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
        tracing::error!(target: "arb.auth.jwt", kid = %jwk.kid, "RSA JWK missing n or e");
        return Err(invalid_token());
    };

    if !rsa_components_valid(n, e) {
        tracing::error!(target: "arb.auth.jwt", kid = %jwk.kid, "RSA JWK components are not base64url");
        return Err(invalid_token());
    }

    DecodingKey::from_rsa_components(n, e).map_err(|err| {
        tracing::error!(target: "arb.auth.jwt", kid = %jwk.kid, error = %err, "Invalid RSA public key");
        invalid_token()
    })
}

fn ed25519_key(jwk: &Jwk) -> Result<DecodingKey, ApiError> {
    if let Some(crv) = &jwk.crv {
        if crv != "Ed25519" {
            tracing::warn!(target: "arb.auth.jwt", crv = %crv, "Unsupported OKP curve");
            return Err(invalid_token());
        }
    }

    let x = jwk.x.as_deref().ok_or_else(|| {
        tracing::error!(target: "arb.auth.jwt", kid = %jwk.kid, "JWK missing x field");
        invalid_token()
    })?;

    let public_key_bytes = decode_ed25519_public_key_jwk(x).map_err(|e| {
        tracing::error!(target: "arb.auth.jwt", error = %e, "Invalid public key encoding");
        invalid_token()
    })?;

    Ok(DecodingKey::from_ed_der(&public_key_bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use ring::signature::{Ed25519KeyPair, KeyPair};
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ISSUER: &str = "https://arbs.test.auth0.com/";
    const AUDIENCE: &str = "https://api.arbs.test";
    const KID: &str = "ed-test-key";

    /// Build PKCS#8 v1 document from Ed25519 seed.
    fn build_pkcs8_from_seed(seed: &[u8; 32]) -> Vec<u8> {
        let mut pkcs8 = vec![0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05];
        // OID 1.3.101.112
        pkcs8.extend_from_slice(&[0x06, 0x03, 0x2b, 0x65, 0x70]);
        pkcs8.extend_from_slice(&[0x04, 0x22, 0x04, 0x20]);
        pkcs8.extend_from_slice(seed);
        pkcs8
    }

    struct Signer {
        pkcs8: Vec<u8>,
        public_key: Vec<u8>,
    }

    impl Signer {
        fn new() -> Self {
            let seed = [7u8; 32];
            let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed).unwrap();
            Self {
                pkcs8: build_pkcs8_from_seed(&seed),
                public_key: key_pair.public_key().as_ref().to_vec(),
            }
        }

        fn sign(&self, kid: &str, claims: &Value) -> String {
            let mut header = Header::new(Algorithm::EdDSA);
            header.kid = Some(kid.to_string());
            encode(&header, claims, &EncodingKey::from_ed_der(&self.pkcs8)).unwrap()
        }

        fn jwk(&self) -> Value {
            json!({
                "kty": "OKP",
                "kid": KID,
                "crv": "Ed25519",
                "x": URL_SAFE_NO_PAD.encode(&self.public_key),
                "alg": "EdDSA",
                "use": "sig"
            })
        }
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn claims_with(exp_offset: i64, aud: &str, iss: &str) -> Value {
        json!({
            "sub": "auth0|trader-1",
            "iat": now(),
            "exp": now() + exp_offset,
            "aud": aud,
            "iss": iss,
            "azp": "dashboard"
        })
    }

    async fn validator_with(signer: &Signer) -> (JwtValidator, MockServer) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "keys": [signer.jwk()] })),
            )
            .mount(&server)
            .await;

        let jwks = Arc::new(JwksClient::new(format!(
            "{}/.well-known/jwks.json",
            server.uri()
        )));
        let validator =
            JwtValidator::new(jwks, ISSUER.to_string(), AUDIENCE.to_string(), 60);
        (validator, server)
    }

    fn assert_invalid(result: Result<Claims, ApiError>) {
        let err = result.expect_err("Expected error");
        assert!(
            matches!(&err, ApiError::InvalidToken(msg) if msg == INVALID_TOKEN_MESSAGE),
            "Expected generic InvalidToken, got {:?}",
            err
        );
    }

    #[tokio::test]
    async fn test_valid_token_returns_claims() {
        let signer = Signer::new();
        let (validator, _server) = validator_with(&signer).await;

        let token = signer.sign(KID, &claims_with(3600, AUDIENCE, ISSUER));
        let claims = validator.validate(&token).await.unwrap();

        assert_eq!(claims.sub, "auth0|trader-1");
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.azp.as_deref(), Some("dashboard"));
    }

    #[tokio::test]
    async fn test_audience_array_is_accepted() {
        let signer = Signer::new();
        let (validator, _server) = validator_with(&signer).await;

        let mut claims = claims_with(3600, AUDIENCE, ISSUER);
        claims["aud"] = json!([AUDIENCE, "https://arbs.test.auth0.com/userinfo"]);

        assert!(validator.validate(&signer.sign(KID, &claims)).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let signer = Signer::new();
        let (validator, _server) = validator_with(&signer).await;

        let token = signer.sign(KID, &claims_with(-3600, AUDIENCE, ISSUER));
        assert_invalid(validator.validate(&token).await);
    }

    #[tokio::test]
    async fn test_expiry_within_clock_skew_accepted() {
        let signer = Signer::new();
        let (validator, _server) = validator_with(&signer).await;

        let token = signer.sign(KID, &claims_with(-20, AUDIENCE, ISSUER));
        assert!(validator.validate(&token).await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_audience_rejected() {
        let signer = Signer::new();
        let (validator, _server) = validator_with(&signer).await;

        let token = signer.sign(KID, &claims_with(3600, "https://other.api", ISSUER));
        assert_invalid(validator.validate(&token).await);
    }

    #[tokio::test]
    async fn test_wrong_issuer_rejected() {
        let signer = Signer::new();
        let (validator, _server) = validator_with(&signer).await;

        let token = signer.sign(
            KID,
            &claims_with(3600, AUDIENCE, "https://evil.auth0.com/"),
        );
        assert_invalid(validator.validate(&token).await);
    }

    #[tokio::test]
    async fn test_missing_audience_claim_rejected() {
        let signer = Signer::new();
        let (validator, _server) = validator_with(&signer).await;

        let mut claims = claims_with(3600, AUDIENCE, ISSUER);
        claims.as_object_mut().unwrap().remove("aud");
        assert_invalid(validator.validate(&signer.sign(KID, &claims)).await);
    }

    #[tokio::test]
    async fn test_missing_exp_claim_rejected() {
        let signer = Signer::new();
        let (validator, _server) = validator_with(&signer).await;

        let mut claims = claims_with(3600, AUDIENCE, ISSUER);
        claims.as_object_mut().unwrap().remove("exp");
        assert_invalid(validator.validate(&signer.sign(KID, &claims)).await);
    }

    #[tokio::test]
    async fn test_unknown_kid_rejected() {
        let signer = Signer::new();
        let (validator, _server) = validator_with(&signer).await;

        let token = signer.sign("unpublished", &claims_with(3600, AUDIENCE, ISSUER));
        assert_invalid(validator.validate(&token).await);
    }

    #[tokio::test]
    async fn test_signature_from_other_key_rejected() {
        let signer = Signer::new();
        let (validator, _server) = validator_with(&signer).await;

        let other_seed = [9u8; 32];
        let other = EncodingKey::from_ed_der(&build_pkcs8_from_seed(&other_seed));
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = Some(KID.to_string());
        let token = encode(&header, &claims_with(3600, AUDIENCE, ISSUER), &other).unwrap();

        assert_invalid(validator.validate(&token).await);
    }

    #[tokio::test]
    async fn test_malformed_and_oversized_tokens_rejected() {
        let signer = Signer::new();
        let (validator, _server) = validator_with(&signer).await;

        assert_invalid(validator.validate("not-a-jwt").await);
        assert_invalid(validator.validate(&"a".repeat(9000)).await);
    }

    #[test]
    fn test_decoding_key_rejects_unsupported_kty() {
        let jwk: Jwk = serde_json::from_value(json!({"kty": "EC", "kid": "k"})).unwrap();
        assert!(matches!(decoding_key(&jwk), Err(ApiError::InvalidToken(_))));
    }

    #[test]
    fn test_decoding_key_rejects_mismatched_alg() {
        let jwk: Jwk = serde_json::from_value(json!({
            "kty": "OKP", "kid": "k", "crv": "Ed25519", "x": "dGVzdA", "alg": "RS256"
        }))
        .unwrap();
        assert!(decoding_key(&jwk).is_err());
    }

    #[test]
    fn test_decoding_key_rejects_encryption_key() {
        let jwk: Jwk = serde_json::from_value(json!({
            "kty": "RSA", "kid": "k", "use": "enc", "n": "v_bi4ud0L4cO", "e": "AQAB"
        }))
        .unwrap();
        assert!(decoding_key(&jwk).is_err());
    }

    #[test]
    fn test_decoding_key_rsa_requires_components() {
        let missing: Jwk =
            serde_json::from_value(json!({"kty": "RSA", "kid": "k", "e": "AQAB"})).unwrap();
        assert!(decoding_key(&missing).is_err());

        let broken: Jwk = serde_json::from_value(json!({
            "kty": "RSA", "kid": "k", "n": "!!!", "e": "AQAB"
        }))
        .unwrap();
        assert!(decoding_key(&broken).is_err());

        let valid: Jwk = serde_json::from_value(json!({
            "kty": "RSA", "kid": "k", "alg": "RS256", "n": "v_bi4ud0L4cO", "e": "AQAB"
        }))
        .unwrap();
        let (_, algorithm) = decoding_key(&valid).unwrap();
        assert_eq!(algorithm, Algorithm::RS256);
    }

    #[test]
    fn test_decoding_key_okp_requires_x() {
        let jwk: Jwk =
            serde_json::from_value(json!({"kty": "OKP", "kid": "k", "crv": "Ed25519"})).unwrap();
        assert!(decoding_key(&jwk).is_err());
    }
}
