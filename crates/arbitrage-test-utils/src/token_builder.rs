//! RS256 test tokens.
//!
//! Signs with the fixture key in `fixtures/rsa_test_key.pem` (2048-bit,
//! test-only). `TestSigner::jwk` publishes the matching public key the way
//! Auth0 does, so tokens verify through the real `JwtValidator`.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

const TEST_RSA_PRIVATE_KEY: &str = include_str!("../fixtures/rsa_test_key.pem");

/// Base64url modulus of the fixture key.
const TEST_RSA_MODULUS: &str = "v_bi4ud0L4cO_2MW8FcPUV9gXqOeR9ODzHiO1za99Bz9UX1t--DYwfIlT_dP0HMOc8ujMft9fNh6RHuiQfw3KBCEHEXfIMLHCvzDpkSOlFzKWFTlxq8EBpb4J8XsBus17n7n294QXMTJM6rEjuJo1koZ8UMlY0pxjLSK_yl4z9o2LYHbEMLXJKDRaDW2l5zGrAZo6ZQ33QLo6ZJMM_gqRGQL_TMrqWexX07Ia_ynSHPIY2UEqXKsh7bw3Fb_sGawim0WZTdXTCr5XsxFR5n_kLFFrJPuLrGOSvbeuoTHWtPwnNpPTWpfAfwn5MNjiHjPVd25EMPkLpOdJ92y_oscpQ";

const TEST_RSA_EXPONENT: &str = "AQAB";

/// Key ID published in the mocked JWKS.
pub const TEST_KID: &str = "arb-test-rsa-1";

/// Audience the test server is configured with.
pub const TEST_AUDIENCE: &str = "https://api.arbitrages.test";

/// Signs access tokens for one issuer and audience.
#[derive(Clone)]
pub struct TestSigner {
    issuer: String,
    audience: String,
}

impl TestSigner {
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Public key of the fixture, as a JWKS entry.
    pub fn jwk() -> Value {
        json!({
            "kty": "RSA",
            "kid": TEST_KID,
            "use": "sig",
            "alg": "RS256",
            "n": TEST_RSA_MODULUS,
            "e": TEST_RSA_EXPONENT,
        })
    }

    /// Claims of a valid token, valid for one hour.
    pub fn claims(&self) -> Value {
        let now = Utc::now().timestamp();
        json!({
            "iss": self.issuer,
            "sub": "auth0|test-trader",
            "aud": self.audience,
            "iat": now,
            "exp": now + 3600,
            "azp": "arbitrage-dashboard",
            "scope": "read:arbitrages write:arbitrages",
        })
    }

    /// Sign arbitrary claims with the fixture key and a given `kid`.
    pub fn sign_with_kid(&self, kid: &str, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        let key = EncodingKey::from_rsa_pem(TEST_RSA_PRIVATE_KEY.as_bytes())
            .expect("fixture RSA key must parse");
        encode(&header, claims, &key).expect("failed to sign test token")
    }

    pub fn sign(&self, claims: &Value) -> String {
        self.sign_with_kid(TEST_KID, claims)
    }

    pub fn valid_token(&self) -> String {
        self.sign(&self.claims())
    }

    /// Token whose `exp` is one hour in the past.
    pub fn expired_token(&self) -> String {
        let mut claims = self.claims();
        let now = Utc::now().timestamp();
        claims["iat"] = json!(now - 7200);
        claims["exp"] = json!(now - 3600);
        self.sign(&claims)
    }

    pub fn wrong_audience_token(&self) -> String {
        let mut claims = self.claims();
        claims["aud"] = json!("https://some-other-api.test");
        self.sign(&claims)
    }

    pub fn wrong_issuer_token(&self) -> String {
        let mut claims = self.claims();
        claims["iss"] = json!("https://impostor.auth0.com/");
        self.sign(&claims)
    }

    /// Validly signed token whose `kid` is not in the JWKS.
    pub fn unknown_kid_token(&self) -> String {
        self.sign_with_kid("retired-key", &self.claims())
    }
}
