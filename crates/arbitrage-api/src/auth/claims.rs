//! JWT claims structure.
//!
//! Contains the claims extracted from validated access tokens. The `sub`
//! field is redacted in Debug output to prevent exposure in logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Claims of a validated access token.
///
/// `aud` is checked during validation and not kept here; Auth0 may send it as
/// a string or an array.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id or `client-id@clients`) - redacted in Debug output.
    pub sub: String,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Issuer URL.
    pub iss: String,

    /// Space-separated scopes granted to this token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Authorized party (the client application that requested the token).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("iss", &self.iss)
            .field("scope", &self.scope)
            .field("azp", &self.azp)
            .finish()
    }
}
