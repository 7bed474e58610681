//! Token Validator.
//!
//! - `jwks` - fetch-once cache of the identity provider's signing keys
//! - `jwt` - bearer token verification against those keys
//! - `claims` - validated claims attached to authenticated requests

pub mod claims;
pub mod jwks;
pub mod jwt;

pub use claims::Claims;
pub use jwks::{Jwk, JwksClient};
pub use jwt::JwtValidator;
