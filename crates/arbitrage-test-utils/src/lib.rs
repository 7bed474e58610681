//! # Arbitrage API Test Utilities
//!
//! This crate provides:
//! - Server test harness (`TestApiServer`) backed by the in-memory store and
//!   a mocked identity provider
//! - RS256 token signing (`TestSigner`) matching the mocked JWKS
//!
//! ## Usage
//!
//! ```rust,ignore
//! use arbitrage_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<()> {
//!     let server = TestApiServer::spawn().await?;
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/api/arbitrages", server.url()))
//!         .bearer_auth(server.token())
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod server_harness;
pub mod token_builder;

pub use server_harness::*;
pub use token_builder::*;
