//! Utilities shared across the Arbitrage API crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT utilities (size limits, key lookup, issuer discovery)
pub mod jwt;
