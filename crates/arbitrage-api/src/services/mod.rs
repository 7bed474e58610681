//! Service layer for the Arbitrage API.
//!
//! # Components
//!
//! - `arbitrages` - Record Store Gateway over the `ArbitrageStore` seam

pub mod arbitrages;

pub use arbitrages::{parse_object_id, ArbitrageGateway, CreateOutcome};
