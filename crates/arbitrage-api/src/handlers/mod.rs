//! HTTP request handlers for the Arbitrage API.

pub mod arbitrages;
pub mod health;
pub mod home;
pub mod metrics;

pub use arbitrages::{
    create_arbitrage, delete_arbitrage, get_arbitrage, get_arbitrages_by_sport, list_arbitrages,
    update_arbitrage,
};
pub use health::{health_check, readiness_check};
pub use home::home;
pub use metrics::metrics_handler;
