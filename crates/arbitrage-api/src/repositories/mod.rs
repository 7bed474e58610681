//! Repository layer for the Arbitrage API.
//!
//! The `ArbitrageStore` trait is the seam between the gateway and the
//! document store. Handlers never talk to a store directly:
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/arbitrages.rs -> repositories/*.rs
//! ```
//!
//! # Implementations
//!
//! - `mongo` - MongoDB collection adapter used in production
//! - `memory` - In-process list with the same semantics, used by tests

pub mod memory;
pub mod mongo;

pub use memory::InMemoryArbitrageStore;
pub use mongo::MongoArbitrageStore;

use crate::models::{ArbitrageRecord, ArbitrageUpdate, ExtraFields, NewArbitrage, Roi, Stake};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a document store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("document store error: {0}")]
    Backend(String),

    #[error("document serialization error: {0}")]
    Serialization(String),

    #[error("stored document has no identifier")]
    MissingId,
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// An arbitrage record as persisted in the collection.
///
/// Fields default when absent so that documents written by other tools
/// still load. `time` and any unknown keys are kept opaque; a BSON date or
/// epoch number in `time` loads the same way a string does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub sport: String,
    #[serde(default)]
    pub home_team: String,
    #[serde(default)]
    pub away_team: String,
    #[serde(default)]
    pub home_stake: Stake,
    #[serde(default)]
    pub away_stake: Stake,
    #[serde(default)]
    pub time: serde_json::Value,
    #[serde(default)]
    pub roi: Option<Roi>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ArbitrageDocument {
    /// Convert into the client-facing record with a stringified identifier.
    pub fn into_record(self) -> Result<ArbitrageRecord, StoreError> {
        let id = self.id.ok_or(StoreError::MissingId)?;
        Ok(ArbitrageRecord {
            id: id.to_hex(),
            sport: self.sport,
            home_team: self.home_team,
            away_team: self.away_team,
            home_stake: self.home_stake,
            away_stake: self.away_stake,
            time: self.time,
            roi: self.roi,
            extra: self.extra,
        })
    }

    /// Apply the supplied fields of an update in place.
    pub fn apply(&mut self, changes: &ArbitrageUpdate) {
        if let Some(away_team) = &changes.away_team {
            self.away_team = away_team.clone();
        }
        if let Some(away_stake) = &changes.away_stake {
            self.away_stake = away_stake.clone();
        }
        if let Some(home_team) = &changes.home_team {
            self.home_team = home_team.clone();
        }
        if let Some(home_stake) = &changes.home_stake {
            self.home_stake = home_stake.clone();
        }
        if let Some(roi) = &changes.roi {
            self.roi = Some(roi.clone());
        }
    }
}

impl From<NewArbitrage> for ArbitrageDocument {
    fn from(new: NewArbitrage) -> Self {
        Self {
            id: None,
            sport: new.sport,
            home_team: new.home_team,
            away_team: new.away_team,
            home_stake: new.home_stake,
            away_stake: new.away_stake,
            time: new.time,
            roi: Some(new.roi),
            extra: new.extra,
        }
    }
}

/// Primitive operations over the arbitrage collection.
///
/// Implementations perform exactly one store round-trip per call and do not
/// enforce any business rule; uniqueness and merge rules live in the gateway.
#[async_trait]
pub trait ArbitrageStore: Send + Sync {
    /// Every document in the collection, in store order.
    async fn find_all(&self) -> Result<Vec<ArbitrageDocument>, StoreError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<ArbitrageDocument>, StoreError>;

    async fn find_by_sport(&self, sport: &str) -> Result<Vec<ArbitrageDocument>, StoreError>;

    /// First document matching the `(home_team, away_team, time)` key.
    async fn find_by_teams_and_time(
        &self,
        home_team: &str,
        away_team: &str,
        time: &serde_json::Value,
    ) -> Result<Option<ArbitrageDocument>, StoreError>;

    /// Insert a document and return its generated identifier.
    async fn insert(&self, document: ArbitrageDocument) -> Result<ObjectId, StoreError>;

    /// Set the supplied fields on one document. Returns false when no
    /// document has that identifier.
    async fn update_fields(
        &self,
        id: ObjectId,
        changes: &ArbitrageUpdate,
    ) -> Result<bool, StoreError>;

    /// Remove a document. Removing a missing identifier is not an error.
    async fn delete(&self, id: ObjectId) -> Result<(), StoreError>;

    /// Round-trip to the store for readiness checks.
    async fn ping(&self) -> Result<(), StoreError>;
}
