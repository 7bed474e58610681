//! Record Store Gateway.
//!
//! Translates the six logical arbitrage operations into `ArbitrageStore`
//! calls. Owns the business rules the store does not: identifier parsing,
//! the `(home_team, away_team, time)` uniqueness pre-check, and dropping
//! empty values from updates.

use crate::models::{ArbitrageRecord, ArbitrageUpdate, NewArbitrage};
use crate::observability::metrics::record_store_operation;
use crate::repositories::{ArbitrageDocument, ArbitrageStore, StoreError};
use mongodb::bson::oid::ObjectId;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Result of a create request.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(ArbitrageRecord),

    /// A record with the same teams and time already exists; nothing written.
    Duplicate,
}

/// Parse a client-supplied identifier. Anything other than 24 hex digits is `None`.
pub fn parse_object_id(raw: &str) -> Option<ObjectId> {
    ObjectId::parse_str(raw).ok()
}

/// Gateway between HTTP handlers and the document store.
#[derive(Clone)]
pub struct ArbitrageGateway {
    store: Arc<dyn ArbitrageStore>,
}

impl ArbitrageGateway {
    pub fn new(store: Arc<dyn ArbitrageStore>) -> Self {
        Self { store }
    }

    /// All records. No pagination or ordering guarantee.
    #[instrument(skip_all)]
    pub async fn list_all(&self) -> Result<Vec<ArbitrageRecord>, StoreError> {
        let documents = timed("find_all", self.store.find_all()).await?;
        into_records(documents)
    }

    /// One record by identifier. An unparseable identifier is "not found".
    #[instrument(skip_all, fields(id = %id))]
    pub async fn get_by_id(&self, id: &str) -> Result<Option<ArbitrageRecord>, StoreError> {
        let Some(object_id) = parse_object_id(id) else {
            tracing::debug!(target: "arb.services.arbitrages", "Identifier is not an ObjectId");
            return Ok(None);
        };

        timed("find_by_id", self.store.find_by_id(object_id))
            .await?
            .map(ArbitrageDocument::into_record)
            .transpose()
    }

    /// Records for one sport. An empty list is a valid result.
    #[instrument(skip_all, fields(sport = %sport))]
    pub async fn get_by_sport(&self, sport: &str) -> Result<Vec<ArbitrageRecord>, StoreError> {
        let documents = timed("find_by_sport", self.store.find_by_sport(sport)).await?;
        into_records(documents)
    }

    /// Insert a record unless one with the same teams and time exists.
    ///
    /// The check and the insert are two separate store calls; concurrent
    /// creates with the same key can both succeed.
    #[instrument(skip_all)]
    pub async fn create(&self, new: NewArbitrage) -> Result<CreateOutcome, StoreError> {
        let existing = timed(
            "find_by_teams_and_time",
            self.store
                .find_by_teams_and_time(&new.home_team, &new.away_team, &new.time),
        )
        .await?;

        if existing.is_some() {
            tracing::debug!(
                target: "arb.services.arbitrages",
                sport = %new.sport,
                "Duplicate arbitrage rejected"
            );
            return Ok(CreateOutcome::Duplicate);
        }

        let mut document = ArbitrageDocument::from(new);
        let id = timed("insert", self.store.insert(document.clone())).await?;
        document.id = Some(id);

        tracing::info!(
            target: "arb.services.arbitrages",
            id = %id,
            sport = %document.sport,
            "Arbitrage created"
        );

        Ok(CreateOutcome::Created(document.into_record()?))
    }

    /// Merge the non-empty supplied fields into a record.
    ///
    /// Returns `None` when the identifier does not resolve. An update whose
    /// values are all empty leaves the record untouched and returns it.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn update(
        &self,
        id: &str,
        changes: ArbitrageUpdate,
    ) -> Result<Option<ArbitrageRecord>, StoreError> {
        let Some(object_id) = parse_object_id(id) else {
            return Ok(None);
        };

        let changes = changes.retain_non_empty();
        let matched = timed(
            "update_fields",
            self.store.update_fields(object_id, &changes),
        )
        .await?;
        if !matched {
            return Ok(None);
        }

        timed("find_by_id", self.store.find_by_id(object_id))
            .await?
            .map(ArbitrageDocument::into_record)
            .transpose()
    }

    /// Remove a record. Unknown or malformed identifiers are a no-op.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let Some(object_id) = parse_object_id(id) else {
            return Ok(());
        };
        timed("delete", self.store.delete(object_id)).await
    }

    /// Round-trip to the store for readiness.
    pub async fn ping(&self) -> Result<(), StoreError> {
        timed("ping", self.store.ping()).await
    }
}

fn into_records(documents: Vec<ArbitrageDocument>) -> Result<Vec<ArbitrageRecord>, StoreError> {
    documents
        .into_iter()
        .map(ArbitrageDocument::into_record)
        .collect()
}

/// Run one store call and record its latency and outcome.
async fn timed<T, F>(operation: &'static str, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    let start = Instant::now();
    let result = call.await;
    let status = if result.is_ok() { "success" } else { "error" };
    record_store_operation(operation, status, start.elapsed());

    if let Err(e) = &result {
        tracing::warn!(target: "arb.services.arbitrages", operation, error = %e, "Store operation failed");
    }
    result
}
