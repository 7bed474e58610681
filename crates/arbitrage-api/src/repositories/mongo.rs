//! MongoDB implementation of `ArbitrageStore`.
//!
//! Uses a typed collection of `ArbitrageDocument`. The driver owns connection
//! pooling; one `MongoArbitrageStore` is shared by all requests.

use super::{ArbitrageDocument, ArbitrageStore, StoreError};
use crate::config::Config;
use crate::models::ArbitrageUpdate;
use async_trait::async_trait;
use common::secret::ExposeSecret;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use std::time::Duration;
use tracing::instrument;

/// Application name reported to the server in the handshake.
const APP_NAME: &str = "arbitrage-api";

/// How long the driver waits for a usable server before failing an operation.
const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Arbitrage collection backed by MongoDB.
#[derive(Clone)]
pub struct MongoArbitrageStore {
    database: Database,
    collection: Collection<ArbitrageDocument>,
}

impl MongoArbitrageStore {
    /// Build a client from the configured URI and bind the configured collection.
    ///
    /// The driver connects lazily; an unreachable server surfaces on the
    /// first operation, not here.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(config.mongo_uri.expose_secret()).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);
        options.connect_timeout = Some(CONNECT_TIMEOUT);

        let client = Client::with_options(options)?;
        let database = client.database(&config.database_name);
        let collection = database.collection::<ArbitrageDocument>(&config.collection_name);

        tracing::debug!(
            target: "arb.store.mongo",
            database = %config.database_name,
            collection = %config.collection_name,
            "MongoDB client created"
        );

        Ok(Self {
            database,
            collection,
        })
    }
}

/// `$set` document for the supplied fields of an update.
fn set_document(changes: &ArbitrageUpdate) -> Result<Document, StoreError> {
    let mut set = Document::new();
    if let Some(away_team) = &changes.away_team {
        set.insert("away_team", away_team.as_str());
    }
    if let Some(away_stake) = &changes.away_stake {
        set.insert("away_stake", mongodb::bson::to_bson(away_stake)?);
    }
    if let Some(home_team) = &changes.home_team {
        set.insert("home_team", home_team.as_str());
    }
    if let Some(home_stake) = &changes.home_stake {
        set.insert("home_stake", mongodb::bson::to_bson(home_stake)?);
    }
    if let Some(roi) = &changes.roi {
        set.insert("roi", mongodb::bson::to_bson(roi)?);
    }
    Ok(set)
}

#[async_trait]
impl ArbitrageStore for MongoArbitrageStore {
    #[instrument(skip_all)]
    async fn find_all(&self) -> Result<Vec<ArbitrageDocument>, StoreError> {
        let cursor = self.collection.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip_all, fields(id = %id))]
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<ArbitrageDocument>, StoreError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    #[instrument(skip_all, fields(sport = %sport))]
    async fn find_by_sport(&self, sport: &str) -> Result<Vec<ArbitrageDocument>, StoreError> {
        let cursor = self.collection.find(doc! { "sport": sport }).await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip_all)]
    async fn find_by_teams_and_time(
        &self,
        home_team: &str,
        away_team: &str,
        time: &serde_json::Value,
    ) -> Result<Option<ArbitrageDocument>, StoreError> {
        let filter = doc! {
            "home_team": home_team,
            "away_team": away_team,
            "time": mongodb::bson::to_bson(time)?,
        };
        Ok(self.collection.find_one(filter).await?)
    }

    #[instrument(skip_all)]
    async fn insert(&self, document: ArbitrageDocument) -> Result<ObjectId, StoreError> {
        let result = self.collection.insert_one(document).await?;
        result.inserted_id.as_object_id().ok_or(StoreError::MissingId)
    }

    #[instrument(skip_all, fields(id = %id))]
    async fn update_fields(
        &self,
        id: ObjectId,
        changes: &ArbitrageUpdate,
    ) -> Result<bool, StoreError> {
        let set = set_document(changes)?;
        if set.is_empty() {
            // $set with no fields is rejected by the server
            return Ok(self.find_by_id(id).await?.is_some());
        }

        let result = self
            .collection
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;
        Ok(result.matched_count > 0)
    }

    #[instrument(skip_all, fields(id = %id))]
    async fn delete(&self, id: ObjectId) -> Result<(), StoreError> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        tracing::debug!(
            target: "arb.store.mongo",
            deleted = result.deleted_count,
            "Delete completed"
        );
        Ok(())
    }

    #[instrument(skip_all)]
    async fn ping(&self) -> Result<(), StoreError> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
