//! In-memory implementation of `ArbitrageStore`.
//!
//! Keeps documents in insertion order behind an async lock. Used by the test
//! harness in place of MongoDB; `failing()` builds a store whose every
//! operation errors, for exercising 500 paths.

use super::{ArbitrageDocument, ArbitrageStore, StoreError};
use crate::models::ArbitrageUpdate;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

/// Arbitrage collection held in process memory.
#[derive(Default)]
pub struct InMemoryArbitrageStore {
    documents: RwLock<Vec<ArbitrageDocument>>,
    unavailable: bool,
}

impl InMemoryArbitrageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that fails every operation with a backend error.
    pub fn failing() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            unavailable: true,
        }
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Backend(
                "in-memory store configured as unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ArbitrageStore for InMemoryArbitrageStore {
    async fn find_all(&self) -> Result<Vec<ArbitrageDocument>, StoreError> {
        self.check_available()?;
        Ok(self.documents.read().await.clone())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<ArbitrageDocument>, StoreError> {
        self.check_available()?;
        let documents = self.documents.read().await;
        Ok(documents.iter().find(|doc| doc.id == Some(id)).cloned())
    }

    async fn find_by_sport(&self, sport: &str) -> Result<Vec<ArbitrageDocument>, StoreError> {
        self.check_available()?;
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|doc| doc.sport == sport)
            .cloned()
            .collect())
    }

    async fn find_by_teams_and_time(
        &self,
        home_team: &str,
        away_team: &str,
        time: &serde_json::Value,
    ) -> Result<Option<ArbitrageDocument>, StoreError> {
        self.check_available()?;
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .find(|doc| {
                doc.home_team == home_team && doc.away_team == away_team && doc.time == *time
            })
            .cloned())
    }

    async fn insert(&self, mut document: ArbitrageDocument) -> Result<ObjectId, StoreError> {
        self.check_available()?;
        let id = document.id.unwrap_or_else(ObjectId::new);
        document.id = Some(id);
        self.documents.write().await.push(document);
        Ok(id)
    }

    async fn update_fields(
        &self,
        id: ObjectId,
        changes: &ArbitrageUpdate,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut documents = self.documents.write().await;
        match documents.iter_mut().find(|doc| doc.id == Some(id)) {
            Some(doc) => {
                doc.apply(changes);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: ObjectId) -> Result<(), StoreError> {
        self.check_available()?;
        self.documents
            .write()
            .await
            .retain(|doc| doc.id != Some(id));
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{ExtraFields, Roi, Stake};
    use serde_json::json;

    fn document(home: &str, away: &str, sport: &str) -> ArbitrageDocument {
        ArbitrageDocument {
            id: None,
            sport: sport.to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_stake: Stake::new(),
            away_stake: Stake::new(),
            time: json!("2024-05-01T19:00:00Z"),
            roi: Some(Roi::Number(1.1)),
            extra: ExtraFields::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_identifier() {
        let store = InMemoryArbitrageStore::new();

        let id = store
            .insert(document("Bayern", "Dortmund", "soccer_germany_bundesliga"))
            .await
            .unwrap();

        let found = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.id, Some(id));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_find_by_sport_filters() {
        let store = InMemoryArbitrageStore::new();
        store.insert(document("A", "B", "tennis")).await.unwrap();
        store.insert(document("C", "D", "golf")).await.unwrap();
        store.insert(document("E", "F", "tennis")).await.unwrap();

        assert_eq!(store.find_by_sport("tennis").await.unwrap().len(), 2);
        assert!(store.find_by_sport("cricket").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_teams_and_time_matches_full_key() {
        let store = InMemoryArbitrageStore::new();
        store.insert(document("A", "B", "tennis")).await.unwrap();

        assert!(store
            .find_by_teams_and_time("A", "B", &json!("2024-05-01T19:00:00Z"))
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_by_teams_and_time("B", "A", &json!("2024-05-01T19:00:00Z"))
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_by_teams_and_time("A", "B", &json!("2024-05-02T19:00:00Z"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_fields_reports_missing_document() {
        let store = InMemoryArbitrageStore::new();
        let changes = ArbitrageUpdate {
            roi: Some(Roi::Number(9.0)),
            ..ArbitrageUpdate::default()
        };

        assert!(!store.update_fields(ObjectId::new(), &changes).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let store = InMemoryArbitrageStore::new();
        store.insert(document("A", "B", "tennis")).await.unwrap();

        store.delete(ObjectId::new()).await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_failing_store_errors_everywhere() {
        let store = InMemoryArbitrageStore::failing();

        assert!(matches!(
            store.find_all().await,
            Err(StoreError::Backend(_))
        ));
        assert!(store.ping().await.is_err());
        assert!(store
            .insert(document("A", "B", "tennis"))
            .await
            .is_err());
        assert!(store.is_empty().await);
    }
}
