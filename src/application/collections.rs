//! Collection persistence use case
//!
//! Converts staged items into persisted rows at an explicit save and loads
//! persisted collections back into a staging session. Persistence failures
//! surface as recoverable errors and leave the staging engine and its undo
//! history completely untouched, so the user can retry the save.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::repositories::{Collection, CollectionItem, CollectionStore};
use crate::domain::staging::StagingEngine;

/// Use cases around durable collections, driven by a staging session handle.
pub struct CollectionService {
    store: Arc<dyn CollectionStore>,
}

impl CollectionService {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { store }
    }

    /// Persist the staged items under `name`.
    ///
    /// The first save creates a collection and binds the session to its id;
    /// later saves replace that collection's rows and rename it when needed.
    /// The engine is only updated after the store calls succeed.
    pub async fn save_staged(
        &self,
        engine: &mut StagingEngine,
        name: &str,
    ) -> Result<Collection> {
        match engine.collection_id() {
            Some(id) => {
                let items = staged_rows(engine, id);
                self.store.replace_items(id, &items).await?;

                let current = self
                    .store
                    .get_collection(id)
                    .await?
                    .with_context(|| format!("Collection missing during save: {id}"))?;
                let saved = if current.name == name {
                    current
                } else {
                    self.store.update_collection_name(id, name).await?
                };

                engine.set_name(name);
                info!("Saved {} staged items to collection {}", saved.items.len(), id);
                Ok(saved)
            }
            None => {
                let items = staged_rows(engine, 0);
                let created = self.store.create_collection(name, &items).await?;

                engine.set_collection_id(Some(created.id));
                engine.set_name(name);
                info!(
                    "Created collection {} with {} staged items",
                    created.id,
                    created.items.len()
                );
                Ok(created)
            }
        }
    }

    /// Load a persisted collection into the staging session, replacing its
    /// content and clearing the undo history. Returns false for an unknown
    /// id, leaving the session as it was.
    pub async fn load_into(&self, engine: &mut StagingEngine, id: i64) -> Result<bool> {
        let Some(collection) = self.store.get_collection(id).await? else {
            return Ok(false);
        };

        engine.replace_all(
            collection
                .items
                .into_iter()
                .map(CollectionItem::into_staging)
                .collect(),
        );
        engine.set_collection_id(Some(collection.id));
        engine.set_name(collection.name);
        Ok(true)
    }

    /// Rename a persisted collection. The working name follows the rename
    /// only when the session tracks that collection. Returns `None` for an
    /// unknown id.
    pub async fn rename(
        &self,
        engine: &mut StagingEngine,
        id: i64,
        name: &str,
    ) -> Result<Option<Collection>> {
        if self.store.get_collection(id).await?.is_none() {
            return Ok(None);
        }

        let updated = self.store.update_collection_name(id, name).await?;
        if engine.collection_id() == Some(id) {
            engine.set_name(name);
        }
        Ok(Some(updated))
    }

    pub async fn list(&self) -> Result<Vec<Collection>> {
        self.store.list_collections().await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.store.delete_collection(id).await
    }
}

fn staged_rows(engine: &StagingEngine, collection_id: i64) -> Vec<CollectionItem> {
    engine
        .items()
        .iter()
        .map(|item| CollectionItem::from_staging(item, collection_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::listing::Condition;
    use crate::domain::staging::{identity_key, StagingItem};
    use crate::infrastructure::collection_store::SqliteCollectionStore;
    use async_trait::async_trait;
    use tempfile::tempdir;

    fn staged(code: &str, condition: Condition, quantity: i64) -> StagingItem {
        StagingItem {
            name: format!("Card {code}"),
            set: "Test Set".to_string(),
            code: code.to_string(),
            quantity,
            price: "$1.00".to_string(),
            rarity: "Common".to_string(),
            condition,
            stock: 2,
        }
    }

    async fn service() -> (tempfile::TempDir, CollectionService) {
        let dir = tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("test.db").display());
        let store = SqliteCollectionStore::connect(&url).await.unwrap();
        (dir, CollectionService::new(Arc::new(store)))
    }

    #[tokio::test]
    async fn first_save_creates_and_binds_the_session() {
        let (_dir, service) = service().await;
        let mut engine = StagingEngine::new();
        engine.add_items(&[staged("A01-EN001", Condition::NearMint, 3)]);

        let saved = service.save_staged(&mut engine, "My deck").await.unwrap();
        assert_eq!(saved.name, "My deck");
        assert_eq!(saved.items.len(), 1);
        assert_eq!(engine.collection_id(), Some(saved.id));
        assert_eq!(engine.name(), "My deck");
    }

    #[tokio::test]
    async fn second_save_replaces_rows_and_renames() {
        let (_dir, service) = service().await;
        let mut engine = StagingEngine::new();
        engine.add_items(&[staged("A01-EN001", Condition::NearMint, 3)]);
        let first = service.save_staged(&mut engine, "Draft").await.unwrap();

        engine.add_items(&[staged("B02-EN002", Condition::Played, 1)]);
        let second = service.save_staged(&mut engine, "Final").await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.name, "Final");
        assert_eq!(second.items.len(), 2);
    }

    #[tokio::test]
    async fn save_then_load_round_trips_staged_items() {
        let (_dir, service) = service().await;
        let mut engine = StagingEngine::new();
        engine.add_items(&[
            staged("A01-EN001", Condition::NearMint, 2),
            staged("B02-EN002", Condition::Played, 1),
        ]);
        let saved = service.save_staged(&mut engine, "Round trip").await.unwrap();

        let mut fresh = StagingEngine::new();
        assert!(service.load_into(&mut fresh, saved.id).await.unwrap());
        assert_eq!(fresh.len(), 2);
        assert_eq!(fresh.name(), "Round trip");
        assert_eq!(fresh.collection_id(), Some(saved.id));

        let key = identity_key("A01-EN001", Condition::NearMint);
        let loaded = fresh.get(&key).unwrap();
        assert_eq!(loaded.quantity, 2);
        // Stock is a live-listing property; loads reset it.
        assert_eq!(loaded.stock, 0);

        // Loading clears the undo history.
        assert!(!fresh.undo());
    }

    #[tokio::test]
    async fn load_of_unknown_id_leaves_the_session_untouched() {
        let (_dir, service) = service().await;
        let mut engine = StagingEngine::new();
        engine.add_items(&[staged("A01-EN001", Condition::NearMint, 1)]);

        assert!(!service.load_into(&mut engine, 999).await.unwrap());
        assert_eq!(engine.len(), 1);
        assert!(engine.collection_id().is_none());
    }

    #[tokio::test]
    async fn rename_updates_working_name_only_for_the_tracked_collection() {
        let (_dir, service) = service().await;
        let mut engine = StagingEngine::new();
        let tracked = service.save_staged(&mut engine, "Tracked").await.unwrap();
        let other = service
            .store
            .create_collection("Other", &[])
            .await
            .unwrap();

        service
            .rename(&mut engine, other.id, "Other renamed")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(engine.name(), "Tracked");

        service
            .rename(&mut engine, tracked.id, "Tracked renamed")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(engine.name(), "Tracked renamed");

        assert!(service
            .rename(&mut engine, 999, "ghost")
            .await
            .unwrap()
            .is_none());
    }

    struct FailingStore;

    #[async_trait]
    impl CollectionStore for FailingStore {
        async fn create_collection(
            &self,
            _name: &str,
            _items: &[CollectionItem],
        ) -> Result<Collection> {
            anyhow::bail!("disk full")
        }
        async fn list_collections(&self) -> Result<Vec<Collection>> {
            anyhow::bail!("disk full")
        }
        async fn get_collection(&self, _id: i64) -> Result<Option<Collection>> {
            anyhow::bail!("disk full")
        }
        async fn update_collection_name(&self, _id: i64, _name: &str) -> Result<Collection> {
            anyhow::bail!("disk full")
        }
        async fn replace_items(&self, _id: i64, _items: &[CollectionItem]) -> Result<()> {
            anyhow::bail!("disk full")
        }
        async fn delete_collection(&self, _id: i64) -> Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[tokio::test]
    async fn failed_save_leaves_staging_and_undo_history_untouched() {
        let service = CollectionService::new(Arc::new(FailingStore));
        let mut engine = StagingEngine::new();
        engine.add_items(&[staged("A01-EN001", Condition::NearMint, 2)]);
        engine.add_items(&[staged("A01-EN001", Condition::NearMint, 3)]);

        let result = service.save_staged(&mut engine, "Doomed").await;
        assert!(result.is_err());

        let key = identity_key("A01-EN001", Condition::NearMint);
        assert_eq!(engine.get(&key).map(|i| i.quantity), Some(5));
        assert!(engine.collection_id().is_none());
        assert_eq!(engine.name(), crate::domain::staging::DEFAULT_WORKING_NAME);

        // Undo history survived the failed save; the user can still retry
        // or keep editing.
        assert!(engine.undo());
        assert_eq!(engine.get(&key).map(|i| i.quantity), Some(2));
    }
}
