//! Collection store contract
//!
//! Trait definition for durable collection storage. The staging engine never
//! talks to the store directly; the collections use case converts staged
//! items to persisted rows at an explicit save.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::listing::Condition;
use super::staging::StagingItem;

/// One persisted row of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionItem {
    pub id: Option<i64>,
    pub collection_id: i64,
    pub name: String,
    pub set: String,
    pub code: String,
    pub price: String,
    pub rarity: String,
    pub condition: Condition,
    pub quantity: i64,
}

impl CollectionItem {
    /// Convert a staged item into a row for the given collection.
    pub fn from_staging(item: &StagingItem, collection_id: i64) -> Self {
        Self {
            id: None,
            collection_id,
            name: item.name.clone(),
            set: item.set.clone(),
            code: item.code.clone(),
            price: item.price.clone(),
            rarity: item.rarity.clone(),
            condition: item.condition,
            quantity: item.quantity,
        }
    }

    /// Convert a persisted row back into a staged item. Stock is a property
    /// of live listings, not of stored rows, so it resets to zero.
    pub fn into_staging(self) -> StagingItem {
        StagingItem {
            name: self.name,
            set: self.set,
            code: self.code,
            quantity: self.quantity,
            price: self.price,
            rarity: self.rarity,
            condition: self.condition,
            stock: 0,
        }
    }
}

/// A named, durable collection of card rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: i64,
    pub name: String,
    pub items: Vec<CollectionItem>,
    pub created_at: DateTime<Utc>,
}

/// Durable collection CRUD.
///
/// Implementations own their durability mechanism; callers treat every error
/// as a recoverable persistence failure and must leave their own in-memory
/// state untouched when one surfaces.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Create a collection with the given rows and return it with ids filled in.
    async fn create_collection(&self, name: &str, items: &[CollectionItem]) -> Result<Collection>;

    /// All collections, without their items.
    async fn list_collections(&self) -> Result<Vec<Collection>>;

    /// One collection with its items, or `None` for an unknown id.
    async fn get_collection(&self, id: i64) -> Result<Option<Collection>>;

    /// Rename a collection and return the updated record.
    async fn update_collection_name(&self, id: i64, name: &str) -> Result<Collection>;

    /// Replace all rows of a collection: delete existing rows, then bulk
    /// insert the new ones.
    async fn replace_items(&self, collection_id: i64, items: &[CollectionItem]) -> Result<()>;

    /// Delete a collection and its rows.
    async fn delete_collection(&self, id: i64) -> Result<()>;
}
