//! SQLite-backed collection store
//!
//! Durable CRUD for named collections using sqlx. `replace_items` follows
//! delete-then-bulk-insert semantics inside one transaction, so a failed
//! save never leaves a collection half-replaced.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::domain::listing::Condition;
use crate::domain::repositories::{Collection, CollectionItem, CollectionStore};

/// Collection store on a SQLite connection pool.
#[derive(Clone)]
pub struct SqliteCollectionStore {
    pool: Arc<SqlitePool>,
}

impl SqliteCollectionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open (creating the database file if necessary) and migrate.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let db_path = database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");

        if !db_path.contains(":memory:") {
            if let Some(parent) = Path::new(db_path).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            if !Path::new(db_path).exists() {
                std::fs::File::create(db_path)
                    .with_context(|| format!("Failed to create database file: {db_path}"))?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to open database: {database_url}"))?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the schema when missing.
    pub async fn migrate(&self) -> Result<()> {
        let create_collections_sql = r#"
            CREATE TABLE IF NOT EXISTS collections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
        "#;

        let create_items_sql = r#"
            CREATE TABLE IF NOT EXISTS collection_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                collection_id INTEGER NOT NULL,
                card_name TEXT NOT NULL,
                card_set TEXT NOT NULL DEFAULT '',
                card_code TEXT NOT NULL,
                card_price TEXT NOT NULL DEFAULT 'N/A',
                card_rarity TEXT NOT NULL DEFAULT 'Unknown',
                card_condition TEXT NOT NULL DEFAULT 'Unknown',
                quantity INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (collection_id) REFERENCES collections (id) ON DELETE CASCADE
            )
        "#;

        let create_indexes_sql = r#"
            CREATE INDEX IF NOT EXISTS idx_collection_items_collection_id
            ON collection_items (collection_id)
        "#;

        sqlx::query(create_collections_sql).execute(&*self.pool).await?;
        sqlx::query(create_items_sql).execute(&*self.pool).await?;
        sqlx::query(create_indexes_sql).execute(&*self.pool).await?;

        Ok(())
    }

    async fn get_items(&self, collection_id: i64) -> Result<Vec<CollectionItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, collection_id, card_name, card_set, card_code,
                   card_price, card_rarity, card_condition, quantity
            FROM collection_items WHERE collection_id = ? ORDER BY id
            "#,
        )
        .bind(collection_id)
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.iter().map(item_from_row).collect())
    }
}

async fn insert_items(
    tx: &mut Transaction<'_, Sqlite>,
    collection_id: i64,
    items: &[CollectionItem],
) -> Result<()> {
    for item in items {
        sqlx::query(
            r#"
            INSERT INTO collection_items
            (collection_id, card_name, card_set, card_code, card_price,
             card_rarity, card_condition, quantity)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(collection_id)
        .bind(&item.name)
        .bind(&item.set)
        .bind(&item.code)
        .bind(&item.price)
        .bind(&item.rarity)
        .bind(item.condition.as_str())
        .bind(item.quantity)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

fn item_from_row(row: &SqliteRow) -> CollectionItem {
    let condition: String = row.get("card_condition");
    CollectionItem {
        id: row.get("id"),
        collection_id: row.get("collection_id"),
        name: row.get("card_name"),
        set: row.get("card_set"),
        code: row.get("card_code"),
        price: row.get("card_price"),
        rarity: row.get("card_rarity"),
        condition: condition.parse().unwrap_or(Condition::Unknown),
        quantity: row.get("quantity"),
    }
}

#[async_trait]
impl CollectionStore for SqliteCollectionStore {
    async fn create_collection(&self, name: &str, items: &[CollectionItem]) -> Result<Collection> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("INSERT INTO collections (name) VALUES (?)")
            .bind(name)
            .execute(&mut *tx)
            .await?;
        let id = result.last_insert_rowid();
        insert_items(&mut tx, id, items).await?;
        tx.commit().await?;

        self.get_collection(id)
            .await?
            .context("Collection missing immediately after create")
    }

    async fn list_collections(&self) -> Result<Vec<Collection>> {
        let rows = sqlx::query("SELECT id, name, created_at FROM collections ORDER BY id")
            .fetch_all(&*self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| Collection {
                id: row.get("id"),
                name: row.get("name"),
                items: Vec::new(),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn get_collection(&self, id: i64) -> Result<Option<Collection>> {
        let row = sqlx::query("SELECT id, name, created_at FROM collections WHERE id = ?")
            .bind(id)
            .fetch_optional(&*self.pool)
            .await?;

        match row {
            Some(row) => {
                let items = self.get_items(id).await?;
                Ok(Some(Collection {
                    id: row.get("id"),
                    name: row.get("name"),
                    items,
                    created_at: row.get("created_at"),
                }))
            }
            None => Ok(None),
        }
    }

    async fn update_collection_name(&self, id: i64, name: &str) -> Result<Collection> {
        let result = sqlx::query("UPDATE collections SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&*self.pool)
            .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("Collection not found: {id}");
        }

        self.get_collection(id)
            .await?
            .with_context(|| format!("Collection missing after rename: {id}"))
    }

    async fn replace_items(&self, collection_id: i64, items: &[CollectionItem]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM collection_items WHERE collection_id = ?")
            .bind(collection_id)
            .execute(&mut *tx)
            .await?;
        insert_items(&mut tx, collection_id, items).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_collection(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM collection_items WHERE collection_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM collections WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
