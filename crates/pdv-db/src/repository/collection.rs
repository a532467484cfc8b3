//! # Collection Repository
//!
//! Stores each [`Collection`] as one row whose payload is the JSON array of
//! its records.

use chrono::Utc;
use pdv_core::{Collection, CollectionStore, StoreResult};
use serde_json::Value;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};

const UPSERT_SQL: &str = r#"
    INSERT INTO collections (name, payload, updated_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(name) DO UPDATE SET
        payload = excluded.payload,
        updated_at = excluded.updated_at
"#;

/// SQLite-backed [`CollectionStore`].
#[derive(Debug, Clone)]
pub struct SqliteCollectionStore {
    pool: SqlitePool,
}

impl SqliteCollectionStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteCollectionStore { pool }
    }

    /// Loads the raw records of `collection`; a missing row is empty.
    pub async fn load(&self, collection: Collection) -> DbResult<Vec<Value>> {
        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM collections WHERE name = ?1")
                .bind(collection.as_str())
                .fetch_optional(&self.pool)
                .await?;

        let records = match payload {
            Some(payload) => decode_payload(collection, &payload)?,
            None => Vec::new(),
        };
        debug!(collection = %collection, count = records.len(), "Collection loaded");
        Ok(records)
    }

    /// Replaces `collection` with `records`.
    pub async fn save(&self, collection: Collection, records: &[Value]) -> DbResult<()> {
        let payload = encode_payload(collection, records)?;
        sqlx::query(UPSERT_SQL)
            .bind(collection.as_str())
            .bind(payload)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        debug!(collection = %collection, count = records.len(), "Collection saved");
        Ok(())
    }

    /// Replaces every collection in `batch` inside one transaction.
    pub async fn save_batch(&self, batch: &[(Collection, Vec<Value>)]) -> DbResult<()> {
        let mut tx: Transaction<'_, Sqlite> = self.pool.begin().await?;
        let now = Utc::now().to_rfc3339();

        for (collection, records) in batch {
            let payload = encode_payload(*collection, records)?;
            sqlx::query(UPSERT_SQL)
                .bind(collection.as_str())
                .bind(payload)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!(collections = batch.len(), "Batch committed");
        Ok(())
    }

    /// Names of collections that have been written at least once.
    pub async fn names(&self) -> DbResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM collections ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }
}

impl CollectionStore for SqliteCollectionStore {
    async fn load_collection(&self, collection: Collection) -> StoreResult<Vec<Value>> {
        Ok(self.load(collection).await?)
    }

    async fn save_collection(&self, collection: Collection, records: Vec<Value>) -> StoreResult<()> {
        Ok(self.save(collection, &records).await?)
    }

    async fn save_collections(&self, batch: Vec<(Collection, Vec<Value>)>) -> StoreResult<()> {
        Ok(self.save_batch(&batch).await?)
    }
}

fn decode_payload(collection: Collection, payload: &str) -> DbResult<Vec<Value>> {
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Array(records)) => Ok(records),
        Ok(other) => Err(DbError::bad_payload(
            collection.as_str(),
            format!("expected a JSON array, found {}", json_kind(&other)),
        )),
        Err(e) => Err(DbError::bad_payload(collection.as_str(), e)),
    }
}

fn encode_payload(collection: Collection, records: &[Value]) -> DbResult<String> {
    serde_json::to_string(records).map_err(|e| DbError::bad_payload(collection.as_str(), e))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
