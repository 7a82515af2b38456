//! SQLite implementation of the KV store ports.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{KeyPattern, KvEntry, KvValue};
use crate::domain::ports::{KvAdmin, KvStore};

#[derive(Clone)]
pub struct SqliteKvStore {
    pool: SqlitePool,
}

impl SqliteKvStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Last write time of a row, for the admin listing.
    pub async fn updated_at(&self, key: &str) -> DomainResult<Option<chrono::DateTime<Utc>>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT updated_at FROM kv_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|(ts,)| super::parse_datetime(&ts)).transpose()
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get_value(&self, key: &str) -> DomainResult<Option<KvValue>> {
        let row: Option<KvRow> = sqlx::query_as("SELECT key, value FROM kv_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| KvEntry::try_from(r).map(|e| e.value)).transpose()
    }

    async fn get_values_by_pattern(&self, pattern: &KeyPattern) -> DomainResult<Vec<KvEntry>> {
        let rows: Vec<KvRow> = sqlx::query_as(
            r"SELECT key, value FROM kv_entries WHERE key LIKE ? ESCAPE '\' ORDER BY key",
        )
        .bind(pattern.to_like())
        .fetch_all(&self.pool)
        .await?;

        // LIKE ignores ASCII case; keys are case-sensitive.
        rows.into_iter()
            .filter(|r| pattern.matches(&r.key))
            .map(KvEntry::try_from)
            .collect()
    }
}

#[async_trait]
impl KvAdmin for SqliteKvStore {
    async fn put(&self, entry: &KvEntry) -> DomainResult<()> {
        let value_json = serde_json::to_string(&entry.value)?;

        sqlx::query(
            r"INSERT INTO kv_entries (key, value, updated_at) VALUES (?, ?, ?)
              ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(&entry.key)
        .bind(&value_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM kv_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, prefix: &str) -> DomainResult<Vec<KvEntry>> {
        self.get_values_by_pattern(&KeyPattern::prefix(prefix)).await
    }
}

#[derive(sqlx::FromRow)]
struct KvRow {
    key: String,
    value: String,
}

impl TryFrom<KvRow> for KvEntry {
    type Error = DomainError;

    fn try_from(row: KvRow) -> Result<Self, Self::Error> {
        let value: serde_json::Value = serde_json::from_str(&row.value).map_err(|e| {
            DomainError::SerializationError(format!("Invalid JSON under key {}: {e}", row.key))
        })?;

        Ok(Self {
            key: row.key,
            value: KvValue::from(value),
        })
    }
}
