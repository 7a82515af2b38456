//! KV store ports.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{KeyPattern, KvEntry, KvValue};

/// Read-only access to the persisted key-value table.
///
/// Every call is a fresh read: no caching, no transactions. Connectivity
/// failures surface as `DomainError::DatabaseError` and are not retried here.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Exact-match lookup.
    async fn get_value(&self, key: &str) -> DomainResult<Option<KvValue>>;

    /// The `text` field of the value under `key`, if both exist.
    async fn get_text(&self, key: &str) -> DomainResult<Option<String>> {
        Ok(self
            .get_value(key)
            .await?
            .and_then(|value| value.as_text().map(str::to_owned)))
    }

    /// All rows whose key matches `pattern`, ordered by key.
    async fn get_values_by_pattern(&self, pattern: &KeyPattern) -> DomainResult<Vec<KvEntry>>;
}

/// Write side of the table, used by the admin CLI and test seeding only.
#[async_trait]
pub trait KvAdmin: Send + Sync {
    /// Insert or replace the row under `entry.key`.
    async fn put(&self, entry: &KvEntry) -> DomainResult<()>;

    /// Delete a row. Returns whether it existed.
    async fn delete(&self, key: &str) -> DomainResult<bool>;

    /// All rows whose key starts with `prefix`, ordered by key.
    async fn list(&self, prefix: &str) -> DomainResult<Vec<KvEntry>>;
}
