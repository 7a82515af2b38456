//! Common test utilities for integration tests
//!
//! Provides a migrated in-memory SQLite store and seeding helpers shared by
//! the integration test files.

#![allow(dead_code)]

use promptvault::adapters::sqlite::{create_migrated_test_pool, SqliteKvStore};
use promptvault::domain::models::{KvEntry, KvValue};
use promptvault::KvAdmin;
use serde_json::{Map, Value};
use std::sync::Arc;
use tempfile::TempDir;

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Empty store backed by a migrated in-memory database.
pub async fn test_store() -> Arc<SqliteKvStore> {
    let pool = create_migrated_test_pool()
        .await
        .expect("Failed to create migrated test pool");
    Arc::new(SqliteKvStore::new(pool))
}

/// Store seeded with `{"text": ...}` rows.
pub async fn seeded_store(rows: &[(&str, &str)]) -> Arc<SqliteKvStore> {
    let store = test_store().await;
    for (key, text) in rows {
        store
            .put(&KvEntry::text(*key, *text))
            .await
            .expect("Failed to seed row");
    }
    store
}

/// Seed one non-text JSON value.
pub async fn put_raw(store: &SqliteKvStore, key: &str, value: Value) {
    store
        .put(&KvEntry::new(key, KvValue::from(value)))
        .await
        .expect("Failed to seed raw row");
}

/// Variables map from a JSON object literal.
pub fn vars(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Initializes tracing output for tests that want to see engine logs.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
