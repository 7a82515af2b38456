//! In-memory KV store, for tests and for embedders seeding from YAML.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{KeyPattern, KvEntry, KvValue};
use crate::domain::ports::{KvAdmin, KvStore};

#[derive(Debug, Default)]
pub struct InMemoryKvStore {
    entries: RwLock<BTreeMap<String, KvValue>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = KvEntry>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().map(|e| (e.key, e.value)).collect()),
        }
    }

    /// Build a store from a seed document (see [`parse_seed_yaml`]).
    pub fn from_yaml(yaml: &str) -> DomainResult<Self> {
        Ok(Self::from_entries(parse_seed_yaml(yaml)?))
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> DomainResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::ValidationFailed(format!("Failed to read seed file {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Parse a seed document: a YAML mapping of key to value.
///
/// A plain string value is shorthand for `{text: <string>}`; mappings and
/// sequences are stored as their JSON equivalent.
///
/// ```yaml
/// versions.fo-08.system.default: "You are a warm coach."
/// versions.fo-08._model_name.default: { text: gpt-4o-mini, note: cheap }
/// ```
pub fn parse_seed_yaml(yaml: &str) -> DomainResult<Vec<KvEntry>> {
    let doc: BTreeMap<String, serde_json::Value> = serde_yaml::from_str(yaml)
        .map_err(|e| DomainError::SerializationError(format!("Invalid seed YAML: {e}")))?;

    Ok(doc
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(text) => KvValue::text(text),
                other => KvValue::from(other),
            };
            KvEntry::new(key, value)
        })
        .collect())
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn get_value(&self, key: &str) -> DomainResult<Option<KvValue>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn get_values_by_pattern(&self, pattern: &KeyPattern) -> DomainResult<Vec<KvEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .range(pattern.prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&pattern.prefix))
            .filter(|(key, _)| pattern.matches(key))
            .map(|(key, value)| KvEntry::new(key.clone(), value.clone()))
            .collect())
    }
}

#[async_trait]
impl KvAdmin for InMemoryKvStore {
    async fn put(&self, entry: &KvEntry) -> DomainResult<()> {
        self.entries
            .write()
            .await
            .insert(entry.key.clone(), entry.value.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> DomainResult<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn list(&self, prefix: &str) -> DomainResult<Vec<KvEntry>> {
        self.get_values_by_pattern(&KeyPattern::prefix(prefix)).await
    }
}
