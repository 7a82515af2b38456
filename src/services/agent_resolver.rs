//! Agent and model resolution through the KV store.
//!
//! A missing row is a normal outcome here, never an error: every call site
//! is expected to carry its own in-code default.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    KeyPattern, Slot, TemplateKey, ValueSource, DEFAULT_IMPLEMENTATION, KEY_NAMESPACE,
};
use crate::domain::ports::KvStore;

pub struct AgentResolver<S: KvStore> {
    store: Arc<S>,
}

impl<S: KvStore> Clone for AgentResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KvStore> AgentResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// `versions.<agent>.system.<implementation>`, with no fallback to `default`.
    #[instrument(skip(self))]
    pub async fn get_agent_system_prompt(
        &self,
        agent_id: &str,
        implementation: &str,
    ) -> DomainResult<Option<String>> {
        let key = TemplateKey::system(agent_id, implementation);
        self.store.get_text(&key.to_string()).await
    }

    /// `versions.<agent>.prompt.<implementation>`, falling back to the `default` implementation.
    #[instrument(skip(self))]
    pub async fn get_agent_prompt_template(
        &self,
        agent_id: &str,
        implementation: &str,
    ) -> DomainResult<Option<String>> {
        Ok(self
            .lookup_with_default(TemplateKey::prompt(agent_id, implementation))
            .await?
            .map(|(text, _)| text))
    }

    /// `versions.<agent>._model_name.<implementation>`, falling back to the `default` implementation.
    #[instrument(skip(self))]
    pub async fn get_agent_model_name(
        &self,
        agent_id: &str,
        implementation: &str,
    ) -> DomainResult<Option<String>> {
        Ok(self
            .resolve_model_name(agent_id, implementation)
            .await?
            .map(|(model, _)| model))
    }

    /// Model name plus whether it came from the implementation's own row or from `default`.
    pub async fn resolve_model_name(
        &self,
        agent_id: &str,
        implementation: &str,
    ) -> DomainResult<Option<(String, ValueSource)>> {
        self.lookup_with_default(TemplateKey::model_name(agent_id, implementation))
            .await
    }

    /// Implementation names that have a system prompt for `agent_id`:
    /// `default` first when present, the rest in ascending order.
    #[instrument(skip(self))]
    pub async fn get_agent_implementations(&self, agent_id: &str) -> DomainResult<Vec<String>> {
        let prefix = format!("{KEY_NAMESPACE}.{agent_id}.{}.", Slot::System);
        let entries = self
            .store
            .get_values_by_pattern(&KeyPattern::prefix(prefix.clone()))
            .await?;

        let mut implementations: Vec<String> = entries
            .iter()
            .filter_map(|entry| entry.key.strip_prefix(&prefix))
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();

        sort_implementations(&mut implementations);
        Ok(implementations)
    }

    async fn lookup_with_default(
        &self,
        key: TemplateKey,
    ) -> DomainResult<Option<(String, ValueSource)>> {
        if let Some(text) = self.store.get_text(&key.to_string()).await? {
            return Ok(Some((text, ValueSource::Stored)));
        }
        if key.is_default() {
            return Ok(None);
        }

        let fallback = key.with_implementation(DEFAULT_IMPLEMENTATION);
        debug!(missing = %key, fallback = %fallback, "falling back to default implementation");
        Ok(self
            .store
            .get_text(&fallback.to_string())
            .await?
            .map(|text| (text, ValueSource::StoredDefault)))
    }
}

/// `default` first, then byte order.
pub fn sort_implementations(names: &mut [String]) {
    names.sort_by(|a, b| {
        (a.as_str() != DEFAULT_IMPLEMENTATION)
            .cmp(&(b.as_str() != DEFAULT_IMPLEMENTATION))
            .then_with(|| a.cmp(b))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryKvStore;
    use crate::domain::models::KvEntry;

    fn resolver(entries: Vec<KvEntry>) -> AgentResolver<InMemoryKvStore> {
        AgentResolver::new(Arc::new(InMemoryKvStore::from_entries(entries)))
    }

    #[tokio::test]
    async fn test_model_name_falls_back_to_default() {
        let resolver = resolver(vec![KvEntry::text("versions.agentA._model_name.default", "gpt-4o")]);

        let model = resolver.get_agent_model_name("agentA", "custom").await.unwrap();
        assert_eq!(model.as_deref(), Some("gpt-4o"));

        let (_, source) = resolver.resolve_model_name("agentA", "custom").await.unwrap().unwrap();
        assert_eq!(source, ValueSource::StoredDefault);
    }

    #[tokio::test]
    async fn test_model_name_prefers_implementation_row() {
        let resolver = resolver(vec![
            KvEntry::text("versions.agentA._model_name.default", "gpt-4o"),
            KvEntry::text("versions.agentA._model_name.custom", "gpt-4o-mini"),
        ]);

        let (model, source) = resolver.resolve_model_name("agentA", "custom").await.unwrap().unwrap();
        assert_eq!(model, "gpt-4o-mini");
        assert_eq!(source, ValueSource::Stored);
    }

    #[tokio::test]
    async fn test_prompt_template_fallback_and_miss() {
        let resolver = resolver(vec![KvEntry::text("versions.fo-08.prompt.default", "Base prompt")]);

        assert_eq!(
            resolver.get_agent_prompt_template("fo-08", "v2").await.unwrap().as_deref(),
            Some("Base prompt")
        );
        assert_eq!(resolver.get_agent_prompt_template("fo-09", "v2").await.unwrap(), None);
        assert_eq!(resolver.get_agent_prompt_template("fo-09", "default").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_system_prompt_does_not_fall_back() {
        let resolver = resolver(vec![KvEntry::text("versions.fo-08.system.default", "Default system")]);

        assert_eq!(
            resolver.get_agent_system_prompt("fo-08", "default").await.unwrap().as_deref(),
            Some("Default system")
        );
        assert_eq!(resolver.get_agent_system_prompt("fo-08", "custom").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_implementations_default_first_then_alphabetical() {
        let resolver = resolver(vec![
            KvEntry::text("versions.fo-08.system.zeta", "z"),
            KvEntry::text("versions.fo-08.system.alpha", "a"),
            KvEntry::text("versions.fo-08.system.default", "d"),
            KvEntry::text("versions.fo-08.prompt.beta", "not a system row"),
            KvEntry::text("versions.fo-09.system.gamma", "other agent"),
        ]);

        let implementations = resolver.get_agent_implementations("fo-08").await.unwrap();
        assert_eq!(implementations, ["default", "alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_implementations_without_default() {
        let resolver = resolver(vec![
            KvEntry::text("versions.fo-08.system.b", "b"),
            KvEntry::text("versions.fo-08.system.a", "a"),
        ]);

        assert_eq!(resolver.get_agent_implementations("fo-08").await.unwrap(), ["a", "b"]);
        assert!(resolver.get_agent_implementations("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dotted_implementation_suffix_is_listed() {
        let resolver = resolver(vec![
            KvEntry::text("versions.fo-08.system.default", "d"),
            KvEntry::text("versions.fo-08.system.warm.v2", "dotted"),
        ]);

        let implementations = resolver.get_agent_implementations("fo-08").await.unwrap();
        assert_eq!(implementations, ["default", "warm.v2"]);
        assert_eq!(
            resolver.get_agent_system_prompt("fo-08", "warm.v2").await.unwrap().as_deref(),
            Some("dotted")
        );
    }

    #[test]
    fn test_sort_implementations() {
        let mut names = vec!["b".to_string(), "default".to_string(), "Z".to_string(), "a".to_string()];
        sort_implementations(&mut names);
        assert_eq!(names, ["default", "Z", "a", "b"]);
    }
}
