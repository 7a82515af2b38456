mod common;

use common::seeded_store;
use promptvault::domain::models::ValueSource;
use promptvault::AgentResolver;

#[tokio::test]
async fn test_model_name_falls_back_to_default_implementation() {
    let store = seeded_store(&[("versions.agentA._model_name.default", "gpt-4o")]).await;
    let resolver = AgentResolver::new(store);

    let model = resolver
        .get_agent_model_name("agentA", "custom")
        .await
        .expect("lookup should succeed");

    assert_eq!(model.as_deref(), Some("gpt-4o"));
}

#[tokio::test]
async fn test_model_name_source_is_reported() {
    let store = seeded_store(&[
        ("versions.agentA._model_name.default", "gpt-4o"),
        ("versions.agentA._model_name.fast", "gpt-4o-mini"),
    ])
    .await;
    let resolver = AgentResolver::new(store);

    assert_eq!(
        resolver.resolve_model_name("agentA", "fast").await.unwrap(),
        Some(("gpt-4o-mini".to_string(), ValueSource::Stored))
    );
    assert_eq!(
        resolver.resolve_model_name("agentA", "slow").await.unwrap(),
        Some(("gpt-4o".to_string(), ValueSource::StoredDefault))
    );
    assert_eq!(resolver.resolve_model_name("agentB", "slow").await.unwrap(), None);
}

#[tokio::test]
async fn test_system_prompt_has_no_default_fallback() {
    let store = seeded_store(&[("versions.fo-08.system.default", "Default system")]).await;
    let resolver = AgentResolver::new(store);

    assert_eq!(
        resolver.get_agent_system_prompt("fo-08", "custom").await.unwrap(),
        None
    );
    assert_eq!(
        resolver.get_agent_system_prompt("fo-08", "default").await.unwrap().as_deref(),
        Some("Default system")
    );
}

#[tokio::test]
async fn test_prompt_template_falls_back_to_default() {
    let store = seeded_store(&[
        ("versions.fo-08.prompt.default", "Base"),
        ("versions.fo-08.prompt.v2", "Second"),
    ])
    .await;
    let resolver = AgentResolver::new(store);

    assert_eq!(
        resolver.get_agent_prompt_template("fo-08", "v2").await.unwrap().as_deref(),
        Some("Second")
    );
    assert_eq!(
        resolver.get_agent_prompt_template("fo-08", "v3").await.unwrap().as_deref(),
        Some("Base")
    );
}

#[tokio::test]
async fn test_implementations_are_ordered_and_scoped() {
    let store = seeded_store(&[
        ("versions.fo-08.system.zeta", "z"),
        ("versions.fo-08.system.default", "d"),
        ("versions.fo-08.system.Beta", "B"),
        ("versions.fo-08.system.alpha", "a"),
        ("versions.fo-08.prompt.gamma", "not a system row"),
        ("versions.fo-080.system.delta", "other agent"),
        ("versions.FO-08.system.epsilon", "different case"),
    ])
    .await;
    let resolver = AgentResolver::new(store);

    let implementations = resolver.get_agent_implementations("fo-08").await.unwrap();
    assert_eq!(implementations, ["default", "Beta", "alpha", "zeta"]);
}

#[tokio::test]
async fn test_implementations_for_unknown_agent_is_empty() {
    let store = seeded_store(&[("versions.fo-08.system.default", "d")]).await;
    let resolver = AgentResolver::new(store);

    assert!(resolver.get_agent_implementations("nobody").await.unwrap().is_empty());
}
