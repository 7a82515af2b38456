//! Agent definitions and chat-completion exchange types.

use serde::{Deserialize, Serialize};

use super::template_key::DEFAULT_IMPLEMENTATION;

/// What an agent factory needs to know about one onboarding agent.
///
/// The in-code defaults are used when the KV store has no override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub agent_id: String,
    pub implementation: String,
    pub default_system_prompt: String,
    pub default_model: Option<String>,
}

impl AgentDefinition {
    pub fn new(agent_id: impl Into<String>, default_system_prompt: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            implementation: DEFAULT_IMPLEMENTATION.to_string(),
            default_system_prompt: default_system_prompt.into(),
            default_model: None,
        }
    }

    pub fn with_implementation(mut self, implementation: impl Into<String>) -> Self {
        self.implementation = implementation.into();
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }
}

/// Request handed to the chat-completion collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// The requested implementation's own row.
    Stored,
    /// The `default` implementation's row.
    StoredDefault,
    /// An in-code default supplied by the caller or config.
    Fallback,
}

impl ValueSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::StoredDefault => "stored_default",
            Self::Fallback => "fallback",
        }
    }
}

/// One completed generation round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    pub agent_id: String,
    pub implementation: String,
    pub system_prompt: String,
    pub system_prompt_source: ValueSource,
    pub model: String,
    pub model_source: ValueSource,
    pub user_prompt: String,
    pub text: String,
}
