//! Domain errors for the promptvault template system.

use thiserror::Error;

/// Domain-level errors that can occur while reading, rendering or resolving prompts.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The requested slot has no row for the given version/implementation.
    #[error("Template not found: {key}")]
    TemplateNotFound { key: String },

    /// The multi-pass render never reached a fixed point.
    #[error("Max render depth exceeded for template '{template}' after {passes} passes")]
    MaxRenderDepthExceeded { template: String, passes: usize },

    #[error("Failed to render template '{template}': {message}")]
    RenderFailed { template: String, message: String },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Chat completion failed: {0}")]
    ChatCompletionFailed(String),

    /// The model answered but nothing structured could be extracted.
    #[error("Generation for agent '{agent_id}' produced no usable result")]
    EmptyGeneration { agent_id: String },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

impl DomainError {
    /// Whether this error came from rendering (as opposed to storage or transport).
    pub const fn is_render_error(&self) -> bool {
        matches!(
            self,
            Self::TemplateNotFound { .. }
                | Self::MaxRenderDepthExceeded { .. }
                | Self::RenderFailed { .. }
        )
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
