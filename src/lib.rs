//! Promptvault - versioned prompt templates rendered from a key-value store
//!
//! Prompt text, prompt fragments and model names live as rows in a
//! key-value table keyed `versions.<version>.<slot>.<implementation>`.
//! Operators edit rows to change agent behaviour without redeploying; code
//! renders a slot by gathering every row in its `(version, implementation)`
//! scope into a variable dictionary and rendering until the output is stable.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and port traits
//! - **Adapters** (`adapters`): SQLite and in-memory stores, mock chat client
//! - **Service Layer** (`services`): template engine, agent resolution,
//!   prompt builders and response parsers
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use promptvault::adapters::memory::InMemoryKvStore;
//! use promptvault::{RenderRequest, TemplateEngine};
//!
//! let store = Arc::new(InMemoryKvStore::from_yaml(
//!     "versions.fo-08.prompt.default: Hello {{ name }}",
//! )?);
//! let result = TemplateEngine::new(store)
//!     .render(RenderRequest::new("prompt", "fo-08").with_variable("name", "Ada"))
//!     .await?;
//! assert_eq!(result.output, "Hello Ada");
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    AgentDefinition, Config, DatabaseConfig, Generation, KvEntry, KvValue, LoggingConfig,
    RenderRequest, RenderResult, TemplateKey, TemplateScope,
};
pub use domain::ports::{ChatCompletion, KvAdmin, KvStore};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    AgentFactory, AgentResolver, JsonObjectParser, ResponseParser, StringListParser,
    TemplateEngine,
};
