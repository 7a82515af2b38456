pub mod agent;
pub mod config;
pub mod kv;
pub mod render;
pub mod template_key;

pub use agent::{AgentDefinition, ChatRequest, ChatResponse, Generation, ValueSource};
pub use config::{AgentsConfig, Config, DatabaseConfig, LoggingConfig, TemplateConfig};
pub use kv::{KvEntry, KvValue};
pub use render::{RenderRequest, RenderResult};
pub use template_key::{
    KeyPattern, Slot, TemplateKey, TemplateScope, DEFAULT_IMPLEMENTATION, KEY_NAMESPACE,
};
