pub mod agent_factory;
pub mod agent_resolver;
pub mod prompt_builder;
pub mod response_parser;
pub mod template_engine;

pub use agent_factory::{AgentFactory, ResolvedAgent};
pub use agent_resolver::{sort_implementations, AgentResolver};
pub use prompt_builder::{
    AffirmationContext, AffirmationPromptBuilder, ConversationContext, ConversationPromptBuilder,
    ConversationTurn, PromptBuilder, Speaker,
};
pub use response_parser::{
    extract_json_span, json_candidates, JsonObjectParser, JsonShape, ResponseParser,
    StringListParser,
};
pub use template_engine::{render_to_fixed_point, TemplateEngine};
