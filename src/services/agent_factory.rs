//! Agent factory.
//!
//! Wires a stored (or in-code default) system prompt and a model name to the
//! chat-completion collaborator. KV overrides win; a missing override is
//! never an error because every agent definition carries its own defaults.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AgentDefinition, ChatRequest, Config, Generation, RenderRequest, Slot, ValueSource,
};
use crate::domain::ports::{ChatCompletion, KvStore};
use crate::services::agent_resolver::AgentResolver;
use crate::services::prompt_builder::PromptBuilder;
use crate::services::response_parser::ResponseParser;
use crate::services::template_engine::{render_to_fixed_point, TemplateEngine};

/// System prompt and model chosen for one agent invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAgent {
    pub system_prompt: String,
    pub system_prompt_source: ValueSource,
    pub model: String,
    pub model_source: ValueSource,
}

pub struct AgentFactory<S: KvStore, C: ChatCompletion> {
    engine: TemplateEngine<S>,
    resolver: AgentResolver<S>,
    chat: Arc<C>,
    default_model: String,
}

impl<S: KvStore, C: ChatCompletion> AgentFactory<S, C> {
    pub fn new(store: Arc<S>, chat: Arc<C>, config: &Config) -> Self {
        Self {
            engine: TemplateEngine::from_config(Arc::clone(&store), &config.templates),
            resolver: AgentResolver::new(store),
            chat,
            default_model: config.agents.default_model.clone(),
        }
    }

    pub fn engine(&self) -> &TemplateEngine<S> {
        &self.engine
    }

    pub fn resolver(&self) -> &AgentResolver<S> {
        &self.resolver
    }

    /// Resolve the system prompt and model without calling the model.
    #[instrument(skip(self, definition, variables), fields(agent = %definition.agent_id, implementation = %definition.implementation))]
    pub async fn prepare(
        &self,
        definition: &AgentDefinition,
        variables: &Map<String, Value>,
    ) -> DomainResult<ResolvedAgent> {
        let ((system_prompt, system_prompt_source), (model, model_source)) = futures::try_join!(
            self.resolve_system_prompt(definition, variables),
            self.resolve_model(definition),
        )?;

        debug!(
            system_source = system_prompt_source.as_str(),
            %model,
            model_source = model_source.as_str(),
            "agent resolved"
        );

        Ok(ResolvedAgent {
            system_prompt,
            system_prompt_source,
            model,
            model_source,
        })
    }

    /// Resolve the agent and run one completion with `user_prompt`.
    #[instrument(skip(self, definition, variables, user_prompt), fields(agent = %definition.agent_id))]
    pub async fn generate(
        &self,
        definition: &AgentDefinition,
        variables: &Map<String, Value>,
        user_prompt: impl Into<String>,
    ) -> DomainResult<Generation> {
        let resolved = self.prepare(definition, variables).await?;
        let user_prompt = user_prompt.into();

        let response = self
            .chat
            .complete(ChatRequest {
                system_prompt: resolved.system_prompt.clone(),
                user_prompt: user_prompt.clone(),
                model: resolved.model.clone(),
            })
            .await?;

        info!(model = %resolved.model, response_len = response.text.len(), "generation complete");

        Ok(Generation {
            agent_id: definition.agent_id.clone(),
            implementation: definition.implementation.clone(),
            system_prompt: resolved.system_prompt,
            system_prompt_source: resolved.system_prompt_source,
            model: resolved.model,
            model_source: resolved.model_source,
            user_prompt,
            text: response.text,
        })
    }

    /// Build the user prompt, generate, and parse the reply.
    ///
    /// The builder's variables are offered to the system prompt alongside
    /// `variables`, which win on conflict. An empty parse is reported as
    /// `EmptyGeneration` so callers can fall back to their own content.
    pub async fn generate_with<B, P>(
        &self,
        definition: &AgentDefinition,
        builder: &B,
        context: &B::Context,
        variables: Map<String, Value>,
        parser: &P,
    ) -> DomainResult<(Generation, P::Output)>
    where
        B: PromptBuilder,
        P: ResponseParser,
    {
        let mut merged = builder.variables(context);
        merged.extend(variables);
        let user_prompt = builder.build(context);

        let generation = self.generate(definition, &merged, user_prompt).await?;
        let parsed = parser.parse(&generation.text);
        if parser.is_empty(&parsed) {
            return Err(DomainError::EmptyGeneration {
                agent_id: definition.agent_id.clone(),
            });
        }
        Ok((generation, parsed))
    }

    async fn resolve_system_prompt(
        &self,
        definition: &AgentDefinition,
        variables: &Map<String, Value>,
    ) -> DomainResult<(String, ValueSource)> {
        let request = RenderRequest::new(Slot::System.as_str(), definition.agent_id.as_str())
            .with_implementation(definition.implementation.as_str())
            .with_variables(variables.clone());

        match self.engine.render(request).await {
            Ok(result) => Ok((result.output, ValueSource::Stored)),
            Err(DomainError::TemplateNotFound { key }) => {
                debug!(%key, "no stored system prompt, using in-code default");
                let (output, _) = render_to_fixed_point(
                    &definition.agent_id,
                    &definition.default_system_prompt,
                    variables,
                    self.engine.max_passes(),
                )?;
                Ok((output, ValueSource::Fallback))
            }
            Err(e) => Err(e),
        }
    }

    async fn resolve_model(&self, definition: &AgentDefinition) -> DomainResult<(String, ValueSource)> {
        if let Some(found) = self
            .resolver
            .resolve_model_name(&definition.agent_id, &definition.implementation)
            .await?
        {
            return Ok(found);
        }
        let model = definition
            .default_model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());
        Ok((model, ValueSource::Fallback))
    }
}
