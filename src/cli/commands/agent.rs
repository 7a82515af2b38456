//! Agent CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use std::sync::Arc;

use crate::adapters::chat::{EchoChatClient, MockChatClient};
use crate::adapters::sqlite::SqliteKvStore;
use crate::cli::commands::{collect_variables, open_store, parse_var};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{AgentDefinition, Config, ValueSource, DEFAULT_IMPLEMENTATION};
use crate::services::{AgentFactory, AgentResolver};

#[derive(Args, Debug)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommands,
}

#[derive(Subcommand, Debug)]
pub enum AgentCommands {
    /// Show stored prompts and model for an agent, after fallback
    Show {
        agent_id: String,
        #[arg(short, long, default_value = DEFAULT_IMPLEMENTATION)]
        implementation: String,
    },
    /// List implementations that have a system prompt
    Implementations {
        agent_id: String,
    },
    /// Dry run: resolve and render what would be sent to the model
    Preview {
        agent_id: String,
        #[arg(short, long, default_value = DEFAULT_IMPLEMENTATION)]
        implementation: String,
        /// User prompt to send
        #[arg(short, long, default_value = "")]
        prompt: String,
        /// In-code system prompt used when none is stored
        #[arg(long, default_value = "")]
        default_system: String,
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct AgentShowOutput {
    pub agent_id: String,
    pub implementation: String,
    pub system_prompt: Option<String>,
    pub prompt_template: Option<String>,
    pub model: Option<String>,
    pub model_source: Option<ValueSource>,
}

impl CommandOutput for AgentShowOutput {
    fn to_human(&self) -> String {
        let missing = || "(not set)".to_string();
        let model = match (&self.model, self.model_source) {
            (Some(model), Some(source)) => format!("{model} [{}]", source.as_str()),
            (Some(model), None) => model.clone(),
            _ => missing(),
        };
        [
            format!("Agent:          {}", self.agent_id),
            format!("Implementation: {}", self.implementation),
            format!("Model:          {model}"),
            String::new(),
            "System prompt:".to_string(),
            self.system_prompt.clone().unwrap_or_else(missing),
            String::new(),
            "Prompt template:".to_string(),
            self.prompt_template.clone().unwrap_or_else(missing),
        ]
        .join("\n")
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ImplementationsOutput {
    pub agent_id: String,
    pub implementations: Vec<String>,
}

impl CommandOutput for ImplementationsOutput {
    fn to_human(&self) -> String {
        if self.implementations.is_empty() {
            return format!("No implementations found for {}.", self.agent_id);
        }
        self.implementations.join("\n")
    }
}

#[derive(Debug, serde::Serialize)]
pub struct PreviewOutput {
    pub agent_id: String,
    pub implementation: String,
    pub model: String,
    pub model_source: ValueSource,
    pub system_prompt: String,
    pub system_prompt_source: ValueSource,
    pub user_prompt: String,
}

impl CommandOutput for PreviewOutput {
    fn to_human(&self) -> String {
        format!(
            "Model: {} [{}]\n\nSystem prompt [{}]:\n{}\n\nUser prompt:\n{}",
            self.model,
            self.model_source.as_str(),
            self.system_prompt_source.as_str(),
            self.system_prompt,
            self.user_prompt
        )
    }
}

pub async fn execute(args: AgentArgs, config: &Config, json_mode: bool) -> Result<()> {
    let store = open_store(config).await?;

    match args.command {
        AgentCommands::Show {
            agent_id,
            implementation,
        } => {
            let resolver = AgentResolver::new(store);
            let (system_prompt, prompt_template, model) = futures::try_join!(
                resolver.get_agent_system_prompt(&agent_id, &implementation),
                resolver.get_agent_prompt_template(&agent_id, &implementation),
                resolver.resolve_model_name(&agent_id, &implementation),
            )?;
            let (model, model_source) = model.unzip();
            output(
                &AgentShowOutput {
                    agent_id,
                    implementation,
                    system_prompt,
                    prompt_template,
                    model,
                    model_source,
                },
                json_mode,
            );
        }
        AgentCommands::Implementations { agent_id } => {
            let implementations = AgentResolver::new(store).get_agent_implementations(&agent_id).await?;
            output(
                &ImplementationsOutput {
                    agent_id,
                    implementations,
                },
                json_mode,
            );
        }
        AgentCommands::Preview {
            agent_id,
            implementation,
            prompt,
            default_system,
            vars,
        } => {
            let variables = collect_variables(None, &vars)?;
            let definition =
                AgentDefinition::new(agent_id, default_system).with_implementation(implementation);
            let factory: AgentFactory<SqliteKvStore, EchoChatClient> =
                AgentFactory::new(store, Arc::new(MockChatClient::echo()), config);
            let generation = factory.generate(&definition, &variables, prompt).await?;
            output(
                &PreviewOutput {
                    agent_id: generation.agent_id,
                    implementation: generation.implementation,
                    model: generation.model,
                    model_source: generation.model_source,
                    system_prompt: generation.system_prompt,
                    system_prompt_source: generation.system_prompt_source,
                    user_prompt: generation.user_prompt,
                },
                json_mode,
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_output_marks_missing_values() {
        let out = AgentShowOutput {
            agent_id: "fo-08".into(),
            implementation: "custom".into(),
            system_prompt: None,
            prompt_template: Some("Write {{ count }}".into()),
            model: Some("gpt-4o".into()),
            model_source: Some(ValueSource::StoredDefault),
        };
        let human = out.to_human();
        assert!(human.contains("gpt-4o [stored_default]"));
        assert!(human.contains("System prompt:\n(not set)"));
        assert!(human.contains("Write {{ count }}"));
    }

    #[test]
    fn test_implementations_output() {
        let empty = ImplementationsOutput {
            agent_id: "x".into(),
            implementations: vec![],
        };
        assert_eq!(empty.to_human(), "No implementations found for x.");

        let listed = ImplementationsOutput {
            agent_id: "x".into(),
            implementations: vec!["default".into(), "alpha".into()],
        };
        assert_eq!(listed.to_human(), "default\nalpha");
        assert_eq!(listed.to_json()["implementations"][1], "alpha");
    }
}
