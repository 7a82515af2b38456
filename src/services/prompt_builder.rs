//! User-prompt builders.
//!
//! A builder turns structured flow context into the user prompt that is sent
//! alongside a rendered system prompt. Builders are pure: the same context
//! always yields the same string, which is what lets a prompt enumerate prior
//! outputs verbatim ("do not repeat these").

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Assemble a user prompt from flow-specific context.
pub trait PromptBuilder: Send + Sync {
    type Context;

    fn build(&self, context: &Self::Context) -> String;

    /// Variables this context contributes to system-prompt rendering.
    fn variables(&self, _context: &Self::Context) -> Map<String, Value> {
        Map::new()
    }
}

/// Context collected by an affirmation wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffirmationContext {
    pub user_name: Option<String>,
    pub topics: Vec<String>,
    /// How many new affirmations to ask for.
    pub count: usize,
    /// Affirmations the user kept; the model should match their style.
    pub approved: Vec<String>,
    /// Affirmations the user swiped away.
    pub skipped: Vec<String>,
    pub notes: Option<String>,
}

/// Builds the "generate N more affirmations" prompt.
#[derive(Debug, Clone, Default)]
pub struct AffirmationPromptBuilder;

impl PromptBuilder for AffirmationPromptBuilder {
    type Context = AffirmationContext;

    fn build(&self, context: &AffirmationContext) -> String {
        let count = context.count.max(1);
        let who = context
            .user_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("the user");

        let mut prompt = format!("Write {count} new personal affirmations for {who}.\n");

        if !context.topics.is_empty() {
            prompt.push_str(&format!("Focus areas: {}.\n", context.topics.join(", ")));
        }
        if let Some(notes) = context.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            prompt.push_str(&format!("What they shared: {}\n", notes.trim()));
        }

        push_numbered(
            &mut prompt,
            "Affirmations they kept (match this voice, do not repeat them):",
            &context.approved,
        );
        push_numbered(
            &mut prompt,
            "Affirmations they skipped (avoid this style, do not repeat them):",
            &context.skipped,
        );

        prompt.push_str(&format!(
            "\nRespond with only a JSON array of {count} strings, each a single sentence in the first person."
        ));
        prompt
    }

    fn variables(&self, context: &AffirmationContext) -> Map<String, Value> {
        let mut vars = Map::new();
        if let Some(name) = &context.user_name {
            vars.insert("user_name".to_string(), Value::from(name.as_str()));
        }
        vars.insert("topics".to_string(), Value::from(context.topics.clone()));
        vars.insert("count".to_string(), Value::from(context.count));
        vars.insert("approved".to_string(), Value::from(context.approved.clone()));
        vars.insert("skipped".to_string(), Value::from(context.skipped.clone()));
        vars
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            content: content.into(),
        }
    }
}

/// Context for discovery-style chat steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub turns: Vec<ConversationTurn>,
    pub instruction: String,
}

/// Renders a role-tagged transcript followed by the step's instruction.
#[derive(Debug, Clone, Default)]
pub struct ConversationPromptBuilder;

impl PromptBuilder for ConversationPromptBuilder {
    type Context = ConversationContext;

    fn build(&self, context: &ConversationContext) -> String {
        let mut prompt = String::new();
        if !context.turns.is_empty() {
            prompt.push_str("Conversation so far:\n");
            for turn in &context.turns {
                prompt.push_str(&format!("{}: {}\n", turn.speaker.label(), turn.content.trim()));
            }
            prompt.push('\n');
        }
        prompt.push_str(context.instruction.trim());
        prompt
    }

    fn variables(&self, context: &ConversationContext) -> Map<String, Value> {
        let mut vars = Map::new();
        vars.insert("turn_count".to_string(), Value::from(context.turns.len()));
        vars
    }
}

fn push_numbered(prompt: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    prompt.push_str(&format!("\n{heading}\n"));
    for (i, item) in items.iter().enumerate() {
        prompt.push_str(&format!("{}. \"{}\"\n", i + 1, item));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_context() -> AffirmationContext {
        AffirmationContext {
            user_name: Some("Ada".to_string()),
            topics: vec!["calm".to_string(), "career".to_string()],
            count: 3,
            approved: vec!["I am calm.".to_string()],
            skipped: vec!["I am a lion.".to_string()],
            notes: None,
        }
    }

    #[test]
    fn test_affirmation_prompt_lists_prior_outputs_verbatim() {
        let prompt = AffirmationPromptBuilder.build(&sample_context());

        assert!(prompt.starts_with("Write 3 new personal affirmations for Ada.\n"));
        assert!(prompt.contains("Focus areas: calm, career."));
        assert!(prompt.contains("1. \"I am calm.\""));
        assert!(prompt.contains("1. \"I am a lion.\""));
        assert!(prompt.ends_with("JSON array of 3 strings, each a single sentence in the first person."));
    }

    #[test]
    fn test_affirmation_prompt_is_deterministic() {
        let builder = AffirmationPromptBuilder;
        let context = sample_context();
        assert_eq!(builder.build(&context), builder.build(&context.clone()));
    }

    #[test]
    fn test_affirmation_prompt_minimal_context() {
        let prompt = AffirmationPromptBuilder.build(&AffirmationContext::default());
        assert!(prompt.starts_with("Write 1 new personal affirmations for the user."));
        assert!(!prompt.contains("Focus areas"));
        assert!(!prompt.contains("kept"));
    }

    #[test]
    fn test_affirmation_prompt_exact_layout() {
        let context = AffirmationContext {
            user_name: Some("Ada".to_string()),
            topics: vec!["calm".to_string()],
            count: 2,
            approved: vec!["I am calm.".to_string()],
            skipped: vec![],
            notes: Some("Busy week.".to_string()),
        };

        assert_eq!(
            AffirmationPromptBuilder.build(&context),
            "Write 2 new personal affirmations for Ada.\n\
             Focus areas: calm.\n\
             What they shared: Busy week.\n\
             \nAffirmations they kept (match this voice, do not repeat them):\n\
             1. \"I am calm.\"\n\
             \nRespond with only a JSON array of 2 strings, each a single sentence in the first person."
        );
    }

    #[test]
    fn test_affirmation_variables() {
        let vars = AffirmationPromptBuilder.variables(&sample_context());
        assert_eq!(vars["user_name"], "Ada");
        assert_eq!(vars["count"], 3);
        assert_eq!(vars["topics"], serde_json::json!(["calm", "career"]));
    }

    #[test]
    fn test_conversation_prompt() {
        let context = ConversationContext {
            turns: vec![
                ConversationTurn::assistant("What brings you here?"),
                ConversationTurn::user("  I want to sleep better. "),
            ],
            instruction: "Ask one follow-up question.".to_string(),
        };

        assert_eq!(
            ConversationPromptBuilder.build(&context),
            "Conversation so far:\nAssistant: What brings you here?\nUser: I want to sleep better.\n\nAsk one follow-up question."
        );
    }

    #[test]
    fn test_conversation_prompt_without_turns() {
        let context = ConversationContext {
            turns: vec![],
            instruction: "Greet the user.".to_string(),
        };
        assert_eq!(ConversationPromptBuilder.build(&context), "Greet the user.");
    }
}
