//! Typed form of the `versions.<version>.<slot>.<implementation>` key convention.
//!
//! Every key the engine reads or builds goes through [`TemplateKey`] or
//! [`TemplateScope`], so the stored wire format stays in one place.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::DomainError;

/// Namespace segment every stored key starts with.
pub const KEY_NAMESPACE: &str = "versions";

/// Implementation name used when the caller does not pick one.
pub const DEFAULT_IMPLEMENTATION: &str = "default";

/// The slot segment of a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    /// System prompt text (`system`).
    System,
    /// User prompt template text (`prompt`).
    Prompt,
    /// Model identifier (`_model_name`).
    ModelName,
    /// Any other named template variable, e.g. `_temperature_discovery`.
    Variable(String),
}

impl Slot {
    pub fn as_str(&self) -> &str {
        match self {
            Self::System => "system",
            Self::Prompt => "prompt",
            Self::ModelName => "_model_name",
            Self::Variable(name) => name,
        }
    }

    pub fn parse_str(s: &str) -> Self {
        match s {
            "system" => Self::System,
            "prompt" => Self::Prompt,
            "_model_name" => Self::ModelName,
            other => Self::Variable(other.to_string()),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully-qualified KV key: `versions.<version>.<slot>.<implementation>`.
///
/// `version` is the agent id (e.g. `fo-08`). Neither `version` nor
/// `implementation` may contain a dot; the slot may, since it is whatever
/// sits between them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TemplateKey {
    pub version: String,
    pub slot: Slot,
    pub implementation: String,
}

impl TemplateKey {
    pub fn new(version: impl Into<String>, slot: Slot, implementation: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            slot,
            implementation: implementation.into(),
        }
    }

    pub fn system(agent_id: &str, implementation: &str) -> Self {
        Self::new(agent_id, Slot::System, implementation)
    }

    pub fn prompt(agent_id: &str, implementation: &str) -> Self {
        Self::new(agent_id, Slot::Prompt, implementation)
    }

    pub fn model_name(agent_id: &str, implementation: &str) -> Self {
        Self::new(agent_id, Slot::ModelName, implementation)
    }

    /// The same key with its implementation swapped out.
    pub fn with_implementation(&self, implementation: impl Into<String>) -> Self {
        Self {
            implementation: implementation.into(),
            ..self.clone()
        }
    }

    pub fn is_default(&self) -> bool {
        self.implementation == DEFAULT_IMPLEMENTATION
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{KEY_NAMESPACE}.{}.{}.{}",
            self.version, self.slot, self.implementation
        )
    }
}

impl FromStr for TemplateKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidKey(s.to_string());

        let rest = s
            .strip_prefix(KEY_NAMESPACE)
            .and_then(|r| r.strip_prefix('.'))
            .ok_or_else(invalid)?;
        let (version, rest) = rest.split_once('.').ok_or_else(invalid)?;
        let (slot, implementation) = rest.rsplit_once('.').ok_or_else(invalid)?;

        if version.is_empty() || slot.is_empty() || implementation.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(version, Slot::parse_str(slot), implementation))
    }
}

impl TryFrom<String> for TemplateKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TemplateKey> for String {
    fn from(key: TemplateKey) -> Self {
        key.to_string()
    }
}

/// A prefix/suffix wildcard: matches any key of the form `<prefix>*<suffix>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    pub prefix: String,
    pub suffix: String,
}

impl KeyPattern {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Pattern with only a fixed prefix (`prefix%`).
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::new(prefix, "")
    }

    /// Exact, case-sensitive match. Prefix and suffix may not overlap.
    pub fn matches(&self, key: &str) -> bool {
        key.len() >= self.prefix.len() + self.suffix.len()
            && key.starts_with(&self.prefix)
            && key.ends_with(&self.suffix)
    }

    /// The wildcard part of `key`, if it matches.
    pub fn capture<'a>(&self, key: &'a str) -> Option<&'a str> {
        if !self.matches(key) {
            return None;
        }
        Some(&key[self.prefix.len()..key.len() - self.suffix.len()])
    }

    /// SQL `LIKE` form, to be used with `ESCAPE '\'`.
    pub fn to_like(&self) -> String {
        format!("{}%{}", escape_like(&self.prefix), escape_like(&self.suffix))
    }
}

fn escape_like(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A `(version, implementation)` bundle of KV rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateScope {
    pub version: String,
    pub implementation: String,
}

impl TemplateScope {
    pub fn new(version: impl Into<String>, implementation: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            implementation: implementation.into(),
        }
    }

    /// `versions.<version>.%.<implementation>`
    pub fn pattern(&self) -> KeyPattern {
        KeyPattern::new(
            format!("{KEY_NAMESPACE}.{}.", self.version),
            format!(".{}", self.implementation),
        )
    }

    /// Variable name for a key inside this scope, `None` for keys outside it.
    pub fn variable_name<'a>(&self, key: &'a str) -> Option<&'a str> {
        self.pattern().capture(key).filter(|name| !name.is_empty())
    }

    pub fn key(&self, slot: Slot) -> TemplateKey {
        TemplateKey::new(self.version.clone(), slot, self.implementation.clone())
    }
}
