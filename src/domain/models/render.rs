//! Render request/result models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::template_key::{TemplateScope, DEFAULT_IMPLEMENTATION};

/// A request to render one slot of a `(version, implementation)` scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Slot (variable name) to render, e.g. `system` or `prompt`.
    pub key: String,
    pub version: String,
    #[serde(default = "default_implementation")]
    pub implementation: String,
    /// Caller-supplied variables. These shadow KV-derived variables of the same name.
    #[serde(default)]
    pub variables: Map<String, Value>,
}

fn default_implementation() -> String {
    DEFAULT_IMPLEMENTATION.to_string()
}

impl RenderRequest {
    pub fn new(key: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version: version.into(),
            implementation: default_implementation(),
            variables: Map::new(),
        }
    }

    pub fn with_implementation(mut self, implementation: impl Into<String>) -> Self {
        self.implementation = implementation.into();
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables.extend(variables);
        self
    }

    pub fn scope(&self) -> TemplateScope {
        TemplateScope::new(self.version.clone(), self.implementation.clone())
    }
}

/// Output of a render plus the merged dictionary it was rendered against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResult {
    pub output: String,
    pub variables: Map<String, Value>,
    /// Passes executed before the output stopped changing.
    pub passes: usize,
}
