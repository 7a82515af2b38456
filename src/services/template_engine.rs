//! Template rendering engine.
//!
//! Renders one slot of a `(version, implementation)` scope against a
//! dictionary built from every row in that scope plus caller-supplied
//! variables. Substituted values may themselves contain template
//! directives, so rendering repeats until the output stops changing or the
//! pass limit is hit.

use liquid::model::{KString, Value as LiquidValue};
use liquid::{Object, ParserBuilder};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::config::default_max_render_passes;
use crate::domain::models::{RenderRequest, RenderResult, Slot, TemplateConfig, TemplateScope};
use crate::domain::ports::KvStore;

/// `{{ ... }}` output and `{% ... %}` tag bodies.
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{\{-?(.*?)-?\}\}|\{%-?(.*?)-?%\}").unwrap_or_else(|e| panic!("tag regex: {e}"))
});

static STRING_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""[^"]*"|'[^']*'"#).unwrap_or_else(|e| panic!("string literal regex: {e}"))
});

/// An identifier that is not a property access (`user` in `user.name`, not `name`).
static ROOT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w.])([A-Za-z_][\w-]*)").unwrap_or_else(|e| panic!("name regex: {e}"))
});

pub struct TemplateEngine<S: KvStore> {
    store: Arc<S>,
    max_passes: usize,
}

impl<S: KvStore> Clone for TemplateEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            max_passes: self.max_passes,
        }
    }
}

impl<S: KvStore> TemplateEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            max_passes: default_max_render_passes(),
        }
    }

    pub fn from_config(store: Arc<S>, config: &TemplateConfig) -> Self {
        Self::new(store).with_max_passes(config.max_render_passes)
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    pub const fn max_passes(&self) -> usize {
        self.max_passes
    }

    /// Variable dictionary derived from every row in `scope`.
    pub async fn scope_variables(&self, scope: &TemplateScope) -> DomainResult<Map<String, Value>> {
        let entries = self.store.get_values_by_pattern(&scope.pattern()).await?;

        Ok(entries
            .iter()
            .filter_map(|entry| {
                scope
                    .variable_name(&entry.key)
                    .map(|name| (name.to_string(), entry.value.template_variable()))
            })
            .collect())
    }

    /// Render `request.key` within its scope.
    ///
    /// Fails with `TemplateNotFound` when the scope has no row for the slot,
    /// `MaxRenderDepthExceeded` when the output never stabilises, and
    /// `RenderFailed` for malformed template syntax.
    #[instrument(
        skip(self, request),
        fields(key = %request.key, version = %request.version, implementation = %request.implementation)
    )]
    pub async fn render(&self, request: RenderRequest) -> DomainResult<RenderResult> {
        let scope = request.scope();
        let mut variables = self.scope_variables(&scope).await?;

        let template_text = match variables.get(&request.key) {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => {
                let key = scope.key(Slot::parse_str(&request.key)).to_string();
                warn!(%key, "template not found");
                return Err(DomainError::TemplateNotFound { key });
            }
        };

        let kv_count = variables.len();
        variables.extend(request.variables);

        let (output, passes) =
            render_to_fixed_point(&request.key, &template_text, &variables, self.max_passes)?;

        info!(passes, kv_variables = kv_count, total_variables = variables.len(), "template rendered");

        Ok(RenderResult {
            output,
            variables,
            passes,
        })
    }
}

/// Render `template` against `variables` until two successive passes agree.
///
/// Returns the stable output and the number of passes it took. The output
/// is a fixed point: rendering it again with the same variables yields it
/// unchanged. Variables the template names but nobody supplied render as
/// empty, the same as in Liquid.
pub fn render_to_fixed_point(
    name: &str,
    template: &str,
    variables: &Map<String, Value>,
    max_passes: usize,
) -> DomainResult<(String, usize)> {
    let render_failed = |e: liquid::Error| DomainError::RenderFailed {
        template: name.to_string(),
        message: e.to_string(),
    };

    let parser = ParserBuilder::with_stdlib().build().map_err(render_failed)?;
    let mut globals = liquid::to_object(variables).map_err(render_failed)?;

    let mut current = template.to_string();
    for pass in 1..=max_passes {
        declare_missing(&current, &mut globals);
        let rendered = parser
            .parse(&current)
            .and_then(|parsed| parsed.render(&globals))
            .map_err(render_failed)?;
        if rendered == current {
            return Ok((rendered, pass));
        }
        debug!(template = name, pass, "output changed, rendering again");
        current = rendered;
    }

    warn!(template = name, passes = max_passes, "render did not reach a fixed point");
    Err(DomainError::MaxRenderDepthExceeded {
        template: name.to_string(),
        passes: max_passes,
    })
}

/// Bind every top-level name referenced inside a tag to nil unless it is already set.
///
/// Filter names and loop variables get bound too; nothing reads them as globals.
fn declare_missing(template: &str, globals: &mut Object) {
    for tag in TAG.captures_iter(template) {
        let body = tag.get(1).or_else(|| tag.get(2)).map_or("", |m| m.as_str());
        let body = STRING_LITERAL.replace_all(body, " ");
        for name in ROOT_NAME.captures_iter(&body).filter_map(|c| c.get(1)) {
            if !globals.contains_key(name.as_str()) {
                globals.insert(KString::from(name.as_str().to_string()), LiquidValue::Nil);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryKvStore;
    use crate::domain::models::KvEntry;
    use proptest::prelude::*;
    use serde_json::json;

    fn engine(entries: Vec<KvEntry>) -> TemplateEngine<InMemoryKvStore> {
        TemplateEngine::new(Arc::new(InMemoryKvStore::from_entries(entries)))
    }

    fn vars(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_renders_slot_with_kv_variables() {
        let engine = engine(vec![
            KvEntry::text("versions.fo-08.prompt.default", "Write {{ count }} lines in a {{ tone }} tone."),
            KvEntry::text("versions.fo-08.tone.default", "gentle"),
            KvEntry::new("versions.fo-08.count.default", json!(3).into()),
        ]);

        let result = engine.render(RenderRequest::new("prompt", "fo-08")).await.unwrap();
        assert_eq!(result.output, "Write 3 lines in a gentle tone.");
        assert_eq!(result.variables["tone"], json!("gentle"));
        assert_eq!(result.variables["count"], json!(3));
    }

    #[tokio::test]
    async fn test_caller_variable_wins() {
        let engine = engine(vec![
            KvEntry::text("versions.fo-08.prompt.default", "Hello {{ x }}"),
            KvEntry::text("versions.fo-08.x.default", "kv"),
        ]);

        let result = engine
            .render(RenderRequest::new("prompt", "fo-08").with_variable("x", "override"))
            .await
            .unwrap();

        assert_eq!(result.output, "Hello override");
        assert_eq!(result.variables["x"], json!("override"));
    }

    #[tokio::test]
    async fn test_nested_fragments_expand_over_passes() {
        let engine = engine(vec![
            KvEntry::text("versions.ap-01.system.default", "{{ persona }} Rules: {{ rules }}"),
            KvEntry::text("versions.ap-01.persona.default", "You coach {{ user_name }}."),
            KvEntry::text("versions.ap-01.rules.default", "Be brief, {{ user_name }}."),
        ]);

        let result = engine
            .render(RenderRequest::new("system", "ap-01").with_variable("user_name", "Ada"))
            .await
            .unwrap();

        assert_eq!(result.output, "You coach Ada. Rules: Be brief, Ada.");
        assert_eq!(result.passes, 3);
    }

    #[tokio::test]
    async fn test_not_found_names_fully_qualified_key() {
        let engine = engine(vec![]);

        let err = engine
            .render(RenderRequest::new("prompt", "zz-99").with_implementation("default"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::TemplateNotFound { .. }));
        assert!(err.to_string().contains("versions.zz-99.prompt.default"));
    }

    #[tokio::test]
    async fn test_cycle_stops_after_exactly_max_passes() {
        let engine = engine(vec![
            KvEntry::text("versions.loop.a.default", "{{b}}"),
            KvEntry::text("versions.loop.b.default", "{{a}}"),
        ]);

        let err = engine.render(RenderRequest::new("a", "loop")).await.unwrap_err();
        match err {
            DomainError::MaxRenderDepthExceeded { template, passes } => {
                assert_eq!(template, "a");
                assert_eq!(passes, 10);
            }
            other => panic!("expected MaxRenderDepthExceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_custom_pass_limit() {
        let engine = engine(vec![
            KvEntry::text("versions.v.t.default", "{{ a }}"),
            KvEntry::text("versions.v.a.default", "{{ b }}"),
            KvEntry::text("versions.v.b.default", "done"),
        ])
        .with_max_passes(2);

        assert!(matches!(
            engine.render(RenderRequest::new("t", "v")).await,
            Err(DomainError::MaxRenderDepthExceeded { passes: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_scope_isolation() {
        let engine = engine(vec![
            KvEntry::text("versions.fo-08.prompt.default", "eight"),
            KvEntry::text("versions.fo-08.secret.default", "leak"),
            KvEntry::text("versions.fo-09.prompt.default", "nine"),
            KvEntry::text("versions.fo-09.prompt.custom", "nine custom"),
        ]);

        let result = engine.render(RenderRequest::new("prompt", "fo-09")).await.unwrap();
        assert_eq!(result.output, "nine");
        assert_eq!(result.variables.len(), 1);
        assert!(!result.variables.contains_key("secret"));
    }

    #[tokio::test]
    async fn test_raw_values_drive_loops_and_conditionals() {
        let engine = engine(vec![
            KvEntry::text(
                "versions.fo-10.prompt.default",
                "{% for t in topics %}- {{ t }}\n{% endfor %}{% if strict %}Be strict.{% endif %}",
            ),
            KvEntry::new("versions.fo-10.topics.default", json!(["calm", "focus"]).into()),
            KvEntry::new("versions.fo-10.strict.default", json!(true).into()),
        ]);

        let result = engine.render(RenderRequest::new("prompt", "fo-10")).await.unwrap();
        assert_eq!(result.output, "- calm\n- focus\nBe strict.");
    }

    #[tokio::test]
    async fn test_object_without_text_passes_through() {
        let engine = engine(vec![
            KvEntry::text("versions.fo-11.prompt.default", "Temp {{ settings.temperature }}"),
            KvEntry::new("versions.fo-11.settings.default", json!({"temperature": 0.4}).into()),
        ]);

        let result = engine.render(RenderRequest::new("prompt", "fo-11")).await.unwrap();
        assert_eq!(result.output, "Temp 0.4");
        assert_eq!(result.variables["settings"], json!({"temperature": 0.4}));
    }

    #[tokio::test]
    async fn test_malformed_template_is_render_error() {
        let engine = engine(vec![KvEntry::text("versions.bad.prompt.default", "{% if %}")]);

        let err = engine.render(RenderRequest::new("prompt", "bad")).await.unwrap_err();
        assert!(matches!(err, DomainError::RenderFailed { ref template, .. } if template == "prompt"));
    }

    #[tokio::test]
    async fn test_undefined_variable_renders_empty() {
        let engine = engine(vec![KvEntry::text("versions.u.prompt.default", "Coach{{ user_name }}.")]);

        let result = engine.render(RenderRequest::new("prompt", "u")).await.unwrap();
        assert_eq!(result.output, "Coach.");
        assert!(!result.variables.contains_key("user_name"));
    }

    #[tokio::test]
    async fn test_liquid_filters_with_arguments() {
        let engine = engine(vec![
            KvEntry::text(
                "versions.fo-12.prompt.default",
                "Topics: {{ topics | join: \", \" }}. Hi {{ name | default: \"friend\" }}.",
            ),
            KvEntry::new("versions.fo-12.topics.default", json!(["calm", "focus"]).into()),
        ]);

        let result = engine.render(RenderRequest::new("prompt", "fo-12")).await.unwrap();
        assert_eq!(result.output, "Topics: calm, focus. Hi friend.");
    }

    #[test]
    fn test_unless_tag() {
        let template = "{% unless strict %}Relax.{% endunless %}";

        let (output, _) = render_to_fixed_point("t", template, &Map::new(), 10).unwrap();
        assert_eq!(output, "Relax.");

        let (output, _) = render_to_fixed_point("t", template, &vars(json!({"strict": true})), 10).unwrap();
        assert_eq!(output, "");
    }

    #[test]
    fn test_string_literals_are_not_declared() {
        let mut globals = Object::new();
        declare_missing("{{ a | default: \"b\" }}{% for t in items %}{{ t.name }}{% endfor %}", &mut globals);

        for name in ["a", "t", "items", "default"] {
            assert!(globals.contains_key(name), "{name} should be declared");
        }
        assert!(!globals.contains_key("b"));
        assert!(!globals.contains_key("name"));
    }

    #[test]
    fn test_plain_text_is_stable_on_first_pass() {
        let (output, passes) = render_to_fixed_point("t", "no directives", &Map::new(), 10).unwrap();
        assert_eq!(output, "no directives");
        assert_eq!(passes, 1);
    }

    #[test]
    fn test_fixed_point_is_idempotent() {
        let variables = vars(json!({
            "greeting": "Hello {{ name }}",
            "name": "{{ first }} {{ last }}",
            "first": "Ada",
            "last": "Lovelace"
        }));

        let (output, _) = render_to_fixed_point("t", "{{ greeting }}!", &variables, 10).unwrap();
        assert_eq!(output, "Hello Ada Lovelace!");

        let (again, passes) = render_to_fixed_point("t", &output, &variables, 10).unwrap();
        assert_eq!(again, output);
        assert_eq!(passes, 1);
    }

    proptest! {
        #[test]
        fn prop_rendering_reaches_fixed_point(
            words in proptest::collection::vec("[a-z ]{0,8}", 1..6),
            values in proptest::collection::vec("[a-zA-Z ,.]{0,12}", 3),
        ) {
            let variables = vars(json!({ "v0": values[0], "v1": values[1], "v2": values[2] }));
            let template: String = words
                .iter()
                .enumerate()
                .map(|(i, w)| format!("{w}{{{{ v{} }}}}", i % 3))
                .collect();

            let (output, _) = render_to_fixed_point("p", &template, &variables, 10).unwrap();
            let (again, passes) = render_to_fixed_point("p", &output, &variables, 10).unwrap();
            prop_assert_eq!(again, output);
            prop_assert_eq!(passes, 1);
        }
    }
}
