//! Response parsers for free-form model output.
//!
//! Model text is untrusted. Every parser runs a cascade of progressively
//! looser strategies and never fails: when nothing usable is found the
//! result is the output type's empty value.
//!
//! 1. Parse the trimmed text directly as JSON.
//! 2. Extract the first JSON span (inside a code fence, or between the
//!    outermost brackets) and parse that.
//! 3. Parser-specific heuristics (quoted strings for lists).
//! 4. Empty.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::debug;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)```").unwrap_or_else(|e| panic!("fence regex: {e}"))
});

static ARRAY_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").unwrap_or_else(|e| panic!("array regex: {e}")));

static OBJECT_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap_or_else(|e| panic!("object regex: {e}")));

/// Straight or curly double-quoted runs.
static QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""((?:[^"\\]|\\.)*)"|\u{201C}([^\u{201D}]*)\u{201D}"#)
        .unwrap_or_else(|e| panic!("quote regex: {e}"))
});

/// Which JSON container a parser is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Array,
    Object,
}

impl JsonShape {
    const fn delimiters(self) -> (char, char) {
        match self {
            Self::Array => ('[', ']'),
            Self::Object => ('{', '}'),
        }
    }

    fn span_regex(self) -> &'static Regex {
        match self {
            Self::Array => &ARRAY_SPAN,
            Self::Object => &OBJECT_SPAN,
        }
    }
}

/// Turn raw model text into a typed result.
pub trait ResponseParser: Send + Sync {
    type Output: Default;

    /// Never fails; returns `Output::default()` when nothing usable is found.
    fn parse(&self, text: &str) -> Self::Output;

    /// Whether a parsed result carries nothing the caller can use.
    fn is_empty(&self, output: &Self::Output) -> bool;
}

/// JSON candidates in the order the cascade should try them: the trimmed
/// text itself when it already looks like `shape`, then fenced blocks, then
/// the outermost bracket span.
pub fn json_candidates(text: &str, shape: JsonShape) -> Vec<&str> {
    let (open, close) = shape.delimiters();
    let trimmed = text.trim();
    let mut candidates = Vec::new();

    if trimmed.starts_with(open) && trimmed.ends_with(close) {
        candidates.push(trimmed);
    }
    if let Some(span) = extract_json_span(text, shape) {
        if !candidates.contains(&span) {
            candidates.push(span);
        }
    }
    if let Some(span) = trimmed
        .find(open)
        .zip(trimmed.rfind(close))
        .filter(|(start, end)| start < end)
        .map(|(start, end)| &trimmed[start..=end])
    {
        if !candidates.contains(&span) {
            candidates.push(span);
        }
    }
    candidates
}

/// First JSON span of the given shape, preferring a fenced code block.
pub fn extract_json_span(text: &str, shape: JsonShape) -> Option<&str> {
    let (open, close) = shape.delimiters();

    for captures in FENCED_BLOCK.captures_iter(text) {
        if let Some(body) = captures.get(1) {
            let body = body.as_str().trim();
            if body.starts_with(open) && body.ends_with(close) {
                return Some(body);
            }
        }
    }

    shape.span_regex().find(text).map(|m| m.as_str())
}

/// Parses a list of strings, e.g. a batch of affirmations.
#[derive(Debug, Clone)]
pub struct StringListParser {
    min_len: usize,
    max_len: usize,
}

impl Default for StringListParser {
    fn default() -> Self {
        Self {
            min_len: 5,
            max_len: 200,
        }
    }
}

impl StringListParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Character-length window for the quoted-string heuristic.
    pub fn with_length_window(mut self, min_len: usize, max_len: usize) -> Self {
        self.min_len = min_len;
        self.max_len = max_len.max(min_len);
        self
    }

    fn from_json(&self, text: &str) -> Option<Vec<String>> {
        json_candidates(text, JsonShape::Array)
            .into_iter()
            .chain(json_candidates(text, JsonShape::Object))
            .find_map(|candidate| {
                let value: Value = serde_json::from_str(candidate).ok()?;
                strings_from_value(&value).filter(|items| !items.is_empty())
            })
    }

    fn from_quotes(&self, text: &str) -> Vec<String> {
        QUOTED
            .captures_iter(text)
            .filter_map(|captures| {
                if let Some(straight) = captures.get(0).filter(|_| captures.get(1).is_some()) {
                    serde_json::from_str::<String>(straight.as_str()).ok()
                } else {
                    captures.get(2).map(|curly| curly.as_str().to_string())
                }
            })
            .map(|s| s.trim().to_string())
            .filter(|s| (self.min_len..=self.max_len).contains(&s.chars().count()))
            .collect()
    }
}

impl ResponseParser for StringListParser {
    type Output = Vec<String>;

    fn parse(&self, text: &str) -> Vec<String> {
        if let Some(items) = self.from_json(text) {
            return items;
        }

        let quoted = self.from_quotes(text);
        if !quoted.is_empty() {
            debug!(count = quoted.len(), "list recovered from quoted strings");
            return quoted;
        }

        debug!("no list found in model output");
        Vec::new()
    }

    fn is_empty(&self, output: &Vec<String>) -> bool {
        output.is_empty()
    }
}

/// Strings from a JSON array, or from the first array-valued field of an
/// object such as `{"affirmations": [...]}`.
fn strings_from_value(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
        ),
        Value::Object(fields) => fields
            .values()
            .filter(|v| v.is_array())
            .find_map(|v| strings_from_value(v).filter(|items| !items.is_empty())),
        _ => None,
    }
}

/// Parses a JSON object, optionally requiring some fields to be present.
#[derive(Debug, Clone, Default)]
pub struct JsonObjectParser {
    required_fields: Vec<String>,
}

impl JsonObjectParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, field: impl Into<String>) -> Self {
        self.required_fields.push(field.into());
        self
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required_fields
    }

    /// Parse and then deserialize into `T`; `None` when either step fails.
    pub fn parse_as<T: DeserializeOwned>(&self, text: &str) -> Option<T> {
        let object = self.parse(text);
        if object.is_empty() {
            return None;
        }
        serde_json::from_value(Value::Object(object)).ok()
    }

    fn has_required(&self, object: &Map<String, Value>) -> bool {
        self.required_fields
            .iter()
            .all(|field| object.get(field).is_some_and(|v| !v.is_null()))
    }
}

impl ResponseParser for JsonObjectParser {
    type Output = Map<String, Value>;

    fn parse(&self, text: &str) -> Map<String, Value> {
        let found = json_candidates(text, JsonShape::Object)
            .into_iter()
            .find_map(|candidate| match serde_json::from_str::<Value>(candidate) {
                Ok(Value::Object(object)) if self.has_required(&object) => Some(object),
                _ => None,
            });

        found.unwrap_or_else(|| {
            debug!(required = ?self.required_fields, "no usable object in model output");
            Map::new()
        })
    }

    fn is_empty(&self, output: &Map<String, Value>) -> bool {
        output.is_empty()
    }
}
