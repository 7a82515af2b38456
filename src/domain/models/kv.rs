//! KV entry model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The JSON payload stored under a key.
///
/// Most rows are objects with a string `text` field; any other fields ride
/// along untouched in `extra`. Rows without a string `text` field are kept
/// as-is so templates can loop or branch over them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum KvValue {
    Text { text: String, extra: Map<String, Value> },
    Raw(Value),
}

impl KvValue {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            extra: Map::new(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            Self::Raw(_) => None,
        }
    }

    /// Value contributed to a render's variable dictionary: the text if
    /// present, otherwise the raw JSON.
    pub fn template_variable(&self) -> Value {
        match self {
            Self::Text { text, .. } => Value::String(text.clone()),
            Self::Raw(value) => value.clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        self.clone().into()
    }
}

impl From<Value> for KvValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(mut map) => match map.remove("text") {
                Some(Value::String(text)) => Self::Text { text, extra: map },
                Some(other) => {
                    map.insert("text".to_string(), other);
                    Self::Raw(Value::Object(map))
                }
                None => Self::Raw(Value::Object(map)),
            },
            other => Self::Raw(other),
        }
    }
}

impl From<KvValue> for Value {
    fn from(value: KvValue) -> Self {
        match value {
            KvValue::Text { text, extra } => {
                let mut map = Map::with_capacity(extra.len() + 1);
                map.insert("text".to_string(), Value::String(text));
                map.extend(extra);
                Value::Object(map)
            }
            KvValue::Raw(value) => value,
        }
    }
}

/// One `(key, value)` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvEntry {
    pub key: String,
    pub value: KvValue,
}

impl KvEntry {
    pub fn new(key: impl Into<String>, value: KvValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn text(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(key, KvValue::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_record_keeps_extra_fields() {
        let value: KvValue = serde_json::from_value(json!({
            "text": "You are kind.",
            "author": "ops",
            "rev": 3
        }))
        .unwrap();

        assert_eq!(value.as_text(), Some("You are kind."));
        assert_eq!(value.template_variable(), json!("You are kind."));
        assert_eq!(
            value.to_json(),
            json!({"text": "You are kind.", "author": "ops", "rev": 3})
        );
    }

    #[test]
    fn test_object_without_text_is_raw() {
        let raw = json!({"topics": ["calm", "focus"]});
        let value = KvValue::from(raw.clone());
        assert_eq!(value.as_text(), None);
        assert_eq!(value.template_variable(), raw);
    }

    #[test]
    fn test_non_string_text_is_raw() {
        let raw = json!({"text": 42});
        let value = KvValue::from(raw.clone());
        assert!(matches!(value, KvValue::Raw(_)));
        assert_eq!(value.to_json(), raw);
    }

    #[test]
    fn test_scalars_and_arrays_pass_through() {
        assert_eq!(KvValue::from(json!(0.7)).template_variable(), json!(0.7));
        assert_eq!(
            KvValue::from(json!(["a", "b"])).template_variable(),
            json!(["a", "b"])
        );
    }
}
