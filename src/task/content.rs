use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `content` of an exchange, resolved once from whatever JSON the
/// backend produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Content {
    /// A bare string.
    Text(String),
    /// An array whose first element is an object with a `text` field.
    TextObjectArray(Vec<Value>),
    /// An object with a `text` field.
    TextObject(Map<String, Value>),
    /// Anything else. Stringified when normalized.
    Raw(Value),
}

impl Content {
    /// The `text` field this shape carries, if it is one of the text shapes.
    pub fn text_field(&self) -> Option<&Value> {
        match self {
            Content::TextObjectArray(items) => items.first().and_then(|first| first.get("text")),
            Content::TextObject(map) => map.get("text"),
            Content::Text(_) | Content::Raw(_) => None,
        }
    }
}

fn has_text_field(value: &Value) -> bool {
    value.as_object().is_some_and(|map| map.contains_key("text"))
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Content::Text(s),
            Value::Array(items) if items.first().is_some_and(has_text_field) => {
                Content::TextObjectArray(items)
            }
            Value::Object(map) if map.contains_key("text") => Content::TextObject(map),
            other => Content::Raw(other),
        }
    }
}

impl From<Content> for Value {
    fn from(content: Content) -> Self {
        match content {
            Content::Text(s) => Value::String(s),
            Content::TextObjectArray(items) => Value::Array(items),
            Content::TextObject(map) => Value::Object(map),
            Content::Raw(value) => value,
        }
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::Text(s.to_string())
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::Text(s)
    }
}
