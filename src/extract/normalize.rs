use serde_json::Value;
use tracing::debug;

use super::fence::{FENCE, extract_code_fence};
use super::html::extract_raw_html;
use crate::task::Content;

/// Reduce a content value to one displayable string.
///
/// Never fails: shapes that cannot be interpreted fall back to their
/// string form.
pub fn normalize(content: &Content) -> String {
    match content {
        Content::Text(s) => {
            debug!(shape = "text", "normalizing content");
            normalize_text(s)
        }
        Content::TextObjectArray(_) | Content::TextObject(_) => {
            debug!(shape = "text-object", "normalizing content");
            match content.text_field() {
                Some(text) => normalize_text(&value_to_string(text)),
                None => value_to_string(&Value::from(content.clone())),
            }
        }
        Content::Raw(Value::Array(items)) => {
            debug!(shape = "array", "normalizing content");
            items
                .iter()
                .map(value_to_string)
                .collect::<Vec<_>>()
                .join("\n")
        }
        Content::Raw(value) => {
            debug!(shape = "raw", "normalizing content");
            value_to_string(value)
        }
    }
}

/// Strings: fenced blocks first (favouring `html`), then a bare HTML
/// document, then the string as is.
pub fn normalize_text(text: &str) -> String {
    if text.contains(FENCE) {
        return extract_code_fence(text, Some("html")).to_string();
    }
    extract_raw_html(text).unwrap_or(text).to_string()
}

/// Strings stay as they are; everything else becomes compact JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
