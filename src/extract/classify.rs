use std::fmt;

/// Media type assigned to a rendered payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Json,
    Html,
    PlainText,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Json => "application/json",
            MediaType::Html => "text/html",
            MediaType::PlainText => "text/plain",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guess the media type from the text's shape. JSON is checked before HTML.
pub fn classify(text: &str) -> MediaType {
    let trimmed = text.trim();

    if looks_like_json(trimmed) {
        return MediaType::Json;
    }
    if looks_like_html(trimmed) {
        return MediaType::Html;
    }
    MediaType::PlainText
}

fn looks_like_json(trimmed: &str) -> bool {
    let bracketed = (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'));
    bracketed && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
}

fn looks_like_html(trimmed: &str) -> bool {
    let lower = trimmed.to_ascii_lowercase();
    lower.starts_with("<!doctype")
        || lower.starts_with("<html")
        || (lower.contains("<body") && lower.contains("</body>"))
}
