use super::fence::FENCE;

const DOCTYPE: &str = "<!doctype html";
const HTML_OPEN: &str = "<html";
const HTML_CLOSE: &str = "</html>";

/// Find an untagged HTML document inside free text.
///
/// Starts at the first `<!DOCTYPE html` (or, failing that, `<html`) and ends
/// after the first `</html>` that follows it, or at end of text. Case is
/// ignored. Text containing a code fence is left to the fence extractor.
pub fn extract_raw_html(text: &str) -> Option<&str> {
    if text.contains(FENCE) {
        return None;
    }

    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    let start = lower.find(DOCTYPE).or_else(|| lower.find(HTML_OPEN))?;

    let end = lower[start..]
        .find(HTML_CLOSE)
        .map(|offset| start + offset + HTML_CLOSE.len())
        .unwrap_or(text.len());

    Some(&text[start..end])
}
