use serde_json::json;

use errand::extract::{
    MediaType, classify, extract_code_fence, extract_raw_html, normalize, select_content,
};
use errand::task::{Content, TaskRun};

fn run_from(json: serde_json::Value) -> TaskRun {
    serde_json::from_value(json).unwrap()
}

// ── Extractors ────────────────────────────────────────────────────

#[test]
fn fenced_html_round_trip() {
    assert_eq!(
        extract_code_fence("```html\n<p>hi</p>\n```", Some("html")),
        "<p>hi</p>"
    );
}

#[test]
fn raw_html_stops_at_closing_tag() {
    assert_eq!(
        extract_raw_html("<!DOCTYPE html><body>x</body></html> trailing"),
        Some("<!DOCTYPE html><body>x</body></html>")
    );
}

#[test]
fn classifier_examples() {
    assert_eq!(classify(r#"{"a":1}"#), MediaType::Json);
    assert_eq!(classify("<html><body></body></html>"), MediaType::Html);
    assert_eq!(classify("hello"), MediaType::PlainText);
}

#[test]
fn normalize_is_identity_on_plain_prose() {
    for s in ["hello", "multi\nline text", "a < b and c > d", ""] {
        let once = normalize(&Content::from(s));
        let twice = normalize(&Content::from(once.as_str()));
        assert_eq!(once, s);
        assert_eq!(twice, once);
    }
}

// ── Selection over decoded runs ───────────────────────────────────

#[test]
fn empty_results_select_empty_text() {
    let run = run_from(json!({"status": "ready", "results": []}));
    assert_eq!(select_content(&run), Content::Text(String::new()));
}

#[test]
fn first_last_message_decides_output() {
    let run = run_from(json!({
        "status": "ready",
        "results": [
            {"msg": "tool", "exchange": {"role": "tool", "content": "tool text"}},
            {"msg": "a", "lastMessage": {"role": "assistant", "content": [{"type": "text", "text": "first"}]}},
            {"msg": "b", "lastMessage": {"role": "assistant", "content": "second"}}
        ]
    }));
    assert_eq!(normalize(&select_content(&run)), "first");
}

#[test]
fn object_content_without_text_is_serialized() {
    let run = run_from(json!({
        "status": "ready",
        "results": [{"msg": "x", "exchange": {"role": "tool", "content": {"rows": [1, 2]}}}]
    }));
    let text = normalize(&select_content(&run));
    assert_eq!(text, r#"{"rows":[1,2]}"#);
    assert_eq!(classify(&text), MediaType::Json);
}

#[test]
fn purchase_page_extraction() {
    let run = run_from(json!({
        "status": "ready",
        "results": [{
            "msg": "done",
            "lastMessage": {
                "role": "assistant",
                "content": "```html\n<!DOCTYPE html><html><body>Buy a dog</body></html>\n```"
            }
        }]
    }));
    let text = normalize(&select_content(&run));
    assert_eq!(text, "<!DOCTYPE html><html><body>Buy a dog</body></html>");
    assert_eq!(classify(&text), MediaType::Html);
}
