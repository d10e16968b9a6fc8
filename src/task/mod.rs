//! What travels between this service and the task backend.

pub mod content;

pub use content::Content;

use chrono::{DateTime, Utc};
use rand::RngExt;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// The payload posted to the work-intake endpoint. Built once per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskParameters {
    route: String,
    method: String,
    geo: String,
    body: String,
    query: String,
}

impl TaskParameters {
    pub fn new(
        route: impl Into<String>,
        method: impl Into<String>,
        geo: impl Into<String>,
        body: impl Into<String>,
        query: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            route: route.into(),
            method: method.into(),
            geo: geo.into(),
            body: body.into(),
            // A map of strings always serializes.
            query: serde_json::to_string(query).unwrap_or_else(|_| "{}".to_string()),
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn geo(&self) -> &str {
        &self.geo
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// The query mapping, serialized as a JSON object.
    pub fn query(&self) -> &str {
        &self.query
    }
}

static LAST_MILLIS: AtomicU64 = AtomicU64::new(0);

/// Correlates one trigger call with its poll calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh identifier: base36 milliseconds plus a random hex suffix.
    /// The time component never repeats within a process.
    pub fn generate() -> Self {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let mut prev = LAST_MILLIS.load(Ordering::SeqCst);
        let millis = loop {
            let next = now.max(prev + 1);
            match LAST_MILLIS.compare_exchange_weak(prev, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => break next,
                Err(actual) => prev = actual,
            }
        };
        let suffix: u32 = rand::rng().random();
        Self(format!("{}-{:08x}", base36(millis), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Where a run is in its lifecycle. `Ready` and `Error` are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Pending,
    Running,
    Ready,
    Error,
    /// A status this service does not know. Treated as still in flight.
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Ready | RunStatus::Error)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Ready => "ready",
            RunStatus::Error => "error",
            RunStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Backend timestamps arrive either as RFC 3339 strings or epoch numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    At(DateTime<Utc>),
    Epoch(f64),
    Text(String),
}

/// A snapshot of a run, replaced wholesale on every poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRun {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: RunStatus,
    #[serde(default, deserialize_with = "lenient_entries")]
    pub results: Vec<ResultEntry>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<Timestamp>,
    #[serde(default, alias = "modifiedAt")]
    pub modified_at: Option<Timestamp>,
}

/// One log line of a run, optionally carrying a message exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub msg: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub time: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub level: Option<f64>,
    #[serde(default, deserialize_with = "lenient_exchange")]
    pub exchange: Option<Exchange>,
    #[serde(
        default,
        rename = "lastMessage",
        alias = "last_message",
        deserialize_with = "lenient_exchange"
    )]
    pub last_message: Option<Exchange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(default)]
    pub content: Option<Content>,
}

// Everything below the run itself decodes leniently: a malformed entry
// degrades to text instead of failing the poll.

/// `null` means no entries; a lone non-array value counts as one entry.
fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<ResultEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().map(entry_from_value).collect(),
        other => vec![entry_from_value(other)],
    })
}

/// Entries that are not objects keep their text as `msg`.
fn entry_from_value(value: Value) -> ResultEntry {
    if value.is_object()
        && let Ok(entry) = ResultEntry::deserialize(&value)
    {
        return entry;
    }
    ResultEntry {
        msg: value_text(value),
        ..ResultEntry::default()
    }
}

/// A bare value in place of an exchange object is taken as its content.
fn lenient_exchange<'de, D>(deserializer: D) -> Result<Option<Exchange>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    if value.is_object()
        && let Ok(exchange) = Exchange::deserialize(&value)
    {
        return Ok(Some(exchange));
    }
    Ok(Some(Exchange {
        role: String::new(),
        content: Some(Content::from(value)),
    }))
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s.trim().parse().ok(),
        other => other.as_f64(),
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        other => value_text(other),
    })
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn parameters_serialize_query_as_json_text() {
        let query = BTreeMap::from([
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ]);
        let params = TaskParameters::new("/dogs", "GET", "NL", "", &query);
        assert_eq!(params.query(), r#"{"a":"1","b":"2"}"#);

        let body = serde_json::to_value(&params).unwrap();
        assert_eq!(body["route"], "/dogs");
        assert_eq!(body["method"], "GET");
        assert_eq!(body["geo"], "NL");
        assert_eq!(body["body"], "");
        assert_eq!(body["query"], r#"{"a":"1","b":"2"}"#);
    }

    #[test]
    fn run_ids_are_unique() {
        let ids: HashSet<RunId> = (0..1000).map(|_| RunId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn run_id_shape() {
        let id = RunId::generate();
        let (time, suffix) = id.as_str().split_once('-').unwrap();
        assert!(time.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn base36_encodes() {
        assert_eq!(base36(0), "0");
        assert_eq!(base36(35), "z");
        assert_eq!(base36(36), "10");
    }

    #[test]
    fn only_ready_and_error_are_terminal() {
        assert!(RunStatus::Ready.is_terminal());
        assert!(RunStatus::Error.is_terminal());
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(!RunStatus::Unknown.is_terminal());
    }

    #[test]
    fn decodes_full_run() {
        let json = r#"{
            "name": "site",
            "status": "ready",
            "created_at": "2024-05-01T10:00:00Z",
            "modified_at": 1714557600000,
            "results": [
                {"msg": "thinking", "time": 1, "level": 30},
                {"msg": "done", "lastMessage": {"role": "assistant", "content": "hi"}}
            ]
        }"#;
        let run: TaskRun = serde_json::from_str(json).unwrap();
        assert_eq!(run.status, RunStatus::Ready);
        assert!(matches!(run.created_at, Some(Timestamp::At(_))));
        assert!(matches!(run.modified_at, Some(Timestamp::Epoch(_))));
        assert_eq!(run.results.len(), 2);
        assert_eq!(
            run.results[1].last_message.as_ref().unwrap().content,
            Some(Content::Text("hi".to_string()))
        );
    }

    #[test]
    fn decodes_sparse_run() {
        let run: TaskRun = serde_json::from_str(r#"{"status": "queued", "results": null}"#).unwrap();
        assert_eq!(run.status, RunStatus::Unknown);
        assert!(run.results.is_empty());
        assert_eq!(run.name, "");
    }

    #[test]
    fn non_string_msg_is_stringified() {
        let entry: ResultEntry = serde_json::from_str(r#"{"msg": 12}"#).unwrap();
        assert_eq!(entry.msg, "12");
    }

    #[test]
    fn null_content_is_absent() {
        let ex: Exchange = serde_json::from_str(r#"{"role": "tool", "content": null}"#).unwrap();
        assert!(ex.content.is_none());
    }

    #[test]
    fn bare_string_last_message_becomes_content() {
        let run: TaskRun = serde_json::from_str(
            r#"{"status": "ready", "results": [{"msg": "x", "lastMessage": "plain answer"}]}"#,
        )
        .unwrap();
        let last = run.results[0].last_message.as_ref().unwrap();
        assert_eq!(last.role, "");
        assert_eq!(last.content, Some(Content::Text("plain answer".to_string())));
    }

    #[test]
    fn array_exchange_becomes_content() {
        let entry: ResultEntry =
            serde_json::from_str(r#"{"exchange": [{"type": "text", "text": "hi"}]}"#).unwrap();
        let exchange = entry.exchange.unwrap();
        assert!(matches!(exchange.content, Some(Content::TextObjectArray(_))));
    }

    #[test]
    fn null_exchange_is_absent() {
        let entry: ResultEntry =
            serde_json::from_str(r#"{"msg": "m", "exchange": null, "lastMessage": null}"#)
                .unwrap();
        assert!(entry.exchange.is_none());
        assert!(entry.last_message.is_none());
    }

    #[test]
    fn non_numeric_time_and_level_are_dropped() {
        let entry: ResultEntry =
            serde_json::from_str(r#"{"msg": "m", "time": {"at": 1}, "level": "info"}"#).unwrap();
        assert_eq!(entry.msg, "m");
        assert_eq!(entry.time, None);
        assert_eq!(entry.level, None);

        let entry: ResultEntry = serde_json::from_str(r#"{"level": "30"}"#).unwrap();
        assert_eq!(entry.level, Some(30.0));
    }

    #[test]
    fn bare_entries_keep_their_text() {
        let run: TaskRun = serde_json::from_str(
            r#"{"status": "running", "results": ["started", 7, {"msg": "third"}]}"#,
        )
        .unwrap();
        let msgs: Vec<&str> = run.results.iter().map(|e| e.msg.as_str()).collect();
        assert_eq!(msgs, ["started", "7", "third"]);
        assert!(run.results[0].exchange.is_none());
    }

    #[test]
    fn lone_entry_object_is_wrapped() {
        let run: TaskRun =
            serde_json::from_str(r#"{"status": "ready", "results": {"msg": "only"}}"#).unwrap();
        assert_eq!(run.results.len(), 1);
        assert_eq!(run.results[0].msg, "only");
    }
}
