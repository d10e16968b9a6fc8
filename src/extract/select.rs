use crate::task::{Content, TaskRun};

/// Pick the content worth surfacing from a finished run.
///
/// In order: the first entry with `lastMessage.content`, the first entry
/// with `exchange.content`, the last entry's `msg`. An empty run gives an
/// empty string.
pub fn select_content(run: &TaskRun) -> Content {
    let results = &run.results;

    if let Some(content) = results
        .iter()
        .find_map(|entry| entry.last_message.as_ref()?.content.as_ref())
    {
        return content.clone();
    }

    if let Some(content) = results
        .iter()
        .find_map(|entry| entry.exchange.as_ref()?.content.as_ref())
    {
        return content.clone();
    }

    match results.last() {
        Some(entry) => Content::Text(entry.msg.clone()),
        None => Content::Text(String::new()),
    }
}
