/// Opening and closing delimiter of a fenced block.
pub const FENCE: &str = "```";

/// One fenced block found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock<'a> {
    /// Language tag on the opening line; empty when untagged.
    pub lang: &'a str,
    /// Inner content, untrimmed.
    pub body: &'a str,
}

/// All complete fenced blocks in document order. An unterminated fence
/// is not a block.
pub fn code_blocks(text: &str) -> Vec<CodeBlock<'_>> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(FENCE) {
        let after_open = &rest[open + FENCE.len()..];

        let lang_len = after_open
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+')))
            .unwrap_or(after_open.len());
        let lang = &after_open[..lang_len];
        let body_and_rest = &after_open[lang_len..];

        let Some(close) = body_and_rest.find(FENCE) else {
            break;
        };

        blocks.push(CodeBlock {
            lang,
            body: &body_and_rest[..close],
        });
        rest = &body_and_rest[close + FENCE.len()..];
    }

    blocks
}

/// Pull the content out of a fenced block.
///
/// A block tagged with `preferred` (case-insensitive) wins; otherwise the
/// first block does. Text without a complete block comes back unchanged.
pub fn extract_code_fence<'a>(text: &'a str, preferred: Option<&str>) -> &'a str {
    let blocks = code_blocks(text);

    let chosen = preferred
        .and_then(|lang| blocks.iter().find(|b| b.lang.eq_ignore_ascii_case(lang)))
        .or_else(|| blocks.first());

    match chosen {
        Some(block) => block.body.trim(),
        None => text,
    }
}
