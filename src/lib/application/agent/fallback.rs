//! Degraded mode for models that describe a tool call in prose instead of
//! emitting a structured one.
//!
//! Deliberately narrow: only a `read-items` naming a quoted collection is
//! recognised. Widen it only with evidence from real transcripts.

use once_cell::sync::Lazy;
use regex::Regex;

const MENTIONED_TOOLS: [&str; 3] = ["read-items", "create-item", "read-collections"];

static READ_ITEMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)read-items.*collection[:\s]*["'](\w+)["']"#)
        .expect("valid read-items pattern")
});

/// Whether `text` names one of the tools the fallback watches for.
pub fn mentions_tool(text: &str) -> bool {
    MENTIONED_TOOLS.iter().any(|tool| text.contains(tool))
}

/// Collection of a `read-items` call described in `text`.
pub fn manual_read_collection(text: &str) -> Option<String> {
    READ_ITEMS
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|collection| collection.as_str().to_string())
}
