//! JSON list extraction from free-form model output
//!
//! Used for file selection, where the model is asked for a bare JSON list but
//! may fence it or talk around it. Never fails: unrecoverable text yields an
//! empty list.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static FENCED_LIST: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\[.*?\])\s*```").ok());

/// Recover a JSON list from `text`.
///
/// 1. A fenced code block (language tag optional) whose body is a list.
/// 2. Only when no fence exists: the span from the first `[` to the last `]`.
/// 3. Otherwise an empty list.
pub fn extract_json_list(text: &str) -> Vec<Value> {
    let fenced = FENCED_LIST
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1));

    let candidate = match fenced {
        Some(body) => Some(body.as_str()),
        None => bracket_span(text),
    };

    candidate
        .and_then(|span| serde_json::from_str::<Value>(span).ok())
        .and_then(|value| match value {
            Value::Array(items) => Some(items),
            _ => None,
        })
        .unwrap_or_default()
}

fn bracket_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}
