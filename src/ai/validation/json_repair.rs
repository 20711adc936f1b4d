//! JSON Repair for structured model output
//!
//! Models asked for a JSON object frequently wrap it in a code fence, add a
//! sentence of commentary, leave a trailing comma or stop mid-object. The
//! repairer undoes those in escalating passes and gives up with a
//! `DocError::Parse` when nothing yields valid JSON.

use serde_json::{Map, Value};
use tracing::debug;

use crate::types::{DocError, Result};

/// Parse the first JSON object found in `text`, repairing common damage.
///
/// Returns `None` when no object can be recovered or the recovered value is
/// not an object.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    match JsonRepairer::new().parse_or_repair(text) {
        Ok((Value::Object(map), _)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            debug!("No JSON object recovered: {}", e);
            None
        }
    }
}

/// Escalating repair passes, mildest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RepairPass {
    /// Trailing commas and unclosed brackets
    Structural,
    /// Plus strings cut off at a line break
    Strings,
    /// Plus control characters and trailing garbage
    Aggressive,
}

impl RepairPass {
    const ALL: [RepairPass; 3] = [Self::Structural, Self::Strings, Self::Aggressive];
}

/// Parser that retries with repairs before giving up
#[derive(Debug, Default)]
pub struct JsonRepairer;

impl JsonRepairer {
    pub fn new() -> Self {
        Self
    }

    /// Parse `raw`, returning the value and whether any repair was needed
    pub fn parse_or_repair(&self, raw: &str) -> Result<(Value, bool)> {
        let cleaned = strip_fences(raw.trim().trim_start_matches('\u{feff}'));

        if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
            return Ok((value, false));
        }

        // Commentary around the payload is the most common failure, so cut it
        // away before trying the heavier passes.
        let candidate = embedded_span(&cleaned).unwrap_or(cleaned.as_str());
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            debug!("JSON recovered from surrounding text");
            return Ok((value, true));
        }

        for pass in RepairPass::ALL {
            let repaired = apply(candidate, pass);
            if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
                debug!(?pass, "JSON repaired");
                return Ok((value, true));
            }
        }

        Err(DocError::parse(
            "model response",
            format!(
                "no valid JSON after {} repair passes: {}...",
                RepairPass::ALL.len(),
                cleaned.chars().take(120).collect::<String>()
            ),
        ))
    }
}

fn apply(s: &str, pass: RepairPass) -> String {
    let mut out = drop_trailing_commas(s);
    if matches!(pass, RepairPass::Strings | RepairPass::Aggressive) {
        out = close_broken_strings(&out);
    }
    if pass == RepairPass::Aggressive {
        out = out
            .chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
            .collect();
    }
    out = close_open_brackets(&out);
    if pass == RepairPass::Aggressive {
        out = cut_after_last_complete(&out).to_string();
    }
    out
}

/// Remove a surrounding ``` fence (with or without a language tag)
fn strip_fences(s: &str) -> String {
    let mut body = s;
    if body.starts_with("```") {
        body = match body.find('\n') {
            Some(newline) => &body[newline + 1..],
            None => body.trim_start_matches('`'),
        };
    }
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
        .to_string()
}

/// Walks characters while tracking whether the cursor is inside a string literal
#[derive(Default)]
struct Lexer {
    in_string: bool,
    escaped: bool,
}

impl Lexer {
    /// Feed one char; returns true when it is structural (outside any string)
    fn step(&mut self, ch: char) -> bool {
        if self.escaped {
            self.escaped = false;
            return false;
        }
        match ch {
            '\\' if self.in_string => {
                self.escaped = true;
                false
            }
            '"' => {
                self.in_string = !self.in_string;
                false
            }
            _ => !self.in_string,
        }
    }
}

fn drop_trailing_commas(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut lexer = Lexer::default();

    for (i, &ch) in chars.iter().enumerate() {
        if lexer.step(ch) && ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some(']') | Some('}')) {
                continue;
            }
        }
        out.push(ch);
    }
    out
}

/// Close a string left open at a line break or at end of input
fn close_broken_strings(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut lexer = Lexer::default();

    for ch in s.chars() {
        if lexer.in_string && !lexer.escaped && matches!(ch, '\n' | '\r') {
            out.push('"');
            lexer.in_string = false;
        }
        lexer.step(ch);
        out.push(ch);
    }
    if lexer.in_string {
        out.push('"');
    }
    out
}

/// Append the closers for every bracket still open, innermost first
fn close_open_brackets(s: &str) -> String {
    let mut stack = Vec::new();
    let mut lexer = Lexer::default();

    for ch in s.chars() {
        if !lexer.step(ch) {
            continue;
        }
        match ch {
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                stack.pop();
            }
            _ => {}
        }
    }

    let mut out = s.to_string();
    if lexer.in_string {
        out.push('"');
    }
    out.extend(stack.into_iter().rev());
    out
}

/// Trim anything following the last top-level value that closes cleanly
fn cut_after_last_complete(s: &str) -> &str {
    let mut depth = 0i32;
    let mut last = None;
    let mut lexer = Lexer::default();

    for (i, ch) in s.char_indices() {
        if !lexer.step(ch) {
            continue;
        }
        match ch {
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth -= 1;
                if depth == 0 {
                    last = Some(i + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    last.map(|end| &s[..end]).unwrap_or(s)
}

/// The first balanced `{...}` or `[...]` span embedded in prose
fn embedded_span(s: &str) -> Option<&str> {
    let start = s.find(['{', '['])?;
    let mut depth = 0i32;
    let mut lexer = Lexer::default();

    for (i, ch) in s[start..].char_indices() {
        if !lexer.step(ch) {
            continue;
        }
        match ch {
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    // Unbalanced: hand the tail to the bracket-closing passes
    Some(&s[start..])
}
