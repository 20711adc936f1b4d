//! Small string and path helpers shared across stages.

use std::path::Path;

/// Truncate `content` to at most `max_chars` characters, appending a marker when cut.
///
/// Cuts on a char boundary, never inside a multi-byte sequence.
pub fn truncate_chars(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}... [truncated]", &content[..byte_idx]),
        None => content.to_string(),
    }
}

/// File name component of `path`, or `fallback` when there is none
pub fn file_name_or(path: &Path, fallback: &str) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_short_input_untouched() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_chars_cuts_on_char_boundary() {
        let out = truncate_chars("héllo wörld", 4);
        assert_eq!(out, "héll... [truncated]");
    }

    #[test]
    fn test_file_name_or() {
        assert_eq!(file_name_or(Path::new("/a/b/main.rs"), "x"), "main.rs");
        assert_eq!(file_name_or(Path::new("/"), "x"), "x");
    }
}
