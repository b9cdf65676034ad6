//! Post-processing: turn a recognizer's raw transcription into ordered lines.
//!
//! Vision models occasionally wrap their answer in code fences, emit CRLF
//! line endings or sprinkle zero-width characters into the text. None of
//! that belongs in the edit buffer. Rules run in order:
//!
//! 1. Strip outer code fences
//! 2. Normalise line endings (CRLF/CR → LF)
//! 3. Remove invisible Unicode (zero-width spaces, BOM, soft hyphens)
//! 4. Trim each line and drop blank lines
//!
//! Line order is preserved exactly as returned; nothing is re-sorted.

use once_cell::sync::Lazy;
use regex::Regex;

/// Split raw recognizer output into cleaned, non-empty lines.
pub fn recognized_lines(raw: &str) -> Vec<String> {
    let s = strip_code_fences(raw);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    s.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Clean the line list returned by any recognizer. An entry may hold
/// several lines, and blank entries are dropped.
pub fn clean_fragments<I, S>(fragments: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fragments
        .into_iter()
        .flat_map(|f| recognized_lines(f.as_ref()))
        .collect()
}

// ── Rule 1: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\n(.*)\n```\s*$").unwrap());

fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_code_fences("```text\nHello\nWorld\n```"), "Hello\nWorld");
        assert_eq!(strip_code_fences("```\nHello\n```"), "Hello");
    }

    #[test]
    fn test_no_fences_passthrough() {
        assert_eq!(strip_code_fences("Hello\nWorld"), "Hello\nWorld");
    }

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_remove_invisible() {
        let input = "hello\u{200B}world\u{FEFF}foo\u{00AD}bar";
        assert_eq!(remove_invisible_chars(input), "helloworldfoobar");
    }

    #[test]
    fn lines_keep_returned_order() {
        let lines = recognized_lines("Total: 42\nInvoice #7\r\n\n   Date   \n");
        assert_eq!(lines, vec!["Total: 42", "Invoice #7", "Date"]);
    }

    #[test]
    fn fenced_answer_is_unwrapped() {
        let lines = recognized_lines("```\nfirst\nsecond\n```");
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn empty_output_yields_no_lines() {
        assert!(recognized_lines("").is_empty());
        assert!(recognized_lines(" \n\u{200B}\n").is_empty());
    }

    #[test]
    fn fragments_are_split_and_cleaned() {
        let lines = clean_fragments(vec!["a\nb", "  ", "c"]);
        assert_eq!(lines, vec!["a", "b", "c"]);
    }
}
