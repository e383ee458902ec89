//! Text helpers shared by the parser, summarizer, and renderers.
//!
//! Handles Unicode normalization of input, inline-markup stripping,
//! line-limited word wrapping, and file-name sanitizing.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// `**bold**`
static BOLD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());

/// `*italic*`
static ITALIC_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*]+)\*").unwrap());

/// `` `code` ``
static CODE_SPAN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());

/// Longest stem kept in generated file names, in characters.
const MAX_FILE_STEM_CHARS: usize = 50;

/// Marker appended to shortened text.
pub const ELLIPSIS: &str = "...";

/// Normalize text to NFC.
///
/// Documents saved on some file systems carry decomposed Hangul, which
/// would otherwise never match composed keywords.
pub fn normalize_nfc(text: &str) -> String {
    text.nfc().collect()
}

/// Remove bold and italic markers, keeping code spans as written.
pub fn strip_emphasis(text: &str) -> String {
    let text = BOLD_REGEX.replace_all(text, "$1");
    ITALIC_REGEX.replace_all(&text, "$1").into_owned()
}

/// Remove bold, italic, and code-span markers, keeping their inner text.
pub fn strip_inline_markup(text: &str) -> String {
    CODE_SPAN_REGEX.replace_all(&strip_emphasis(text), "$1").into_owned()
}

/// Count characters rather than bytes.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Keep the first `max_chars` characters.
pub fn take_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Shorten `text` to at most `max_chars` characters, ending in `...` when cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    format!("{}{}", take_chars(text, keep), ELLIPSIS)
}

/// Greedily pack words into at most `max_lines` lines of `chars_per_line`.
///
/// Once the line cap is hit the pending partial line is discarded, and
/// `...` is appended to the last line iff some words did not fit.
pub fn limit_text_lines(text: &str, chars_per_line: usize, max_lines: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in &words {
        if char_len(&current) + char_len(word) + 1 <= chars_per_line {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = (*word).to_string();
            if lines.len() >= max_lines {
                break;
            }
        }
    }

    if !current.is_empty() && lines.len() < max_lines {
        lines.push(current);
    }

    let mut result = lines.join("\n");
    let used: usize = lines.iter().map(|l| l.split_whitespace().count()).sum();
    if lines.len() >= max_lines && words.len() > used {
        result = format!("{}{}", result.trim_end(), ELLIPSIS);
    }
    result
}

/// Reduce a slide title to its base form.
///
/// `"Plan (2)"` and `"Plan - 주요 내용"` both become `"Plan"`.
pub fn base_title(title: &str) -> &str {
    let title = title.split(" (").next().unwrap_or(title);
    title.split(" - ").next().unwrap_or(title)
}

/// Turn a document title into a safe file stem.
///
/// Keeps alphanumerics (any script), spaces, `-`, and `_`.
pub fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let stem = take_chars(kept.trim(), MAX_FILE_STEM_CHARS);
    let stem = stem.trim_end();
    if stem.is_empty() {
        "presentation".to_string()
    } else {
        stem.to_string()
    }
}

/// File name for a generated deck: `<sanitized title>_<suffix>.pptx`.
pub fn output_file_name(title: &str, suffix: &str) -> String {
    format!("{}_{}.pptx", sanitize_title(title), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_inline_markup() {
        assert_eq!(strip_inline_markup("**bold** and *it* and `code`"), "bold and it and code");
        assert_eq!(strip_inline_markup("plain"), "plain");
    }

    #[test]
    fn test_strip_emphasis_keeps_code_spans() {
        assert_eq!(strip_emphasis("**bold** and *it* and `code`"), "bold and it and `code`");
        assert_eq!(strip_emphasis("2 * 3"), "2 * 3");
    }

    #[test]
    fn test_normalize_nfc_composes_hangul() {
        let decomposed = "\u{1100}\u{1161}"; // ᄀ + ᅡ
        assert_eq!(normalize_nfc(decomposed), "가");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdefghijkl", 10), "abcdefg...");
        assert_eq!(char_len(&truncate_text(&"가".repeat(30), 25)), 25);
    }

    #[test]
    fn test_limit_text_lines_fits() {
        assert_eq!(limit_text_lines("one two three", 35, 2), "one two three");
    }

    #[test]
    fn test_limit_text_lines_wraps() {
        assert_eq!(limit_text_lines("aaaa bbbb cccc", 10, 2), "aaaa bbbb\ncccc");
    }

    #[test]
    fn test_limit_text_lines_caps_and_marks_overflow() {
        let text = "aaaa bbbb cccc dddd eeee ffff";
        let out = limit_text_lines(text, 10, 2);
        assert_eq!(out, "aaaa bbbb\ncccc dddd...");
        assert!(out.lines().count() <= 2);
    }

    #[test]
    fn test_limit_text_lines_no_ellipsis_when_everything_fits() {
        let out = limit_text_lines("aaaa bbbb cccc dddd", 10, 2);
        assert_eq!(out, "aaaa bbbb\ncccc dddd");
    }

    #[test]
    fn test_limit_text_lines_empty() {
        assert_eq!(limit_text_lines("", 35, 2), "");
    }

    #[test]
    fn test_base_title() {
        assert_eq!(base_title("Plan (2)"), "Plan");
        assert_eq!(base_title("Plan - 주요 내용"), "Plan");
        assert_eq!(base_title("Plan"), "Plan");
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("Q3 Report: Budget/Plan!"), "Q3 Report BudgetPlan");
        assert_eq!(sanitize_title("사업 계획서"), "사업 계획서");
        assert_eq!(sanitize_title("???"), "presentation");
        assert_eq!(char_len(&sanitize_title(&"a".repeat(80))), 50);
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("Report", "1a2b3c4d"), "Report_1a2b3c4d.pptx");
    }
}
