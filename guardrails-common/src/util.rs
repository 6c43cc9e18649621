//! Text helpers shared by the review parser and thread formatting.

use regex::Regex;
use std::sync::LazyLock;

static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid HTML comment regex"));

// Only real tags: `<tag ...>`, `</tag>` and `<tag/>`. A bare `a < b > c` survives.
static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?[A-Za-z][A-Za-z0-9-]*(?:\s[^<>]*)?/?>").expect("valid HTML tag regex")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Remove every `<!-- ... -->` comment, including multi-line ones.
pub fn strip_html_comments(text: &str) -> String {
    HTML_COMMENT.replace_all(text, "").into_owned()
}

/// Flatten a markdown/HTML comment body into a single line of plain text.
pub fn clean_body(body: &str) -> String {
    let without_comments = strip_html_comments(body);
    let without_tags = HTML_TAG.replace_all(&without_comments, "");
    WHITESPACE.replace_all(&without_tags, " ").trim().to_string()
}

/// Truncate to at most `max_chars` characters, counting chars rather than bytes.
///
/// Long text keeps `max_chars - 3` characters plus `...`. Limits of three or
/// less have no room for the ellipsis and simply cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - 3).collect();
    out.push_str("...");
    out
}
