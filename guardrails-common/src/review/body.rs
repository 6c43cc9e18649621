//! Review-body section parsing.
//!
//! A CodeRabbit review body nests its findings three levels deep:
//!
//! ```text
//! <details><summary>🧹 Nitpick comments (2)</summary><blockquote>
//!   <details><summary>src/app.py (2)</summary><blockquote>
//!     `10-20`: **Title**  description ... (one item per line range)
//!   </blockquote></details>
//! </blockquote></details>
//! ```
//!
//! Items may themselves contain `<details>` blocks (proposed fixes, AI
//! prompts), so plain regex matching cuts sections short. Block ends are
//! found by counting nested open and close tags instead.

use super::extract::{description_from, extract_ai_prompt};
use super::{Severity, Task, TaskSource};
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

/// Summary marker, task source and severity for each parsed section.
const SECTIONS: [(&str, TaskSource, Severity); 3] = [
    ("Nitpick comments", TaskSource::Nitpick, Severity::Suggestion),
    ("Outside diff range comments", TaskSource::OutsideDiff, Severity::Minor),
    ("Duplicate comments", TaskSource::Duplicate, Severity::Minor),
];

static BLOCKQUOTE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:[ \t]*>)+[ \t]?").expect("valid blockquote prefix regex")
});

static COUNT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(\d+\)\s*$").expect("valid count suffix regex"));

static BODY_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*`([^`]+)`\s*:\s*\*\*(.+?)\*\*(.*)$").expect("valid body item regex")
});

static ITEM_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*`\s*\d+\s*(?:-\s*\d+\s*)?`\s*:").expect("valid item start regex")
});

/// Remove markdown quote markers (`>`, `> >`, ...) from the start of every line.
pub fn strip_blockquote_prefixes(text: &str) -> String {
    BLOCKQUOTE_PREFIX.replace_all(text, "").into_owned()
}

/// Parse `` `40-50` `` or `42` into an inclusive `(start, end)` range.
pub fn parse_line_range(text: &str) -> Option<(u32, u32)> {
    let cleaned = text.trim().trim_matches('`').trim();
    match cleaned.split_once('-') {
        Some((start, end)) => Some((start.trim().parse().ok()?, end.trim().parse().ok()?)),
        None => {
            let line = cleaned.parse().ok()?;
            Some((line, line))
        }
    }
}

/// Byte offset of the next `<tag ...>` or `<tag>` opening at or after `from`.
fn find_open_tag(text: &str, tag: &str, from: usize) -> Option<usize> {
    let needle = format!("<{tag}");
    let mut pos = from;
    while let Some(rel) = text[pos..].find(&needle) {
        let start = pos + rel;
        let after = start + needle.len();
        match text[after..].chars().next() {
            Some(c) if c == '>' || c.is_whitespace() => return Some(start),
            _ => pos = after,
        }
    }
    None
}

/// End of the opening tag starting at `start` (offset just past its `>`).
fn open_tag_end(text: &str, start: usize) -> Option<usize> {
    text[start..].find('>').map(|rel| start + rel + 1)
}

/// Find the `</tag>` closing the element whose content starts at `content_start`.
///
/// Returns the offset of that closing tag, or `None` when the input is
/// unbalanced.
fn find_matching_close(text: &str, tag: &str, content_start: usize) -> Option<usize> {
    let close = format!("</{tag}>");
    let mut depth = 1usize;
    let mut pos = content_start;

    loop {
        let next_close = text[pos..].find(&close).map(|rel| pos + rel)?;
        match find_open_tag(text, tag, pos) {
            Some(open) if open < next_close => {
                depth += 1;
                pos = open_tag_end(text, open)?;
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Some(next_close);
                }
                pos = next_close + close.len();
            }
        }
    }
}

/// Content of the `<blockquote>` that immediately follows `from`, if any.
///
/// Returns the content and the offset just past the closing tag.
fn blockquote_after(text: &str, from: usize) -> Option<(&str, usize)> {
    let rest = &text[from..];
    let skipped = rest.len() - rest.trim_start().len();
    let start = from + skipped;
    if !text[start..].starts_with("<blockquote") {
        return None;
    }
    let content_start = open_tag_end(text, start)?;
    let close = find_matching_close(text, "blockquote", content_start)?;
    Some((&text[content_start..close], close + "</blockquote>".len()))
}

/// Content of the blockquote following the `<summary>` that contains `marker`.
pub fn extract_section_content(body: &str, marker: &str) -> Option<String> {
    let mut pos = 0;
    while let Some(start) = find_open_tag(body, "summary", pos) {
        let summary_start = open_tag_end(body, start)?;
        let summary_end = summary_start + body[summary_start..].find("</summary>")?;
        let after_summary = summary_end + "</summary>".len();

        if body[summary_start..summary_end].contains(marker) {
            match blockquote_after(body, after_summary) {
                Some((content, _)) => return Some(content.to_string()),
                None => trace!(marker, "Section summary without balanced blockquote"),
            }
        }
        pos = after_summary;
    }
    None
}

/// Top-level `<details>` blocks of a section as `(filename, content)` pairs.
pub fn extract_file_blocks(section: &str) -> Vec<(String, String)> {
    let mut blocks = Vec::new();
    let mut pos = 0;

    while let Some(start) = find_open_tag(section, "details", pos) {
        let Some(inner_start) = open_tag_end(section, start) else {
            break;
        };
        let Some(close) = find_matching_close(section, "details", inner_start) else {
            break;
        };
        let inner = &section[inner_start..close];
        pos = close + "</details>".len();

        let Some(summary_open) = find_open_tag(inner, "summary", 0) else {
            continue;
        };
        let Some(name_start) = open_tag_end(inner, summary_open) else {
            continue;
        };
        let Some(name_len) = inner[name_start..].find("</summary>") else {
            continue;
        };
        let name_end = name_start + name_len;
        let filename = COUNT_SUFFIX
            .replace(inner[name_start..name_end].trim(), "")
            .trim()
            .to_string();
        if filename.is_empty() {
            continue;
        }

        let after_summary = name_end + "</summary>".len();
        let content = match blockquote_after(inner, after_summary) {
            Some((content, _)) => content,
            None => &inner[after_summary..],
        };
        blocks.push((filename, content.to_string()));
    }

    blocks
}

/// Split a file block into items, one per leading `` `start-end`: `` marker.
fn split_items(content: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in content.lines() {
        if ITEM_START.is_match(line) {
            if let Some(lines) = current.take() {
                items.push(lines.join("\n"));
            }
            current = Some(vec![line]);
        } else if line.trim() == "---" {
            continue;
        } else if let Some(lines) = current.as_mut() {
            lines.push(line);
        }
    }
    if let Some(lines) = current {
        items.push(lines.join("\n"));
    }
    items
}

/// Parse one `` `start[-end]`: **title** description `` item.
pub fn parse_body_item(file: &str, item: &str, source: TaskSource, severity: Severity) -> Option<Task> {
    let caps = BODY_ITEM.captures(item)?;
    let (start, end) = parse_line_range(caps.get(1)?.as_str())?;
    let title = caps.get(2)?.as_str().trim();
    let rest = caps.get(3).map_or("", |m| m.as_str());

    let mut task = Task::new(file, end, title, severity, source);
    if start != end {
        task.start_line = Some(start);
    }
    task.description = description_from(rest);
    task.ai_prompt = extract_ai_prompt(rest);
    Some(task)
}

/// Every task listed in a review body's nitpick, outside-diff and duplicate sections.
pub fn parse_review_body(body: &str) -> Vec<Task> {
    let body = strip_blockquote_prefixes(body);
    let mut tasks = Vec::new();

    for (marker, source, severity) in SECTIONS {
        let Some(section) = extract_section_content(&body, marker) else {
            continue;
        };
        for (file, content) in extract_file_blocks(&section) {
            for item in split_items(&content) {
                match parse_body_item(&file, &item, source, severity) {
                    Some(task) => tasks.push(task),
                    None => trace!(file = %file, "Skipping unparsable review body item"),
                }
            }
        }
    }

    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strip_blockquote_prefixes() {
        assert_eq!(strip_blockquote_prefixes("> line 1\n> line 2"), "line 1\nline 2");
        assert_eq!(strip_blockquote_prefixes("> > nested\n> single"), "nested\nsingle");
        assert_eq!(strip_blockquote_prefixes(">\n>>deep"), "\ndeep");
        assert_eq!(strip_blockquote_prefixes("no prefix here"), "no prefix here");
        assert_eq!(strip_blockquote_prefixes("a > b"), "a > b");
    }

    #[test]
    fn test_parse_line_range() {
        assert_eq!(parse_line_range("40-50"), Some((40, 50)));
        assert_eq!(parse_line_range("42"), Some((42, 42)));
        assert_eq!(parse_line_range("`133-134`"), Some((133, 134)));
        assert_eq!(parse_line_range(" ` 7 - 9 ` "), Some((7, 9)));
        assert_eq!(parse_line_range("abc"), None);
        assert_eq!(parse_line_range("10-"), None);
        assert_eq!(parse_line_range(""), None);
    }

    #[test]
    fn test_extract_section_content() {
        let body = "
<details>
<summary>🧹 Nitpick comments (1)</summary><blockquote>
<details>
<summary>test.py (1)</summary><blockquote>
`10-20`: **Test issue**
Description here.
</blockquote></details>
</blockquote></details>
";
        let content = extract_section_content(body, "🧹").unwrap();
        assert!(content.contains("test.py"));
        assert!(content.contains("Test issue"));
        // nested blockquote is kept whole
        assert!(content.trim_end().ends_with("</blockquote></details>"));
        assert!(extract_section_content("No sections here", "🧹").is_none());
    }

    #[test]
    fn test_extract_section_content_unbalanced() {
        let body = "<details><summary>🧹 Nitpick comments (1)</summary><blockquote>\n<blockquote>\nunterminated\n</blockquote>";
        assert!(extract_section_content(body, "🧹").is_none());
    }

    #[test]
    fn test_extract_file_blocks() {
        let section = "
<details>
<summary>file1.py (1)</summary><blockquote>
`10-20`: **Issue 1**
</blockquote></details>
<details>
<summary>src/file2.py (12)</summary><blockquote>
`30-40`: **Issue 2**
</blockquote></details>
";
        let blocks = extract_file_blocks(section);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].0, "file1.py");
        assert!(blocks[0].1.contains("Issue 1"));
        assert_eq!(blocks[1].0, "src/file2.py");
    }

    #[test]
    fn test_extract_file_blocks_keeps_nested_details() {
        let section = "
<details>
<summary>app.py (1)</summary><blockquote>
`5`: **Use a context manager**

<details>
<summary>Proposed fix</summary>

```diff
-f = open(p)
+with open(p) as f:
```
</details>

</blockquote></details>
";
        let blocks = extract_file_blocks(section);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].1.contains("Proposed fix"));
        assert!(blocks[0].1.contains("with open(p)"));
    }

    #[test]
    fn test_parse_body_item() {
        let task = parse_body_item(
            "test.py",
            "`10-20`: **Fix the bug**\n\nDescription here.",
            TaskSource::Nitpick,
            Severity::Suggestion,
        )
        .unwrap();
        assert_eq!(task.file, "test.py");
        assert_eq!(task.line, 20);
        assert_eq!(task.start_line, Some(10));
        assert_eq!(task.title, "Fix the bug");
        assert_eq!(task.source, TaskSource::Nitpick);
        assert_eq!(task.description.as_deref(), Some("Description here."));

        let single = parse_body_item("test.py", "`42`: **Single line issue**", TaskSource::OutsideDiff, Severity::Minor)
            .unwrap();
        assert_eq!(single.line, 42);
        assert!(single.start_line.is_none());
        assert!(single.description.is_none());

        assert!(parse_body_item("test.py", "No backticks or bold", TaskSource::Nitpick, Severity::Suggestion).is_none());
    }

    #[test]
    fn test_parse_body_item_with_prompt() {
        let item = "`3-4`: **Rename variable**\n\nShort names hurt.\n\n<details><summary>🤖 Prompt for AI Agents</summary>\n\n```\nRename x to count.\n```\n</details>";
        let task = parse_body_item("a.rs", item, TaskSource::Nitpick, Severity::Suggestion).unwrap();
        assert_eq!(task.description.as_deref(), Some("Short names hurt."));
        assert_eq!(task.ai_prompt.as_deref(), Some("Rename x to count."));
    }

    #[test]
    fn test_parse_nitpicks() {
        let body = "
<details>
<summary>🧹 Nitpick comments (2)</summary><blockquote>
<details>
<summary>test.py (2)</summary><blockquote>

`10-20`: **First issue**

Description 1.

---

`30-40`: **Second issue**

Description 2.

</blockquote></details>
</blockquote></details>
";
        let tasks = parse_review_body(body);
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.source == TaskSource::Nitpick));
        assert!(tasks.iter().all(|t| t.severity == Severity::Suggestion));
        assert_eq!(tasks[0].description.as_deref(), Some("Description 1."));
        assert_eq!(tasks[1].line, 40);
    }

    #[test]
    fn test_parse_outside_diff_with_blockquote_prefixes() {
        let body = "
> <details>
> <summary>⚠️ Outside diff range comments (1)</summary><blockquote>
> <details>
> <summary>old_file.py (1)</summary><blockquote>
>
> `100-110`: **Legacy issue**
>
> This is outside the diff.
>
> </blockquote></details>
> </blockquote></details>
";
        let tasks = parse_review_body(body);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].source, TaskSource::OutsideDiff);
        assert_eq!(tasks[0].severity, Severity::Minor);
        assert_eq!(tasks[0].file, "old_file.py");
        assert_eq!(tasks[0].start_line, Some(100));
    }

    #[test]
    fn test_parse_all_sections() {
        let body = "**Actionable comments posted: 0**

<details>
<summary>⚠️ Outside diff range comments (1)</summary><blockquote>
<details>
<summary>a.py (1)</summary><blockquote>
`1`: **Outside**
</blockquote></details>
</blockquote></details>
<details>
<summary>♻️ Duplicate comments (1)</summary><blockquote>
<details>
<summary>b.py (1)</summary><blockquote>
`2-3`: **Repeated**
</blockquote></details>
</blockquote></details>
<details>
<summary>🧹 Nitpick comments (1)</summary><blockquote>
<details>
<summary>c.py (1)</summary><blockquote>
`4`: **Nit**
</blockquote></details>
</blockquote></details>
";
        let tasks = parse_review_body(body);
        let sources: Vec<TaskSource> = tasks.iter().map(|t| t.source).collect();
        assert_eq!(
            sources,
            vec![TaskSource::Nitpick, TaskSource::OutsideDiff, TaskSource::Duplicate]
        );
        assert_eq!(tasks[2].file, "b.py");
        assert_eq!(tasks[2].severity, Severity::Minor);
    }

    #[test]
    fn test_parse_review_body_without_sections() {
        assert!(parse_review_body("LGTM! 🎉").is_empty());
        assert!(parse_review_body("").is_empty());
    }

    proptest! {
        #[test]
        fn parse_review_body_never_panics(s in "(<details>|</details>|<summary>|</summary>|<blockquote>|</blockquote>|🧹 Nitpick comments|`1-2`: \\*\\*t\\*\\*|> |\n|x){0,40}") {
            let _ = parse_review_body(&s);
        }

        #[test]
        fn parse_line_range_roundtrips(a in 0u32..100_000, b in 0u32..100_000) {
            prop_assert_eq!(parse_line_range(&format!("`{a}-{b}`")), Some((a, b)));
        }
    }
}
