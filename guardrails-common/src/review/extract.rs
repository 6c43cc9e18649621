//! Field extraction from a single CodeRabbit comment body.

use super::{MAX_DESCRIPTION_CHARS, Severity, Task, TaskSource, ThreadInput, UNTITLED};
use crate::util::{strip_html_comments, truncate};
use regex::Regex;
use std::sync::LazyLock;

// A single bold span alone on its line: "**Fix the bug**". The span may not
// contain "**", so "**Fix** the **bug**" is left to the inline fallback.
static OWN_LINE_BOLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*\*\*((?:[^*\n]|\*[^*\n])+?)\*\*[ \t]*$").expect("valid own-line bold regex")
});

static INLINE_BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid inline bold regex"));

static AI_PROMPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<details>\s*<summary>[^<]*prompt for ai agents[^<]*</summary>(.*?)</details>")
        .expect("valid AI prompt regex")
});

// Opening fence may carry a language tag.
static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[^\n]*\n(.*?)```").expect("valid code fence regex"));

/// Severity from the first line of a comment.
pub fn extract_severity(body: &str) -> Severity {
    let first = body.lines().next().unwrap_or("");
    if first.contains('🔴') || first.contains("Critical") {
        Severity::Critical
    } else if first.contains('🟠') || first.contains("Major") {
        Severity::Major
    } else if first.contains('🟡') || first.contains("Minor") {
        Severity::Minor
    } else {
        Severity::Suggestion
    }
}

/// Locate the title and the byte offset just past it.
fn find_title(body: &str) -> Option<(String, usize)> {
    let caps = OWN_LINE_BOLD
        .captures(body)
        .or_else(|| INLINE_BOLD.captures(body))?;
    let whole = caps.get(0)?;
    let title = caps.get(1)?.as_str().trim();
    if title.is_empty() {
        return None;
    }
    Some((title.to_string(), whole.end()))
}

/// Title of a comment: bold text on its own line, else the first inline bold.
pub fn extract_title(body: &str) -> String {
    find_title(body)
        .map(|(title, _)| title)
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Contents of the code fence under a "Prompt for AI Agents" summary.
pub fn extract_ai_prompt(body: &str) -> Option<String> {
    let block = AI_PROMPT_BLOCK.captures(body)?.get(1)?.as_str();
    let prompt = CODE_FENCE.captures(block)?.get(1)?.as_str().trim();
    (!prompt.is_empty()).then(|| prompt.to_string())
}

/// Free text following a title, up to the first `<details>` block.
pub(super) fn description_from(rest: &str) -> Option<String> {
    let end = rest.find("<details").unwrap_or(rest.len());
    let text = strip_html_comments(&rest[..end]);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(truncate(text, MAX_DESCRIPTION_CHARS))
}

/// Text between the title line and the first `<details>` block.
pub fn extract_description(body: &str) -> Option<String> {
    let (_, title_end) = find_title(body)?;
    description_from(&body[title_end..])
}

/// Convert one thread comment into a task.
///
/// Returns `None` when the body, path or line is missing.
pub fn parse_thread(input: &ThreadInput) -> Option<Task> {
    if input.body.trim().is_empty() || input.path.trim().is_empty() {
        return None;
    }
    let line = input.line?;

    let mut task = Task::new(
        input.path.clone(),
        line,
        extract_title(&input.body),
        extract_severity(&input.body),
        TaskSource::Thread,
    );
    task.start_line = input.start_line;
    task.description = extract_description(&input.body);
    task.ai_prompt = extract_ai_prompt(&input.body);
    task.thread_id = input.id.clone();
    Some(task)
}

/// Every valid thread task, in input order.
pub fn parse_threads(threads: &[ThreadInput]) -> Vec<Task> {
    threads.iter().filter_map(parse_thread).collect()
}
