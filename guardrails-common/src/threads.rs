//! Pull-request review threads from every review bot.
//!
//! Threads arrive as GraphQL `reviewThreads` nodes, get flattened into
//! [`ReviewThread`] records, and are filtered and rendered for the
//! `comments` command.

use crate::review::ThreadInput;
use crate::util::{clean_body, truncate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use unicode_width::UnicodeWidthStr;

/// Preview length kept on each thread at parse time.
pub const JSON_PREVIEW_LENGTH: usize = 120;

/// Preview length in the compact listing.
pub const COMPACT_PREVIEW_LENGTH: usize = 80;

/// Short alias accepted on the command line, and the GitHub login it stands for.
pub const BOT_ALIASES: [(&str, &str); 3] = [
    ("coderabbit", "coderabbitai"),
    ("claude", "claude"),
    ("pr-agent", "pr-agent"),
];

/// Login of the CodeRabbit bot (without the `[bot]` suffix).
pub const CODERABBIT_LOGIN: &str = "coderabbitai";

const UNKNOWN_AUTHOR: &str = "unknown";
const GITHUB_ACTIONS_LOGIN: &str = "github-actions";
const PR_AGENT_LOGIN: &str = "pr-agent";
const PR_AGENT_MARKERS: [&str; 4] = ["pr-agent", "qodo", "/review", "/improve"];

// ---------------------------------------------------------------------------
// GraphQL model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// One page of `pullRequest.reviewThreads`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadPage {
    #[serde(default)]
    pub nodes: Vec<ThreadNode>,
    #[serde(default)]
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadNode {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub is_resolved: bool,
    #[serde(default)]
    pub comments: CommentConnection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentConnection {
    #[serde(default)]
    pub total_count: Option<u32>,
    #[serde(default)]
    pub nodes: Vec<CommentNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub database_id: Option<u64>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub start_line: Option<u32>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub login: String,
}

impl CommentNode {
    /// Author login without the `[bot]` suffix; `unknown` for deleted accounts.
    pub fn author_login(&self) -> &str {
        match &self.author {
            Some(author) if !author.login.is_empty() => {
                author.login.strip_suffix("[bot]").unwrap_or(&author.login)
            }
            _ => UNKNOWN_AUTHOR,
        }
    }
}

// ---------------------------------------------------------------------------
// Flattened threads
// ---------------------------------------------------------------------------

/// A review thread reduced to what the `comments` command shows and acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewThread {
    pub thread_id: String,
    /// REST id of the first comment; replies attach to it.
    pub comment_id: Option<u64>,
    pub bot: String,
    pub path: String,
    pub line: Option<u32>,
    pub start_line: Option<u32>,
    pub resolved: bool,
    pub body_preview: String,
    pub created_at: String,
    pub reply_count: u32,
}

fn is_pr_agent_body(body: &str) -> bool {
    let lower = body.to_lowercase();
    PR_AGENT_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Flatten a GraphQL thread node. `None` when the thread has no comments.
pub fn parse_thread(node: &ThreadNode) -> Option<ReviewThread> {
    let first = node.comments.nodes.first()?;

    let mut bot = first.author_login().to_string();
    if bot == GITHUB_ACTIONS_LOGIN && is_pr_agent_body(&first.body) {
        bot = PR_AGENT_LOGIN.to_string();
    }

    let total = node
        .comments
        .total_count
        .unwrap_or(node.comments.nodes.len() as u32);

    Some(ReviewThread {
        thread_id: node.id.clone(),
        comment_id: first.database_id,
        bot,
        path: first.path.clone().unwrap_or_default(),
        line: first.line,
        start_line: first.start_line,
        resolved: node.is_resolved,
        body_preview: truncate(&clean_body(&first.body), JSON_PREVIEW_LENGTH),
        created_at: first.created_at.clone(),
        reply_count: total.saturating_sub(1),
    })
}

/// Parser input for an unresolved thread whose first comment is by `login`.
pub fn thread_input(node: &ThreadNode, login: &str) -> Option<ThreadInput> {
    if node.is_resolved {
        return None;
    }
    let first = node.comments.nodes.first()?;
    if !first.author_login().eq_ignore_ascii_case(login) {
        return None;
    }
    Some(ThreadInput {
        path: first.path.clone().unwrap_or_default(),
        line: first.line,
        start_line: first.start_line,
        body: first.body.clone(),
        id: Some(node.id.clone()),
    })
}

// ---------------------------------------------------------------------------
// Bot names and filtering
// ---------------------------------------------------------------------------

/// Resolve an alias or login (any case, `[bot]` suffix optional) to the login.
pub fn resolve_bot_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let lower = lower.strip_suffix("[bot]").unwrap_or(&lower);

    if let Some((_, login)) = BOT_ALIASES.iter().find(|(alias, _)| *alias == lower) {
        return (*login).to_string();
    }
    if let Some((_, login)) = BOT_ALIASES.iter().find(|(_, login)| login.eq_ignore_ascii_case(lower)) {
        return (*login).to_string();
    }
    lower.to_string()
}

/// Short alias for display, falling back to the login itself.
pub fn short_bot_name(login: &str) -> &str {
    BOT_ALIASES
        .iter()
        .find(|(_, full)| *full == login)
        .map(|(alias, _)| *alias)
        .unwrap_or(login)
}

/// Split `a,,b` into `["a", "b"]`.
pub fn parse_bot_filter(filter: &str) -> Vec<String> {
    filter
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Threads matching the bot filter (empty means any bot).
pub fn filter_threads(threads: &[ReviewThread], bots: &[String], unresolved_only: bool) -> Vec<ReviewThread> {
    let wanted: Vec<String> = bots.iter().map(|b| resolve_bot_name(b)).collect();
    threads
        .iter()
        .filter(|t| !unresolved_only || !t.resolved)
        .filter(|t| wanted.is_empty() || wanted.iter().any(|w| *w == t.bot))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThreadSummary {
    pub total: usize,
    pub unresolved: usize,
    pub by_bot: BTreeMap<String, usize>,
}

impl ThreadSummary {
    pub fn from_threads(threads: &[ReviewThread]) -> Self {
        let mut by_bot = BTreeMap::new();
        for thread in threads {
            *by_bot.entry(thread.bot.clone()).or_default() += 1;
        }
        Self {
            total: threads.len(),
            unresolved: threads.iter().filter(|t| !t.resolved).count(),
            by_bot,
        }
    }
}

fn location(thread: &ReviewThread) -> String {
    let name = match thread.path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => "?",
    };
    match thread.line {
        Some(line) => format!("{name}:{line}"),
        None => name.to_string(),
    }
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(fill))
}

/// One line per thread under a `# N unresolved | bot: n` header.
pub fn format_compact(threads: &[ReviewThread]) -> String {
    let summary = ThreadSummary::from_threads(threads);
    let mut header = format!("# {} unresolved", summary.unresolved);
    if !summary.by_bot.is_empty() {
        let counts: Vec<String> = summary
            .by_bot
            .iter()
            .map(|(bot, count)| format!("{}: {count}", short_bot_name(bot)))
            .collect();
        header.push_str(" | ");
        header.push_str(&counts.join(", "));
    }

    let rows: Vec<(&str, &str, String)> = threads
        .iter()
        .map(|t| (t.thread_id.as_str(), short_bot_name(&t.bot), location(t)))
        .collect();
    let bot_width = rows.iter().map(|(_, bot, _)| bot.width()).max().unwrap_or(0);
    let loc_width = rows.iter().map(|(_, _, loc)| loc.width()).max().unwrap_or(0);

    let mut lines = vec![header, String::new()];
    for (thread, (id, bot, loc)) in threads.iter().zip(&rows) {
        let preview = truncate(&thread.body_preview, COMPACT_PREVIEW_LENGTH);
        let resolved = if thread.resolved { " [resolved]" } else { "" };
        lines.push(format!(
            "{id}  {}  {}  {preview}{resolved}",
            pad(bot, bot_width),
            pad(loc, loc_width)
        ));
    }
    lines.join("\n")
}

#[derive(Serialize)]
struct ThreadListing<'a> {
    threads: &'a [ReviewThread],
    summary: ThreadSummary,
}

/// `{"threads": [...], "summary": {...}}`.
pub fn format_json(threads: &[ReviewThread], pretty: bool) -> serde_json::Result<String> {
    let listing = ThreadListing {
        threads,
        summary: ThreadSummary::from_threads(threads),
    };
    if pretty {
        serde_json::to_string_pretty(&listing)
    } else {
        serde_json::to_string(&listing)
    }
}
