//! CodeRabbit review parsing.
//!
//! Tasks come from two independent sources:
//! - review threads (one inline comment per thread, fetched via GraphQL)
//! - review bodies, whose collapsible 🧹 nitpick, ⚠️ outside-diff and
//!   ♻️ duplicate sections list findings that never became threads
//!
//! Both are flattened into [`Task`] records, merged with thread priority,
//! numbered, and summarized into a [`TaskReport`].

mod body;
mod extract;
mod merge;

pub use body::{
    extract_file_blocks, extract_section_content, parse_body_item, parse_line_range,
    parse_review_body, strip_blockquote_prefixes,
};
pub use extract::{
    extract_ai_prompt, extract_description, extract_severity, extract_title, parse_thread,
    parse_threads,
};
pub use merge::{assign_ids, merge_tasks, normalize_title};

use crate::errors::ErrorCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Maximum characters kept from a finding's description.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Fallback title when a comment carries no bold text.
pub const UNTITLED: &str = "Untitled issue";

/// Review severity, most severe first.
///
/// The derived ordering follows declaration order, so `Critical < Suggestion`
/// and "at least as severe as X" is `severity <= X`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// 🔴
    Critical,
    /// 🟠
    Major,
    /// 🟡
    Minor,
    /// 🟢 and anything unmarked
    Suggestion,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::Major,
        Severity::Minor,
        Severity::Suggestion,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Suggestion => "suggestion",
        }
    }

    /// True when `self` is at least as severe as `min`.
    pub fn at_least(&self, min: Severity) -> bool {
        *self <= min
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Invalid severity '{s}' (expected one of: critical, major, minor, suggestion)"
                )
            })
    }
}

/// Where a task was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSource {
    Thread,
    Nitpick,
    OutsideDiff,
    Duplicate,
}

impl TaskSource {
    pub const ALL: [TaskSource; 4] = [
        TaskSource::Thread,
        TaskSource::Nitpick,
        TaskSource::OutsideDiff,
        TaskSource::Duplicate,
    ];
}

/// One actionable review finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// `task-001`, ... once ids are assigned; empty before that.
    pub id: String,
    pub file: String,
    pub line: u32,
    pub title: String,
    pub severity: Severity,
    pub source: TaskSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_prompt: Option<String>,
    /// GraphQL id of the originating thread, for thread-sourced tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl Task {
    pub fn new(
        file: impl Into<String>,
        line: u32,
        title: impl Into<String>,
        severity: Severity,
        source: TaskSource,
    ) -> Self {
        Self {
            id: String::new(),
            file: file.into(),
            line,
            title: title.into(),
            severity,
            source,
            start_line: None,
            description: None,
            ai_prompt: None,
            thread_id: None,
        }
    }
}

/// A single review-thread comment as fed to the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadInput {
    pub path: String,
    pub line: Option<u32>,
    #[serde(rename = "startLine")]
    pub start_line: Option<u32>,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Parser input: thread comments plus raw review bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewInput {
    pub threads: Vec<ThreadInput>,
    pub review_bodies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub total: usize,
    /// Every severity, zeros included, most severe first.
    pub by_severity: BTreeMap<Severity, usize>,
    /// Every source, zeros included.
    pub by_source: BTreeMap<TaskSource, usize>,
    pub by_file: BTreeMap<String, usize>,
}

impl TaskSummary {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut by_severity: BTreeMap<Severity, usize> =
            Severity::ALL.into_iter().map(|s| (s, 0)).collect();
        let mut by_source: BTreeMap<TaskSource, usize> =
            TaskSource::ALL.into_iter().map(|s| (s, 0)).collect();
        let mut by_file = BTreeMap::new();

        for task in tasks {
            *by_severity.entry(task.severity).or_default() += 1;
            *by_source.entry(task.source).or_default() += 1;
            *by_file.entry(task.file.clone()).or_default() += 1;
        }

        Self {
            total: tasks.len(),
            by_severity,
            by_source,
            by_file,
        }
    }
}

/// Final parser output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReport {
    pub tasks: Vec<Task>,
    pub summary: TaskSummary,
}

#[derive(Debug, Error)]
pub enum ReviewParseError {
    #[error("failed to read review input: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid review input JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReviewParseError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Io(_) => ErrorCode::ReviewInputRead,
            Self::Json(_) => ErrorCode::ReviewInputInvalid,
        }
    }
}

/// Build the report for an already ordered task list.
pub fn generate_output(tasks: Vec<Task>) -> TaskReport {
    let summary = TaskSummary::from_tasks(&tasks);
    TaskReport { tasks, summary }
}

/// Run the full pipeline over in-memory input.
pub fn process_input(input: &ReviewInput) -> TaskReport {
    let thread_tasks = parse_threads(&input.threads);
    let body_tasks: Vec<Task> = input
        .review_bodies
        .iter()
        .flat_map(|body| parse_review_body(body))
        .collect();

    debug!(
        threads = thread_tasks.len(),
        body_items = body_tasks.len(),
        "Parsed review sources"
    );

    let mut tasks = merge_tasks(thread_tasks, body_tasks);
    assign_ids(&mut tasks);
    generate_output(tasks)
}

/// Parse a JSON [`ReviewInput`] document and run the full pipeline.
pub fn parse_input<R: Read>(reader: R) -> Result<TaskReport, ReviewParseError> {
    let input: ReviewInput = serde_json::from_reader(reader)?;
    Ok(process_input(&input))
}

/// Keep tasks at least as severe as `min` and recompute the summary.
pub fn filter_min_severity(report: TaskReport, min: Severity) -> TaskReport {
    let tasks: Vec<Task> = report
        .tasks
        .into_iter()
        .filter(|task| task.severity.at_least(min))
        .collect();
    generate_output(tasks)
}
