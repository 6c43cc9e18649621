//! `ai-guardrails review`: turn CodeRabbit findings into a task list.

use crate::commands::helpers::read_input;
use crate::gh::{GhRunner, GitHub};
use anyhow::{Context, Result};
use guardrails_common::review::{self, ReviewInput, ReviewParseError, Severity, TaskReport};
use guardrails_common::threads::{CODERABBIT_LOGIN, thread_input};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct ReviewOptions {
    pub pr: Option<u64>,
    pub min_severity: Option<Severity>,
    pub pretty: bool,
    /// Pre-collected `ReviewInput` JSON; `-` reads stdin.
    pub input: Option<PathBuf>,
}

pub fn run<R: GhRunner>(gh: &GitHub<R>, options: &ReviewOptions) -> Result<u8> {
    let report = match &options.input {
        Some(path) => {
            let text = read_input(path)
                .map_err(ReviewParseError::from)
                .with_context(|| format!("Failed to read review input {}", path.display()))?;
            review::parse_input(text.as_bytes())?
        }
        None => review::process_input(&collect_input(gh, options.pr)?),
    };

    let report = match options.min_severity {
        Some(min) => review::filter_min_severity(report, min),
        None => report,
    };
    println!("{}", render(&report, options.pretty)?);
    Ok(0)
}

/// Gather unresolved CodeRabbit threads and review bodies for a PR.
///
/// Fetch failures only reduce what is collected.
pub fn collect_input<R: GhRunner>(gh: &GitHub<R>, pr: Option<u64>) -> Result<ReviewInput> {
    let pr = match pr {
        Some(pr) => pr,
        None => gh.current_pr_number()?,
    };
    let (owner, repo) = gh.repo_info()?;

    let threads: Vec<_> = gh
        .fetch_thread_nodes(&owner, &repo, pr)
        .iter()
        .filter_map(|node| thread_input(node, CODERABBIT_LOGIN))
        .collect();
    let review_bodies = gh.fetch_review_bodies(&owner, &repo, pr, CODERABBIT_LOGIN);
    if threads.is_empty() && review_bodies.is_empty() {
        warn!(pr, "No CodeRabbit threads or reviews found");
    }
    info!(
        pr,
        threads = threads.len(),
        reviews = review_bodies.len(),
        "Collected CodeRabbit review input"
    );

    Ok(ReviewInput { threads, review_bodies })
}

pub fn render(report: &TaskReport, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string(report)
    };
    json.context("Failed to serialize task report")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gh::testing::{ScriptedGh, thread_page};
    use guardrails_common::review::TaskSource;

    const REVIEW_BODY: &str = r#"**Actionable comments posted: 1**

<details>
<summary>🧹 Nitpick comments (1)</summary><blockquote>

<details>
<summary>src/app.py (1)</summary><blockquote>

`5-7`: **Rename helper for clarity.**

The name `f` is vague.

</blockquote></details>

</blockquote></details>"#;

    #[test]
    fn test_collect_input_keeps_coderabbit_threads_only() {
        let reviews = serde_json::json!([
            { "user": { "login": "coderabbitai[bot]" }, "body": REVIEW_BODY },
            { "user": { "login": "someone" }, "body": "nice" }
        ]);
        let gh = ScriptedGh::new()
            .ok("octo widgets")
            .ok(&thread_page(
                &[
                    ("T1", false, "coderabbitai[bot]", "_⚠️ Potential issue_ | _🟠 Major_\n\n**Handle None.**"),
                    ("T2", true, "coderabbitai[bot]", "**Old**"),
                    ("T3", false, "claude", "**Other bot**"),
                ],
                None,
            ))
            .ok(&reviews.to_string());

        let input = collect_input(&GitHub::new(&gh, 3), Some(4)).unwrap();
        assert_eq!(input.threads.len(), 1);
        assert_eq!(input.threads[0].id.as_deref(), Some("T1"));
        assert_eq!(input.review_bodies.len(), 1);

        let report = review::process_input(&input);
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.tasks[0].source, TaskSource::Thread);
        assert_eq!(report.tasks[0].severity, Severity::Major);
        assert_eq!(report.tasks[1].source, TaskSource::Nitpick);
        assert_eq!(report.tasks[1].line, 7);
        assert_eq!(report.tasks[1].start_line, Some(5));
        assert_eq!(report.tasks[1].id, "task-002");
    }

    #[test]
    fn test_collect_input_degrades_on_fetch_failures() {
        let gh = ScriptedGh::new().ok("octo widgets").fail("graphql down").fail("rest down");
        let input = collect_input(&GitHub::new(&gh, 3), Some(4)).unwrap();
        assert!(input.threads.is_empty());
        assert!(input.review_bodies.is_empty());
    }

    #[test]
    fn test_render_pretty_uses_two_space_indent() {
        let report = review::generate_output(Vec::new());
        let pretty = render(&report, true).unwrap();
        assert!(pretty.contains("\n  \"tasks\": []"));
        let compact = render(&report, false).unwrap();
        assert!(!compact.contains('\n'));
    }

    #[test]
    fn test_run_reads_input_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("review.json");
        std::fs::write(
            &path,
            r#"{"threads":[{"path":"a.rs","line":3,"body":"🟡 Minor\n\n**Tidy up**"}],"review_bodies":[]}"#,
        )
        .unwrap();

        let gh = ScriptedGh::new();
        let options = ReviewOptions {
            input: Some(path),
            min_severity: Some(Severity::Major),
            ..ReviewOptions::default()
        };
        assert_eq!(run(&GitHub::new(&gh, 1), &options).unwrap(), 0);
        assert!(gh.calls().is_empty());
    }

    #[test]
    fn test_run_rejects_invalid_input() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("review.json");
        std::fs::write(&path, "not json").unwrap();

        let gh = ScriptedGh::new();
        let options = ReviewOptions {
            input: Some(path),
            ..ReviewOptions::default()
        };
        let err = run(&GitHub::new(&gh, 1), &options).unwrap_err();
        assert!(err.downcast_ref::<ReviewParseError>().is_some());
    }
}
