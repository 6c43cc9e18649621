//! GitHub access through the `gh` CLI.
//!
//! Every call shells out to `gh`; the [`GhRunner`] seam lets tests script
//! responses without a network or an authenticated CLI.

use guardrails_common::ErrorCode;
use guardrails_common::threads::{ThreadNode, ThreadPage};
use serde::Deserialize;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, warn};

const THREADS_QUERY: &str = r#"query($owner: String!, $repo: String!, $pr: Int!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    pullRequest(number: $pr) {
      reviewThreads(first: 100, after: $cursor) {
        pageInfo { hasNextPage endCursor }
        nodes {
          id
          isResolved
          comments(first: 5) {
            totalCount
            nodes {
              id
              databaseId
              author { login }
              body
              path
              line
              startLine
              createdAt
            }
          }
        }
      }
    }
  }
}"#;

const RESOLVE_MUTATION: &str = r#"mutation($threadId: ID!) {
  resolveReviewThread(input: {threadId: $threadId}) {
    thread { isResolved }
  }
}"#;

const THREADS_JQ: &str = ".data.repository.pullRequest.reviewThreads";

#[derive(Debug, Error)]
pub enum GhError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No PR found for current branch. Use --pr NUMBER")]
    NoPullRequest,

    #[error("gh returned an unexpected PR number: {0:?}")]
    UnexpectedPrNumber(String),

    #[error("Could not determine repository info")]
    RepoInfoUnavailable,

    #[error("gh returned unexpected repository info: {0:?}")]
    UnexpectedRepoInfo(String),
}

impl GhError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Spawn { .. } => ErrorCode::GhNotFound,
            Self::NoPullRequest | Self::UnexpectedPrNumber(_) => ErrorCode::NoPullRequest,
            Self::RepoInfoUnavailable | Self::UnexpectedRepoInfo(_) => ErrorCode::RepoInfoUnavailable,
        }
    }
}

/// Captured result of one `gh` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GhOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

pub trait GhRunner {
    fn run(&self, args: &[String]) -> Result<GhOutput, GhError>;
}

/// Runs the real `gh` binary (or whatever `gh_bin` names).
pub struct SystemGh {
    program: String,
}

impl SystemGh {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl GhRunner for SystemGh {
    fn run(&self, args: &[String]) -> Result<GhOutput, GhError> {
        debug!(program = %self.program, ?args, "Running gh");
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| GhError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        Ok(GhOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RestReview {
    #[serde(default)]
    user: Option<RestUser>,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RestUser {
    #[serde(default)]
    login: String,
}

fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|s| (*s).to_string()).collect()
}

/// High-level GitHub operations on top of a [`GhRunner`].
pub struct GitHub<R: GhRunner> {
    runner: R,
    max_thread_pages: u32,
}

impl<R: GhRunner> GitHub<R> {
    pub fn new(runner: R, max_thread_pages: u32) -> Self {
        Self {
            runner,
            max_thread_pages: max_thread_pages.max(1),
        }
    }

    /// PR number associated with the current branch.
    pub fn current_pr_number(&self) -> Result<u64, GhError> {
        let output = self
            .runner
            .run(&args(["pr", "view", "--json", "number", "--jq", ".number"]))?;
        let text = output.stdout.trim();
        if !output.success || text.is_empty() {
            return Err(GhError::NoPullRequest);
        }
        text.parse()
            .map_err(|_| GhError::UnexpectedPrNumber(text.to_string()))
    }

    /// `(owner, repo)` of the current repository.
    pub fn repo_info(&self) -> Result<(String, String), GhError> {
        let output = self.runner.run(&args([
            "repo",
            "view",
            "--json",
            "owner,name",
            "--jq",
            r#""\(.owner.login) \(.name)""#,
        ]))?;
        if !output.success {
            return Err(GhError::RepoInfoUnavailable);
        }
        let text = output.stdout.trim();
        match text.split_whitespace().collect::<Vec<_>>().as_slice() {
            [owner, repo] => Ok(((*owner).to_string(), (*repo).to_string())),
            _ => Err(GhError::UnexpectedRepoInfo(text.to_string())),
        }
    }

    fn fetch_thread_page(&self, owner: &str, repo: &str, pr: u64, cursor: Option<&str>) -> Option<ThreadPage> {
        let mut call = vec![
            "api".to_string(),
            "graphql".to_string(),
            "-f".to_string(),
            format!("query={THREADS_QUERY}"),
            "-f".to_string(),
            format!("owner={owner}"),
            "-f".to_string(),
            format!("repo={repo}"),
            "-F".to_string(),
            format!("pr={pr}"),
        ];
        if let Some(cursor) = cursor {
            call.push("-f".to_string());
            call.push(format!("cursor={cursor}"));
        }
        call.push("--jq".to_string());
        call.push(THREADS_JQ.to_string());

        let output = match self.runner.run(&call) {
            Ok(output) if output.success => output,
            Ok(output) => {
                warn!(
                    code = %ErrorCode::GhCommandFailed.code_string(),
                    stderr = %output.stderr.trim(),
                    "Failed to fetch review threads via GraphQL"
                );
                return None;
            }
            Err(e) => {
                warn!("Failed to fetch review threads via GraphQL: {e}");
                return None;
            }
        };

        match serde_json::from_str(output.stdout.trim()) {
            Ok(page) => Some(page),
            Err(e) => {
                warn!("Invalid JSON from GraphQL response: {e}");
                None
            }
        }
    }

    /// All review threads of a PR, following pagination up to the page cap.
    ///
    /// A failed page ends the walk; threads gathered so far are kept.
    pub fn fetch_thread_nodes(&self, owner: &str, repo: &str, pr: u64) -> Vec<ThreadNode> {
        let mut nodes = Vec::new();
        let mut cursor: Option<String> = None;

        for page_number in 1..=self.max_thread_pages {
            let Some(page) = self.fetch_thread_page(owner, repo, pr, cursor.as_deref()) else {
                return nodes;
            };
            debug!(page = page_number, threads = page.nodes.len(), "Fetched review thread page");
            nodes.extend(page.nodes);

            match page.page_info.end_cursor {
                Some(next) if page.page_info.has_next_page => cursor = Some(next),
                _ => return nodes,
            }
        }

        warn!(
            pages = self.max_thread_pages,
            "Stopped fetching review threads at the page limit"
        );
        nodes
    }

    /// Non-empty review bodies authored by `login` (with or without `[bot]`).
    pub fn fetch_review_bodies(&self, owner: &str, repo: &str, pr: u64, login: &str) -> Vec<String> {
        let endpoint = format!("repos/{owner}/{repo}/pulls/{pr}/reviews");
        let output = match self.runner.run(&args(["api", endpoint.as_str(), "--paginate"])) {
            Ok(output) if output.success => output,
            Ok(output) => {
                warn!(
                    code = %ErrorCode::GhCommandFailed.code_string(),
                    stderr = %output.stderr.trim(),
                    "Failed to fetch PR reviews"
                );
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to fetch PR reviews: {e}");
                return Vec::new();
            }
        };

        // --paginate concatenates one JSON array per page.
        let mut bodies = Vec::new();
        for page in serde_json::Deserializer::from_str(&output.stdout).into_iter::<Vec<RestReview>>() {
            let reviews = match page {
                Ok(reviews) => reviews,
                Err(e) => {
                    warn!("Invalid JSON from reviews API: {e}");
                    break;
                }
            };
            for review in reviews {
                let author = review.user.map(|u| u.login).unwrap_or_default();
                let author = author.strip_suffix("[bot]").unwrap_or(&author);
                if !author.eq_ignore_ascii_case(login) {
                    continue;
                }
                if let Some(body) = review.body.filter(|b| !b.trim().is_empty()) {
                    bodies.push(body);
                }
            }
        }
        bodies
    }

    pub fn reply_to_comment(&self, owner: &str, repo: &str, pr: u64, comment_id: u64, body: &str) -> bool {
        let endpoint = format!("repos/{owner}/{repo}/pulls/{pr}/comments/{comment_id}/replies");
        let body_arg = format!("body={body}");
        match self.runner.run(&args(["api", endpoint.as_str(), "-f", body_arg.as_str()])) {
            Ok(output) if output.success => true,
            Ok(output) => {
                warn!(
                    code = %ErrorCode::GhCommandFailed.code_string(),
                    comment_id,
                    stderr = %output.stderr.trim(),
                    "Failed to reply to comment"
                );
                false
            }
            Err(e) => {
                warn!(comment_id, "Failed to reply to comment: {e}");
                false
            }
        }
    }

    pub fn resolve_thread(&self, thread_id: &str) -> bool {
        let query = format!("query={RESOLVE_MUTATION}");
        let thread = format!("threadId={thread_id}");
        match self.runner.run(&args(["api", "graphql", "-f", query.as_str(), "-f", thread.as_str()])) {
            Ok(output) if output.success => true,
            Ok(output) => {
                warn!(
                    code = %ErrorCode::GhCommandFailed.code_string(),
                    thread_id,
                    stderr = %output.stderr.trim(),
                    "Failed to resolve thread"
                );
                false
            }
            Err(e) => {
                warn!(thread_id, "Failed to resolve thread: {e}");
                false
            }
        }
    }
}
