//! `ai-guardrails comments`: list, reply to, and resolve PR review threads.

use super::CommandError;
use crate::gh::{GhRunner, GitHub};
use anyhow::{Context, Result};
use guardrails_common::threads::{self, ReviewThread};
use tracing::{info, warn};

/// What to do once the threads are fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentsAction {
    List { include_resolved: bool, json: bool },
    Reply { thread_id: String, body: String },
    Resolve { thread_id: String, body: Option<String> },
    ResolveAll { body: Option<String> },
}

#[derive(Debug, Clone)]
pub struct CommentsOptions {
    pub pr: Option<u64>,
    pub bots: Vec<String>,
    pub action: CommentsAction,
}

/// Outcome of a batch resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveTally {
    pub resolved: usize,
    pub failed: usize,
}

pub fn run<R: GhRunner>(gh: &GitHub<R>, options: &CommentsOptions) -> Result<u8> {
    let pr = match options.pr {
        Some(pr) => pr,
        None => gh.current_pr_number()?,
    };
    let (owner, repo) = gh.repo_info()?;

    let all_threads: Vec<ReviewThread> = gh
        .fetch_thread_nodes(&owner, &repo, pr)
        .iter()
        .filter_map(threads::parse_thread)
        .collect();
    info!(pr, threads = all_threads.len(), "Fetched review threads");

    match &options.action {
        CommentsAction::List { include_resolved, json } => {
            let filtered = threads::filter_threads(&all_threads, &options.bots, !include_resolved);
            if *json {
                println!(
                    "{}",
                    threads::format_json(&filtered, true).context("Failed to serialize threads")?
                );
            } else {
                println!("{}", threads::format_compact(&filtered));
            }
            Ok(0)
        }
        CommentsAction::Reply { thread_id, body } => {
            let target = find_thread(&all_threads, thread_id)?;
            let comment_id = target
                .comment_id
                .ok_or_else(|| CommandError::MissingCommentId(thread_id.clone()))?;
            if !gh.reply_to_comment(&owner, &repo, pr, comment_id, body) {
                return Err(CommandError::ReplyFailed(comment_id).into());
            }
            Ok(0)
        }
        CommentsAction::Resolve { thread_id, body } => {
            let target = find_thread(&all_threads, thread_id)?;
            if let Some(body) = body {
                match target.comment_id {
                    Some(comment_id) => {
                        if !gh.reply_to_comment(&owner, &repo, pr, comment_id, body) {
                            return Err(CommandError::ReplyFailed(comment_id).into());
                        }
                    }
                    None => warn!(thread_id = %thread_id, "Thread has no comment ID, reply skipped"),
                }
            }
            if !gh.resolve_thread(thread_id) {
                return Err(CommandError::ResolveFailed(thread_id.clone()).into());
            }
            Ok(0)
        }
        CommentsAction::ResolveAll { body } => {
            let pending = threads::filter_threads(&all_threads, &options.bots, true);
            if pending.is_empty() {
                eprintln!("No unresolved threads to resolve");
                return Ok(0);
            }
            let tally = resolve_threads(gh, &owner, &repo, pr, &pending, body.as_deref());
            eprintln!("Resolved {} thread(s), {} failed", tally.resolved, tally.failed);
            Ok(if tally.failed == 0 { 0 } else { 1 })
        }
    }
}

fn find_thread<'a>(threads: &'a [ReviewThread], thread_id: &str) -> Result<&'a ReviewThread, CommandError> {
    threads
        .iter()
        .find(|t| t.thread_id == thread_id)
        .ok_or_else(|| CommandError::ThreadNotFound(thread_id.to_string()))
}

/// Resolve each unresolved thread, replying first when `reply_body` is set.
///
/// A failed reply counts the thread as failed and leaves it unresolved.
pub fn resolve_threads<R: GhRunner>(
    gh: &GitHub<R>,
    owner: &str,
    repo: &str,
    pr: u64,
    threads: &[ReviewThread],
    reply_body: Option<&str>,
) -> ResolveTally {
    let mut tally = ResolveTally::default();
    for thread in threads.iter().filter(|t| !t.resolved) {
        if let (Some(body), Some(comment_id)) = (reply_body, thread.comment_id) {
            if !gh.reply_to_comment(owner, repo, pr, comment_id, body) {
                tally.failed += 1;
                continue;
            }
        }

        if gh.resolve_thread(&thread.thread_id) {
            tally.resolved += 1;
        } else {
            tally.failed += 1;
        }
    }
    tally
}
