use super::Task;
use std::collections::HashSet;
use tracing::debug;

/// Lowercase, collapse whitespace and drop trailing punctuation.
pub fn normalize_title(title: &str) -> String {
    let collapsed = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    collapsed
        .trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_string()
}

fn dedup_key(task: &Task) -> (String, u32, String) {
    (task.file.clone(), task.line, normalize_title(&task.title))
}

/// Merge thread and body tasks, threads first.
///
/// Thread tasks are always kept. A body task is dropped when a task with the
/// same file, line and normalized title was already kept, which covers both
/// thread duplicates and the same nitpick repeated across reviews.
pub fn merge_tasks(thread_tasks: Vec<Task>, body_tasks: Vec<Task>) -> Vec<Task> {
    let mut seen: HashSet<(String, u32, String)> = thread_tasks.iter().map(dedup_key).collect();
    let mut merged = thread_tasks;
    let mut dropped = 0usize;

    for task in body_tasks {
        if seen.insert(dedup_key(&task)) {
            merged.push(task);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        debug!(dropped, "Dropped duplicate review body tasks");
    }
    merged
}

/// Number tasks `task-001`, `task-002`, ... in their current order.
pub fn assign_ids(tasks: &mut [Task]) {
    for (i, task) in tasks.iter_mut().enumerate() {
        task.id = format!("task-{:03}", i + 1);
    }
}
