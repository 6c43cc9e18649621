//! Shared helper functions for ai-guardrails commands.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Render items as `  - item` lines joined by newlines.
pub fn bullet_lines<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::new();
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        out.push_str("  - ");
        out.push_str(item.as_ref());
    }
    out
}

/// Read a whole input file, with `-` meaning stdin.
pub fn read_input(path: &Path) -> io::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        fs::read_to_string(path)
    }
}

/// Move a file, falling back to copy + remove across filesystems.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}

/// `1 thread` / `3 threads`.
pub fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
