//! Tool config generators driven by the exception registry.
//!
//! Each generator renders one file from the registry (and, for merged
//! configs, a base template). Rendering is pure; callers decide where the
//! output lands.

pub mod allowlist;
pub mod codespell;
pub mod markdownlint;

use crate::errors::ErrorCode;
use crate::registry::{ExceptionRegistry, REGISTRY_FILENAME};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const CODESPELL_FILENAME: &str = ".codespellrc";
pub const ALLOWLIST_FILENAME: &str = ".suppression-allowlist";
pub const MARKDOWNLINT_FILENAME: &str = ".markdownlint.jsonc";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to read template {}: {source}", path.display())]
    ReadTemplate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in template {}: {source}", path.display())]
    InvalidTemplate {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("template {} must contain a JSON object", path.display())]
    TemplateNotObject { path: PathBuf },
}

impl GenerateError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::GenerateFailed
    }
}

/// A rendered config file, named relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: &'static str,
    pub content: String,
}

/// Header marking a file as generated, one `prefix`-commented line each.
pub fn make_header(prefix: &str, extra_lines: &[&str]) -> String {
    let mut lines = vec![
        format!("{prefix} AUTO-GENERATED by ai-guardrails from {REGISTRY_FILENAME}"),
        format!("{prefix} Do not edit by hand. Update the registry and run: ai-guardrails generate"),
    ];
    lines.extend(extra_lines.iter().map(|line| format!("{prefix} {line}")));
    lines.join("\n")
}

/// Locate a base template: `<project>/configs/<name>` first, then the install dir.
pub fn find_base_config(name: &str, project: &Path, templates_dir: Option<&Path>) -> Option<PathBuf> {
    let local = project.join("configs").join(name);
    if local.is_file() {
        return Some(local);
    }
    let global = templates_dir?.join(name);
    global.is_file().then_some(global)
}

/// Render every config the registry calls for.
pub fn generate_all(
    registry: &ExceptionRegistry,
    project: &Path,
    templates_dir: Option<&Path>,
) -> Result<Vec<GeneratedFile>, GenerateError> {
    let mut files = Vec::new();

    if let Some(base) = find_base_config(MARKDOWNLINT_FILENAME, project, templates_dir) {
        debug!(template = %base.display(), "Merging markdownlint base config");
        files.push(GeneratedFile {
            name: MARKDOWNLINT_FILENAME,
            content: markdownlint::render_from_path(registry, &base)?,
        });
    }

    if registry.has_global("codespell") {
        files.push(GeneratedFile {
            name: CODESPELL_FILENAME,
            content: codespell::render(registry),
        });
    }

    if !registry.inline_suppressions.is_empty() {
        files.push(GeneratedFile {
            name: ALLOWLIST_FILENAME,
            content: allowlist::render(registry),
        });
    }

    Ok(files)
}
