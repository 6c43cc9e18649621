//! `.markdownlint.jsonc`: base template plus globally ignored rules.

use super::{GenerateError, make_header};
use crate::registry::ExceptionRegistry;
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use std::sync::LazyLock;

static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*//.*$").expect("valid JSONC comment regex"));

/// Drop whole-line `//` comments so the template parses as JSON.
pub fn strip_jsonc_comments(text: &str) -> String {
    LINE_COMMENT.replace_all(text, "").into_owned()
}

/// Merge the base template text with `[global.markdownlint]` ignores.
pub fn render(registry: &ExceptionRegistry, base: &str, base_path: &Path) -> Result<String, GenerateError> {
    let mut config: Value =
        serde_json::from_str(&strip_jsonc_comments(base)).map_err(|source| GenerateError::InvalidTemplate {
            path: base_path.to_path_buf(),
            source,
        })?;
    let Some(rules) = config.as_object_mut() else {
        return Err(GenerateError::TemplateNotObject {
            path: base_path.to_path_buf(),
        });
    };

    for rule in registry.global_ignores("markdownlint") {
        rules.insert(rule, Value::Bool(false));
    }

    let body = serde_json::to_string_pretty(&config).map_err(|source| GenerateError::InvalidTemplate {
        path: base_path.to_path_buf(),
        source,
    })?;
    Ok([make_header("//", &[]), body, String::new()].join("\n"))
}

pub fn render_from_path(registry: &ExceptionRegistry, base_path: &Path) -> Result<String, GenerateError> {
    let base = std::fs::read_to_string(base_path).map_err(|source| GenerateError::ReadTemplate {
        path: base_path.to_path_buf(),
        source,
    })?;
    render(registry, &base, base_path)
}
