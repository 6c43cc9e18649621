//! Exception registry: `.guardrails-exceptions.toml`.
//!
//! The registry is the single place a project records approved lint
//! exceptions. Generated tool configs are derived from it, and every entry
//! must carry a reason.
//!
//! ```toml
//! schema_version = 1
//!
//! [global.ruff]
//! E501 = "formatter owns line length"
//!
//! [global.codespell]
//! skip = ["*.lock"]
//! ignore_words = ["crate"]
//!
//! [[file_exceptions]]
//! glob = "tests/**/*.py"
//! tool = "ruff"
//! rules = ["S101"]
//! reason = "pytest uses assert"
//! expires = 2027-01-01
//!
//! [[inline_suppressions]]
//! pattern = "# noqa: E402"
//! glob = ["scripts/*.py"]
//! reason = "sys.path setup before imports"
//!
//! [skip]
//! markdownlint = ["CHANGELOG.md"]
//! ```

use crate::errors::ErrorCode;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const REGISTRY_FILENAME: &str = ".guardrails-exceptions.toml";

/// Global tables whose values are structured settings rather than reasons.
const STRUCTURED_GLOBAL_TOOLS: [&str; 2] = ["codespell", "pyright"];

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Registry file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required field: schema_version")]
    MissingSchemaVersion,

    #[error("Invalid date in {location}.expires: '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { location: String, value: String },
}

impl RegistryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::RegistryNotFound,
            Self::Read { .. } | Self::Parse(_) => ErrorCode::RegistryParseError,
            Self::MissingSchemaVersion | Self::InvalidDate { .. } => ErrorCode::RegistryInvalid,
        }
    }
}

/// A single glob or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum GlobList {
    One(String),
    Many(Vec<String>),
}

impl Default for GlobList {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl From<GlobList> for Vec<String> {
    fn from(value: GlobList) -> Self {
        match value {
            GlobList::One(glob) => vec![glob],
            GlobList::Many(globs) => globs,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRegistry {
    schema_version: Option<i64>,
    #[serde(default)]
    global: BTreeMap<String, toml::Value>,
    #[serde(default)]
    file_exceptions: Vec<RawFileException>,
    #[serde(default)]
    inline_suppressions: Vec<RawInlineSuppression>,
    #[serde(default)]
    skip: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFileException {
    glob: GlobList,
    tool: String,
    rules: Vec<String>,
    reason: String,
    expires: Option<toml::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawInlineSuppression {
    pattern: String,
    glob: GlobList,
    reason: String,
    expires: Option<toml::Value>,
}

/// Rules disabled for files matching a glob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileException {
    pub glob: Vec<String>,
    pub tool: String,
    pub rules: Vec<String>,
    pub reason: String,
    pub expires: Option<NaiveDate>,
}

/// An approved inline suppression comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSuppression {
    pub pattern: String,
    pub glob: Vec<String>,
    pub reason: String,
    pub expires: Option<NaiveDate>,
}

/// An entry whose `expires` date has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expired<'a> {
    File(&'a FileException),
    Inline(&'a InlineSuppression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionRegistry {
    pub schema_version: i64,
    /// Tool -> { rule or setting -> reason or value }.
    pub global_rules: BTreeMap<String, toml::Table>,
    pub file_exceptions: Vec<FileException>,
    pub inline_suppressions: Vec<InlineSuppression>,
    /// Tool -> paths excluded from scanning.
    pub skip: BTreeMap<String, Vec<String>>,
}

fn parse_expires(value: Option<toml::Value>, location: String) -> Result<Option<NaiveDate>, RegistryError> {
    let text = match value {
        None => return Ok(None),
        Some(toml::Value::String(s)) => s,
        Some(toml::Value::Datetime(dt)) => dt.to_string(),
        Some(other) => other.to_string(),
    };
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|_| RegistryError::InvalidDate { location, value: text })
}

impl ExceptionRegistry {
    /// Load and parse a registry file.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        if !path.exists() {
            return Err(RegistryError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::parse(&content)?;
        debug!(
            path = %path.display(),
            file_exceptions = registry.file_exceptions.len(),
            inline_suppressions = registry.inline_suppressions.len(),
            "Loaded exception registry"
        );
        Ok(registry)
    }

    /// Parse registry TOML text.
    pub fn parse(content: &str) -> Result<Self, RegistryError> {
        let raw: RawRegistry = toml::from_str(content)?;
        let schema_version = raw.schema_version.ok_or(RegistryError::MissingSchemaVersion)?;

        let global_rules = raw
            .global
            .into_iter()
            .filter_map(|(tool, value)| match value {
                toml::Value::Table(table) => Some((tool, table)),
                _ => None,
            })
            .collect();

        let file_exceptions = raw
            .file_exceptions
            .into_iter()
            .enumerate()
            .map(|(i, fe)| {
                Ok(FileException {
                    expires: parse_expires(fe.expires, format!("file_exceptions[{i}]"))?,
                    glob: fe.glob.into(),
                    tool: fe.tool,
                    rules: fe.rules,
                    reason: fe.reason,
                })
            })
            .collect::<Result<Vec<_>, RegistryError>>()?;

        let inline_suppressions = raw
            .inline_suppressions
            .into_iter()
            .enumerate()
            .map(|(i, sup)| {
                Ok(InlineSuppression {
                    expires: parse_expires(sup.expires, format!("inline_suppressions[{i}]"))?,
                    pattern: sup.pattern,
                    glob: sup.glob.into(),
                    reason: sup.reason,
                })
            })
            .collect::<Result<Vec<_>, RegistryError>>()?;

        let skip = raw
            .skip
            .into_iter()
            .filter_map(|(tool, value)| match value {
                toml::Value::Array(items) => Some((
                    tool,
                    items
                        .into_iter()
                        .filter_map(|item| item.as_str().map(String::from))
                        .collect(),
                )),
                _ => None,
            })
            .collect();

        Ok(Self {
            schema_version,
            global_rules,
            file_exceptions,
            inline_suppressions,
            skip,
        })
    }

    /// Validation errors as of `today`. Empty means valid.
    pub fn validate_on(&self, today: NaiveDate) -> Vec<String> {
        let mut errors = Vec::new();

        for (tool, rules) in &self.global_rules {
            if STRUCTURED_GLOBAL_TOOLS.contains(&tool.as_str()) {
                continue;
            }
            for (rule, reason) in rules {
                if matches!(reason, toml::Value::String(s) if s.trim().is_empty()) {
                    errors.push(format!("global.{tool}.{rule}: empty reason"));
                }
            }
        }

        for (i, fe) in self.file_exceptions.iter().enumerate() {
            if fe.reason.trim().is_empty() {
                errors.push(format!("file_exceptions[{i}]: missing reason"));
            }
        }
        for (i, sup) in self.inline_suppressions.iter().enumerate() {
            if sup.reason.trim().is_empty() {
                errors.push(format!("inline_suppressions[{i}]: missing reason"));
            }
        }

        for (i, fe) in self.file_exceptions.iter().enumerate() {
            if let Some(expires) = fe.expires.filter(|d| *d < today) {
                errors.push(format!(
                    "file_exceptions[{i}]: expired on {expires} (glob=[{}], tool={})",
                    fe.glob.join(", "),
                    fe.tool
                ));
            }
        }
        for (i, sup) in self.inline_suppressions.iter().enumerate() {
            if let Some(expires) = sup.expires.filter(|d| *d < today) {
                errors.push(format!(
                    "inline_suppressions[{i}]: expired on {expires} (pattern={})",
                    sup.pattern
                ));
            }
        }

        errors
    }

    /// Validation errors as of today (UTC).
    pub fn validate(&self) -> Vec<String> {
        self.validate_on(chrono::Utc::now().date_naive())
    }

    /// Rule codes globally ignored for `tool` (keys with a string reason).
    pub fn global_ignores(&self, tool: &str) -> Vec<String> {
        self.global_rules
            .get(tool)
            .map(|rules| {
                rules
                    .iter()
                    .filter(|(_, value)| value.is_str())
                    .map(|(rule, _)| rule.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// String list stored under `global.<tool>.<key>`.
    pub fn global_list(&self, tool: &str, key: &str) -> Vec<String> {
        self.global_rules
            .get(tool)
            .and_then(|rules| rules.get(key))
            .and_then(toml::Value::as_array)
            .map(|items| items.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default()
    }

    pub fn has_global(&self, tool: &str) -> bool {
        self.global_rules.get(tool).is_some_and(|rules| !rules.is_empty())
    }

    pub fn file_exceptions_for(&self, tool: &str) -> Vec<&FileException> {
        self.file_exceptions.iter().filter(|fe| fe.tool == tool).collect()
    }

    /// Entries whose `expires` date is before `today`.
    pub fn expired_on(&self, today: NaiveDate) -> Vec<Expired<'_>> {
        let files = self
            .file_exceptions
            .iter()
            .filter(|fe| fe.expires.is_some_and(|d| d < today))
            .map(Expired::File);
        let inline = self
            .inline_suppressions
            .iter()
            .filter(|sup| sup.expires.is_some_and(|d| d < today))
            .map(Expired::Inline);
        files.chain(inline).collect()
    }
}
