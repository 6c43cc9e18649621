//! Error Catalog for AI Guardrails
//!
//! Each catalog entry carries:
//! - A unique code (GR-E001 through GR-E599)
//! - A human-readable message
//! - Remediation steps

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code enumeration covering every reportable failure.
///
/// Each variant maps to a unique error code in the GR-Exxx format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    // =========================================================================
    // Config Errors (E001-E099)
    // =========================================================================
    /// config.toml could not be read
    ConfigReadError,
    /// config.toml contains invalid TOML
    ConfigParseError,
    /// A GUARDRAILS_* environment variable has an invalid value
    ConfigEnvError,

    // =========================================================================
    // GitHub Errors (E100-E199)
    // =========================================================================
    /// The gh binary could not be started
    GhNotFound,
    /// A gh invocation exited with failure
    GhCommandFailed,
    /// No pull request is associated with the current branch
    NoPullRequest,
    /// Repository owner/name could not be determined
    RepoInfoUnavailable,
    /// The requested review thread does not exist on the PR
    ThreadNotFound,
    /// The review thread has no comment to reply to
    MissingCommentId,
    /// Posting a reply failed
    ReplyFailed,
    /// Resolving one or more threads failed
    ResolveFailed,

    // =========================================================================
    // Review Errors (E200-E299)
    // =========================================================================
    /// Review input could not be read
    ReviewInputRead,
    /// Review input is not valid JSON
    ReviewInputInvalid,

    // =========================================================================
    // Registry Errors (E300-E399)
    // =========================================================================
    /// No .guardrails-exceptions.toml in the project
    RegistryNotFound,
    /// Registry file could not be read or parsed
    RegistryParseError,
    /// Registry content is structurally invalid
    RegistryInvalid,
    /// Registry failed validation (missing reasons, expired entries)
    RegistryValidationFailed,
    /// Generated configs are missing or stale
    GeneratedConfigsOutOfSync,
    /// Writing generated configs failed
    GenerateFailed,

    // =========================================================================
    // Project Errors (E400-E499)
    // =========================================================================
    /// Target directory is not a git repository
    NotAGitRepository,
    /// Guardrails health check found problems
    StatusUnhealthy,

    // =========================================================================
    // Internal Errors (E500-E599)
    // =========================================================================
    /// Unexpected I/O failure
    InternalIoError,
    /// JSON serialization failed
    InternalSerializationError,
}

impl ErrorCode {
    /// Returns the numeric error code (without prefix).
    #[must_use]
    pub const fn code_number(&self) -> u16 {
        match self {
            // Config (001-099)
            Self::ConfigReadError => 1,
            Self::ConfigParseError => 2,
            Self::ConfigEnvError => 3,

            // GitHub (100-199)
            Self::GhNotFound => 100,
            Self::GhCommandFailed => 101,
            Self::NoPullRequest => 102,
            Self::RepoInfoUnavailable => 103,
            Self::ThreadNotFound => 104,
            Self::MissingCommentId => 105,
            Self::ReplyFailed => 106,
            Self::ResolveFailed => 107,

            // Review (200-299)
            Self::ReviewInputRead => 200,
            Self::ReviewInputInvalid => 201,

            // Registry (300-399)
            Self::RegistryNotFound => 300,
            Self::RegistryParseError => 301,
            Self::RegistryInvalid => 302,
            Self::RegistryValidationFailed => 303,
            Self::GeneratedConfigsOutOfSync => 304,
            Self::GenerateFailed => 305,

            // Project (400-499)
            Self::NotAGitRepository => 400,
            Self::StatusUnhealthy => 401,

            // Internal (500-599)
            Self::InternalIoError => 500,
            Self::InternalSerializationError => 501,
        }
    }

    /// Returns the formatted error code string (e.g., "GR-E001").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("GR-E{:03}", self.code_number())
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self.code_number() {
            1..=99 => ErrorCategory::Config,
            100..=199 => ErrorCategory::GitHub,
            200..=299 => ErrorCategory::Review,
            300..=399 => ErrorCategory::Registry,
            400..=499 => ErrorCategory::Project,
            _ => ErrorCategory::Internal,
        }
    }

    /// Returns the full error entry with all metadata.
    #[must_use]
    pub fn entry(&self) -> ErrorEntry {
        ErrorEntry {
            code: self.code_string(),
            category: self.category(),
            message: self.message().to_string(),
            remediation: self
                .remediation()
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::ConfigReadError => "Configuration file could not be read",
            Self::ConfigParseError => "Configuration file contains invalid TOML",
            Self::ConfigEnvError => "Environment variable has an invalid value",
            Self::GhNotFound => "GitHub CLI (gh) could not be started",
            Self::GhCommandFailed => "GitHub CLI command failed",
            Self::NoPullRequest => "No pull request found for the current branch",
            Self::RepoInfoUnavailable => "Could not determine repository info",
            Self::ThreadNotFound => "Review thread not found on this pull request",
            Self::MissingCommentId => "Review thread has no comment to reply to",
            Self::ReplyFailed => "Failed to post reply",
            Self::ResolveFailed => "Failed to resolve review thread",
            Self::ReviewInputRead => "Review input could not be read",
            Self::ReviewInputInvalid => "Review input is not valid JSON",
            Self::RegistryNotFound => "Exception registry not found",
            Self::RegistryParseError => "Exception registry could not be parsed",
            Self::RegistryInvalid => "Exception registry is invalid",
            Self::RegistryValidationFailed => "Exception registry failed validation",
            Self::GeneratedConfigsOutOfSync => "Generated configs are out of sync with the registry",
            Self::GenerateFailed => "Failed to write generated configs",
            Self::NotAGitRepository => "Not a git repository",
            Self::StatusUnhealthy => "Guardrails health check reported problems",
            Self::InternalIoError => "Unexpected I/O error",
            Self::InternalSerializationError => "Failed to serialize output",
        }
    }

    /// Returns remediation steps for the error.
    #[must_use]
    pub const fn remediation(&self) -> &'static [&'static str] {
        match self {
            Self::ConfigReadError => &[
                "Check permissions on ~/.ai-guardrails/config.toml",
                "Set GUARDRAILS_HOME to use a different install directory",
            ],
            Self::ConfigParseError => &[
                "Fix the TOML syntax in ~/.ai-guardrails/config.toml",
                "Delete the file to fall back to defaults",
            ],
            Self::ConfigEnvError => &[
                "Check GUARDRAILS_* environment variables for typos",
                "Unset the variable to use the default value",
            ],
            Self::GhNotFound => &[
                "Install the GitHub CLI: https://cli.github.com",
                "Set GUARDRAILS_GH_BIN if gh lives outside PATH",
            ],
            Self::GhCommandFailed => &[
                "Run `gh auth status` to check authentication",
                "Run `gh auth login` if the token expired",
            ],
            Self::NoPullRequest => &[
                "Pass the pull request explicitly with --pr NUMBER",
                "Push the branch and open a pull request first",
            ],
            Self::RepoInfoUnavailable => &[
                "Run the command inside a clone of a GitHub repository",
                "Run `gh repo view` to check repository access",
            ],
            Self::ThreadNotFound => &[
                "List threads with `ai-guardrails comments --all` to get valid IDs",
                "Thread IDs start with PRRT_",
            ],
            Self::MissingCommentId => &["Resolve the thread without a reply body"],
            Self::ReplyFailed | Self::ResolveFailed => &[
                "Check that your token has write access to pull requests",
                "Retry the command; GitHub API errors are often transient",
            ],
            Self::ReviewInputRead => &["Check the --input path, or pass - to read stdin"],
            Self::ReviewInputInvalid => &[
                "Input must be an object with `threads` and `review_bodies` arrays",
            ],
            Self::RegistryNotFound => &[
                "Create .guardrails-exceptions.toml with schema_version = 1",
            ],
            Self::RegistryParseError | Self::RegistryInvalid => &[
                "Fix the TOML in .guardrails-exceptions.toml",
                "Every registry needs a top-level schema_version",
                "Dates in `expires` use YYYY-MM-DD",
            ],
            Self::RegistryValidationFailed => &[
                "Give every exception a non-empty reason",
                "Renew or remove expired exceptions",
            ],
            Self::GeneratedConfigsOutOfSync => &["Run `ai-guardrails generate` and commit the result"],
            Self::GenerateFailed => &["Check write permissions in the project directory"],
            Self::NotAGitRepository => &["Run `git init` or point the command at a git checkout"],
            Self::StatusUnhealthy => &["Review the failed checks above and fix each one"],
            Self::InternalIoError | Self::InternalSerializationError => &[
                "Re-run with -v for debug output",
                "Report the issue if it persists",
            ],
        }
    }

    /// Returns all error codes.
    #[must_use]
    pub const fn all() -> &'static [ErrorCode] {
        &[
            Self::ConfigReadError,
            Self::ConfigParseError,
            Self::ConfigEnvError,
            Self::GhNotFound,
            Self::GhCommandFailed,
            Self::NoPullRequest,
            Self::RepoInfoUnavailable,
            Self::ThreadNotFound,
            Self::MissingCommentId,
            Self::ReplyFailed,
            Self::ResolveFailed,
            Self::ReviewInputRead,
            Self::ReviewInputInvalid,
            Self::RegistryNotFound,
            Self::RegistryParseError,
            Self::RegistryInvalid,
            Self::RegistryValidationFailed,
            Self::GeneratedConfigsOutOfSync,
            Self::GenerateFailed,
            Self::NotAGitRepository,
            Self::StatusUnhealthy,
            Self::InternalIoError,
            Self::InternalSerializationError,
        ]
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code_string(), self.message())
    }
}

/// Error category for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Configuration and environment errors (E001-E099)
    Config,
    /// gh CLI and GitHub API errors (E100-E199)
    GitHub,
    /// Review input errors (E200-E299)
    Review,
    /// Exception registry errors (E300-E399)
    Registry,
    /// Project layout errors (E400-E499)
    Project,
    /// Internal/unexpected errors (E500-E599)
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable name for the category.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Config => "Configuration",
            Self::GitHub => "GitHub",
            Self::Review => "Review",
            Self::Registry => "Registry",
            Self::Project => "Project",
            Self::Internal => "Internal",
        }
    }

    /// Returns a short description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Config => "Configuration file and environment setup issues",
            Self::GitHub => "GitHub CLI invocation and pull request issues",
            Self::Review => "Review comment input issues",
            Self::Registry => "Exception registry and generated config issues",
            Self::Project => "Project layout and guardrails health issues",
            Self::Internal => "Internal errors that may indicate bugs",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A fully resolved catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Error code string (e.g., "GR-E102")
    pub code: String,
    /// Error category
    pub category: ErrorCategory,
    /// Human-readable error message
    pub message: String,
    /// Steps to remediate the error
    pub remediation: Vec<String>,
}

impl ErrorEntry {
    /// Formats the error for display with full remediation steps.
    #[must_use]
    pub fn format_full(&self) -> String {
        let mut output = format!("[{}] {}\n", self.code, self.message);

        if !self.remediation.is_empty() {
            output.push_str("\nRemediation steps:\n");
            for (i, step) in self.remediation.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, step));
            }
        }

        output
    }

    /// Formats the error as a single line.
    #[must_use]
    pub fn format_brief(&self) -> String {
        format!("[{}] {}", self.code, self.message)
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_brief())
    }
}
