//! Subcommand implementations.
//!
//! Each command returns the process exit code on success; failures that
//! should print an error (with catalog remediation) come back as `Err`.

pub mod comments;
pub mod generate;
pub mod helpers;
pub mod review;
pub mod status;

use guardrails_common::ErrorCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Thread {0} not found")]
    ThreadNotFound(String),

    #[error("Thread {0} has no comment ID for reply")]
    MissingCommentId(String),

    #[error("Failed to reply to comment {0}")]
    ReplyFailed(u64),

    #[error("Failed to resolve thread {0}")]
    ResolveFailed(String),

    #[error("{} not found in {}", guardrails_common::REGISTRY_FILENAME, dir.display())]
    RegistryNotFound { dir: PathBuf },

    #[error("Validation errors in {}:\n{}", path.display(), helpers::bullet_lines(errors))]
    RegistryValidation { path: PathBuf, errors: Vec<String> },
}

impl CommandError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ThreadNotFound(_) => ErrorCode::ThreadNotFound,
            Self::MissingCommentId(_) => ErrorCode::MissingCommentId,
            Self::ReplyFailed(_) => ErrorCode::ReplyFailed,
            Self::ResolveFailed(_) => ErrorCode::ResolveFailed,
            Self::RegistryNotFound { .. } => ErrorCode::RegistryNotFound,
            Self::RegistryValidation { .. } => ErrorCode::RegistryValidationFailed,
        }
    }
}
