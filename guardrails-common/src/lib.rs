//! Shared types and logic for AI Guardrails.
//!
//! The `ai-guardrails` binary is a thin shell around this crate: everything
//! that can be tested without spawning `gh` or touching a real repository
//! lives here.

pub mod config;
pub mod errors;
pub mod generators;
pub mod registry;
pub mod review;
pub mod threads;
pub mod util;

pub use config::{ConfigSource, EnvError, EnvParser, GuardrailsConfig, Sourced};
pub use errors::{ErrorCategory, ErrorCode, ErrorEntry};
pub use registry::{ExceptionRegistry, REGISTRY_FILENAME, RegistryError};
pub use review::{ReviewInput, Severity, Task, TaskReport, TaskSource, ThreadInput};
pub use threads::{ReviewThread, ThreadNode, ThreadSummary};
