//! Error catalog for AI Guardrails
//!
//! Every failure the CLI reports at top level maps to a stable code with
//! remediation hints. Library error enums expose a `code()` accessor into
//! this catalog.
//!
//! # Error Code Ranges
//!
//! | Range      | Category    | Description                            |
//! |------------|-------------|----------------------------------------|
//! | E001-E099  | Config      | Configuration and environment errors   |
//! | E100-E199  | GitHub      | `gh` CLI and GitHub API errors         |
//! | E200-E299  | Review      | Review input parsing errors            |
//! | E300-E399  | Registry    | Exception registry and generated files |
//! | E400-E499  | Project     | Project layout and tooling errors      |
//! | E500-E599  | Internal    | Internal/unexpected errors             |

pub mod catalog;

pub use catalog::{ErrorCategory, ErrorCode, ErrorEntry};
