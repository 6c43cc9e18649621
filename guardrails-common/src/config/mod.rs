//! Configuration for AI Guardrails.
//!
//! Values are layered: built-in defaults, then `<install dir>/config.toml`,
//! then `GUARDRAILS_*` environment variables. Each resolved value remembers
//! where it came from so `-v` output can explain surprising behavior.

pub mod env;
pub mod source;

pub use env::{EnvError, EnvParser};
pub use source::{ConfigSource, Sourced};

use crate::errors::ErrorCode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default number of reviewThreads pages (100 threads each) fetched per PR.
pub const DEFAULT_MAX_THREAD_PAGES: u32 = 50;

/// Name of the per-user install directory under `$HOME`.
pub const INSTALL_DIR_NAME: &str = ".ai-guardrails";

pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::ConfigReadError,
            Self::Parse { .. } => ErrorCode::ConfigParseError,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    github: GithubSection,
    output: OutputSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GithubSection {
    gh_bin: Option<String>,
    max_thread_pages: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OutputSection {
    color: Option<bool>,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct GuardrailsConfig {
    /// `$GUARDRAILS_HOME` or `~/.ai-guardrails`.
    pub install_dir: Sourced<PathBuf>,
    /// Program used for every GitHub call.
    pub gh_bin: Sourced<String>,
    /// Upper bound on reviewThreads pages fetched for one PR.
    pub max_thread_pages: Sourced<u32>,
    pub color: Sourced<bool>,
    /// Default tracing level when neither `RUST_LOG` nor `-v` is given.
    pub log_level: Sourced<String>,
}

impl Default for GuardrailsConfig {
    fn default() -> Self {
        Self {
            install_dir: Sourced::default_value(default_install_dir()),
            gh_bin: Sourced::default_value("gh".to_string()),
            max_thread_pages: Sourced::default_value(DEFAULT_MAX_THREAD_PAGES),
            color: Sourced::default_value(true),
            log_level: Sourced::default_value("warn".to_string()),
        }
    }
}

fn default_install_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(INSTALL_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(INSTALL_DIR_NAME))
}

impl GuardrailsConfig {
    /// Load configuration from the environment and the install directory.
    ///
    /// Environment problems do not abort loading; they are returned next to
    /// the config so the caller can warn about each one.
    pub fn load() -> Result<(Self, Vec<EnvError>), ConfigError> {
        let mut parser = EnvParser::new();
        let install_dir = match parser.get_optional_path("HOME") {
            Sourced {
                value: Some(dir),
                env_var: Some(var),
                ..
            } => Sourced::from_env(dir, var),
            _ => Sourced::default_value(default_install_dir()),
        };
        let config = Self::load_layered(install_dir, &mut parser)?;
        Ok((config, parser.take_errors()))
    }

    /// Load from an explicit install directory, still honoring env overrides.
    pub fn load_from(install_dir: &Path) -> Result<(Self, Vec<EnvError>), ConfigError> {
        let mut parser = EnvParser::new();
        let config = Self::load_layered(Sourced::from_file(install_dir.to_path_buf()), &mut parser)?;
        Ok((config, parser.take_errors()))
    }

    fn load_layered(install_dir: Sourced<PathBuf>, parser: &mut EnvParser) -> Result<Self, ConfigError> {
        let file = read_config_file(&install_dir.value.join(CONFIG_FILENAME))?;
        let defaults = Self::default();

        let gh_bin = match file.github.gh_bin {
            Some(bin) => Sourced::from_file(bin),
            None => defaults.gh_bin,
        };
        let max_thread_pages = match file.github.max_thread_pages {
            Some(pages) if pages > 0 => Sourced::from_file(pages),
            _ => defaults.max_thread_pages,
        };
        let color = match file.output.color {
            Some(color) => Sourced::from_file(color),
            None => defaults.color,
        };

        let config = Self {
            gh_bin: parser.get_string("GH_BIN", &gh_bin.value).or_else(gh_bin),
            max_thread_pages: parser
                .get_u32_range("MAX_THREAD_PAGES", max_thread_pages.value, 1, 1000)
                .or_else(max_thread_pages),
            color: parser.get_bool("COLOR", color.value).or_else(color),
            log_level: parser.get_log_level("LOG_LEVEL", &defaults.log_level.value),
            install_dir,
        };

        debug!(
            install_dir = %config.install_dir.value.display(),
            gh_bin = %config.gh_bin,
            max_thread_pages = %config.max_thread_pages,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Directory holding the shipped base templates (`configs/<name>`).
    pub fn templates_dir(&self) -> PathBuf {
        self.install_dir.value.join("configs")
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    if !path.is_file() {
        return Ok(ConfigFile::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
pub(crate) fn env_test_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
