//! `ai-guardrails status`: project health check.
//!
//! Checks run in a fixed order and each yields ok, warn, error or skip.
//! The overall status ignores skips: any error makes the project `error`
//! (exit 2), any warning makes it `degraded` (exit 1).

use super::helpers::pluralize;
use anyhow::{Context, Result};
use colored::Colorize;
use guardrails_common::{ErrorCode, REGISTRY_FILENAME};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

const EXPECTED_HOOKS: [&str; 8] = [
    "format-and-stage.sh",
    "detect-suppression-comments.sh",
    "validate-generated-configs.sh",
    "protect-generated-configs.sh",
    "detect-config-ignore-edits.sh",
    "dangerous-command-check.sh",
    "pre-commit.sh",
    "pre-push.sh",
];

const BASE_CONFIGS: [&str; 1] = [".editorconfig"];

const LANGUAGE_CONFIGS: [(&str, &[&str]); 6] = [
    ("python", &["ruff.toml"]),
    ("rust", &["rustfmt.toml"]),
    ("dotnet", &["Directory.Build.props", ".globalconfig"]),
    ("cpp", &[".clang-format"]),
    ("lua", &["stylua.toml"]),
    ("node", &["biome.json"]),
];

const BOT_CONFIGS: [(&str, &str); 2] = [(".coderabbit.yaml", "CodeRabbit"), (".pr_agent.toml", "PR-Agent")];

const AGENT_MARKER: &str = "## AI Guardrails - Code Standards";
const AGENT_FILES: [&str; 2] = ["CLAUDE.md", "AGENTS.md"];

/// How a language is recognized in a project tree.
struct LanguageRule {
    name: &'static str,
    /// Marker files at the project root.
    files: &'static [&'static str],
    /// File name globs searched recursively.
    patterns: &'static [&'static str],
    directories: &'static [&'static str],
}

const LANGUAGE_RULES: [LanguageRule; 8] = [
    LanguageRule {
        name: "python",
        files: &["pyproject.toml", "setup.py", "requirements.txt"],
        patterns: &["*.py"],
        directories: &[],
    },
    LanguageRule {
        name: "rust",
        files: &["Cargo.toml"],
        patterns: &["*.rs"],
        directories: &[],
    },
    LanguageRule {
        name: "go",
        files: &["go.mod", "go.sum"],
        patterns: &["*.go"],
        directories: &[],
    },
    LanguageRule {
        name: "node",
        files: &["package.json", "tsconfig.json"],
        patterns: &["*.ts", "*.tsx", "*.js", "*.jsx"],
        directories: &[],
    },
    LanguageRule {
        name: "dotnet",
        files: &[],
        patterns: &["*.csproj", "*.sln"],
        directories: &[],
    },
    LanguageRule {
        name: "cpp",
        files: &["CMakeLists.txt"],
        patterns: &["*.cpp", "*.cc", "*.c", "*.hpp", "*.h"],
        directories: &[],
    },
    LanguageRule {
        name: "lua",
        files: &[],
        patterns: &["*.lua", "*.rockspec"],
        directories: &["lua"],
    },
    LanguageRule {
        name: "shell",
        files: &[],
        patterns: &["*.sh", "*.bash"],
        directories: &[],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    GitRepo,
    Precommit,
    Hooks,
    Configs,
    Registry,
    AgentInstructions,
    ReviewBots,
    CiWorkflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Warn,
    Error,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Overall {
    Ok,
    Degraded,
    Error,
}

impl Overall {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Degraded => 1,
            Self::Error => 2,
        }
    }
}

impl fmt::Display for Overall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "{}", "HEALTHY".green()),
            Self::Degraded => write!(f, "{}", "DEGRADED".yellow()),
            Self::Error => write!(f, "{}", "ERROR".red()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub check: Check,
    pub status: CheckStatus,
    pub message: String,
}

impl CheckResult {
    fn new(check: Check, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            check,
            status,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub project_dir: String,
    pub languages: Vec<String>,
    pub overall: Overall,
    pub checks: Vec<CheckResult>,
}

impl StatusReport {
    pub fn new(project_dir: &Path, languages: Vec<String>, checks: Vec<CheckResult>) -> Self {
        Self {
            project_dir: project_dir.display().to_string(),
            languages,
            overall: overall(&checks),
            checks,
        }
    }

    pub fn format_human(&self) -> String {
        let mut lines = vec![format!("  Project: {}", self.project_dir)];
        if !self.languages.is_empty() {
            lines.push(format!("  Languages: {}", self.languages.join(", ")));
        }
        lines.push(String::new());

        for check in &self.checks {
            let icon = match check.status {
                CheckStatus::Ok => "✓".green(),
                CheckStatus::Warn => "⚠".yellow(),
                CheckStatus::Error => "✗".red(),
                CheckStatus::Skip => "⊘".yellow(),
            };
            lines.push(format!("  {icon} {}", check.message));
        }

        lines.push(String::new());
        lines.push(format!("  Overall: {}", self.overall));
        lines.join("\n")
    }
}

pub fn overall(checks: &[CheckResult]) -> Overall {
    let statuses = || checks.iter().map(|c| c.status).filter(|s| *s != CheckStatus::Skip);
    if statuses().any(|s| s == CheckStatus::Error) {
        Overall::Error
    } else if statuses().any(|s| s == CheckStatus::Warn) {
        Overall::Degraded
    } else {
        Overall::Ok
    }
}

// ---------------------------------------------------------------------------
// Language detection
// ---------------------------------------------------------------------------

fn matches_recursively(project_dir: &Path, pattern: &str) -> bool {
    let root = glob::Pattern::escape(&project_dir.to_string_lossy());
    let full = format!("{root}/**/{pattern}");
    match glob::glob(&full) {
        Ok(mut paths) => paths.any(|entry| entry.is_ok()),
        Err(e) => {
            debug!(pattern = %full, "Skipping invalid glob: {e}");
            false
        }
    }
}

/// Languages present in the project, in rule-table order.
pub fn detect_languages(project_dir: &Path) -> Vec<String> {
    LANGUAGE_RULES
        .iter()
        .filter(|rule| {
            rule.files.iter().any(|f| project_dir.join(f).exists())
                || rule.patterns.iter().any(|p| matches_recursively(project_dir, p))
                || rule.directories.iter().any(|d| project_dir.join(d).is_dir())
        })
        .map(|rule| rule.name.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

pub fn check_git_repo(project_dir: &Path) -> CheckResult {
    if project_dir.join(".git").is_dir() {
        CheckResult::new(Check::GitRepo, CheckStatus::Ok, "Git repository")
    } else {
        CheckResult::new(Check::GitRepo, CheckStatus::Error, "Not a git repository")
    }
}

/// `precommit_on_path` is passed in so callers decide how PATH is searched.
pub fn check_precommit(project_dir: &Path, precommit_on_path: bool) -> CheckResult {
    if !precommit_on_path {
        return CheckResult::new(Check::Precommit, CheckStatus::Warn, "pre-commit not found in PATH");
    }
    if !project_dir.join(".git/hooks/pre-commit").exists() {
        return CheckResult::new(
            Check::Precommit,
            CheckStatus::Warn,
            "pre-commit found but hooks not installed (run: pre-commit install)",
        );
    }
    CheckResult::new(Check::Precommit, CheckStatus::Ok, "pre-commit installed and hooks active")
}

pub fn check_hooks(project_dir: &Path) -> CheckResult {
    let hooks_dir = project_dir.join(".ai-guardrails").join("hooks");
    if !hooks_dir.is_dir() {
        return CheckResult::new(Check::Hooks, CheckStatus::Error, "No .ai-guardrails/hooks/ directory");
    }

    let missing: Vec<&str> = EXPECTED_HOOKS
        .iter()
        .copied()
        .filter(|hook| !hooks_dir.join(hook).exists())
        .collect();
    let total = EXPECTED_HOOKS.len();
    let deployed = total - missing.len();

    if missing.is_empty() {
        CheckResult::new(Check::Hooks, CheckStatus::Ok, format!("{deployed}/{total} hooks deployed"))
    } else {
        CheckResult::new(
            Check::Hooks,
            CheckStatus::Warn,
            format!("{deployed}/{total} hooks deployed (missing: {})", missing.join(", ")),
        )
    }
}

pub fn check_configs(project_dir: &Path, languages: &[String]) -> CheckResult {
    let mut expected: Vec<&str> = BASE_CONFIGS.to_vec();
    for lang in languages {
        if let Some((_, configs)) = LANGUAGE_CONFIGS.iter().find(|(name, _)| *name == lang.as_str()) {
            expected.extend_from_slice(configs);
        }
    }

    let missing: Vec<&str> = expected
        .iter()
        .copied()
        .filter(|config| !project_dir.join(config).exists())
        .collect();
    let present = expected.len() - missing.len();

    if missing.is_empty() {
        CheckResult::new(
            Check::Configs,
            CheckStatus::Ok,
            format!("{} installed", pluralize(present, "config")),
        )
    } else {
        CheckResult::new(
            Check::Configs,
            CheckStatus::Warn,
            format!("{present}/{} configs (missing: {})", expected.len(), missing.join(", ")),
        )
    }
}

pub fn check_registry(project_dir: &Path) -> CheckResult {
    let path = project_dir.join(REGISTRY_FILENAME);
    if !path.exists() {
        return CheckResult::new(Check::Registry, CheckStatus::Skip, "No exception registry");
    }

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            return CheckResult::new(Check::Registry, CheckStatus::Error, format!("Cannot read registry: {e}"));
        }
    };
    let table: toml::Table = match content.parse() {
        Ok(table) => table,
        Err(e) => {
            let reason = e.to_string();
            let first_line = reason.lines().next().unwrap_or_default();
            return CheckResult::new(Check::Registry, CheckStatus::Error, format!("Invalid TOML: {first_line}"));
        }
    };

    if !table.contains_key("schema_version") {
        return CheckResult::new(Check::Registry, CheckStatus::Warn, "Registry missing schema_version");
    }
    CheckResult::new(Check::Registry, CheckStatus::Ok, "Exception registry valid")
}

pub fn check_agent_instructions(project_dir: &Path) -> CheckResult {
    for name in AGENT_FILES {
        let Ok(content) = fs::read_to_string(project_dir.join(name)) else {
            continue;
        };
        if content.contains(AGENT_MARKER) {
            return CheckResult::new(
                Check::AgentInstructions,
                CheckStatus::Ok,
                format!("Guardrails rules in {name}"),
            );
        }
    }
    CheckResult::new(
        Check::AgentInstructions,
        CheckStatus::Warn,
        "No guardrails section in CLAUDE.md or AGENTS.md",
    )
}

pub fn check_review_bots(project_dir: &Path) -> CheckResult {
    let (present, missing): (Vec<_>, Vec<_>) = BOT_CONFIGS
        .iter()
        .partition(|(file, _)| project_dir.join(file).exists());
    let names = |bots: &[&(&str, &str)]| bots.iter().map(|(_, name)| *name).collect::<Vec<_>>().join(", ");

    if missing.is_empty() {
        CheckResult::new(
            Check::ReviewBots,
            CheckStatus::Ok,
            format!("All review bots configured: {}", names(&present)),
        )
    } else if !present.is_empty() {
        CheckResult::new(
            Check::ReviewBots,
            CheckStatus::Warn,
            format!("Partial: {} (missing: {})", names(&present), names(&missing)),
        )
    } else {
        CheckResult::new(Check::ReviewBots, CheckStatus::Skip, "No review bot configs found")
    }
}

pub fn check_ci_workflow(project_dir: &Path) -> CheckResult {
    if !project_dir.join(".github").is_dir() {
        return CheckResult::new(Check::CiWorkflow, CheckStatus::Skip, "Not a GitHub project");
    }
    if project_dir.join(".github/workflows/check.yml").exists() {
        CheckResult::new(Check::CiWorkflow, CheckStatus::Ok, "CI workflow installed")
    } else {
        CheckResult::new(Check::CiWorkflow, CheckStatus::Warn, "CI workflow not found")
    }
}

/// Run every check in order.
pub fn build_report(project_dir: &Path, precommit_on_path: bool) -> StatusReport {
    let languages = detect_languages(project_dir);
    debug!(?languages, "Detected project languages");

    let checks = vec![
        check_git_repo(project_dir),
        check_precommit(project_dir, precommit_on_path),
        check_hooks(project_dir),
        check_configs(project_dir, &languages),
        check_registry(project_dir),
        check_agent_instructions(project_dir),
        check_review_bots(project_dir),
        check_ci_workflow(project_dir),
    ];
    StatusReport::new(project_dir, languages, checks)
}

pub fn run(project_dir: &Path, json: bool) -> Result<u8> {
    let precommit_on_path = which::which("pre-commit").is_ok();
    let report = build_report(project_dir, precommit_on_path);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize status report")?
        );
    } else {
        println!("{}", report.format_human());
    }
    if report.overall != Overall::Ok {
        eprintln!("{}", ErrorCode::StatusUnhealthy.entry().format_brief());
    }
    Ok(report.overall.exit_code())
}
