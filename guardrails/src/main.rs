//! AI Guardrails CLI
//!
//! Triage review-bot threads on GitHub pull requests, extract CodeRabbit
//! findings as tasks, keep generated lint configs in sync with the
//! exception registry, and report project guardrails health.

#![forbid(unsafe_code)]

mod commands;
mod gh;

use anyhow::Result;
use clap::{ArgGroup, Args, Parser, Subcommand};
use colored::Colorize;
use commands::CommandError;
use commands::comments::{CommentsAction, CommentsOptions};
use commands::generate::{GenerateMode, GenerateOptions};
use commands::review::ReviewOptions;
use gh::{GhError, GitHub, SystemGh};
use guardrails_common::config::ConfigError;
use guardrails_common::generators::GenerateError;
use guardrails_common::review::{ReviewParseError, Severity};
use guardrails_common::threads::parse_bot_filter;
use guardrails_common::{ErrorCode, GuardrailsConfig, RegistryError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "ai-guardrails")]
#[command(author, version, about = "Pedantic code enforcement for AI-maintained repositories")]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List, reply to, and resolve PR review threads from all bots
    Comments(CommentsArgs),

    /// Extract CodeRabbit review findings as a JSON task list
    Review(ReviewArgs),

    /// Check project health and configuration status
    Status(StatusArgs),

    /// Generate tool configs from .guardrails-exceptions.toml
    Generate(GenerateArgs),
}

#[derive(Args)]
#[command(group(ArgGroup::new("action").args(["reply", "resolve", "resolve_all"])))]
struct CommentsArgs {
    /// PR number (default: current branch)
    #[arg(long)]
    pr: Option<u64>,

    /// Filter by bot (comma-separated: coderabbit,claude,...)
    #[arg(short, long)]
    bot: Option<String>,

    /// Include resolved threads
    #[arg(short, long)]
    all: bool,

    /// Output full JSON instead of the compact listing
    #[arg(long)]
    json: bool,

    /// Reply to a review thread
    #[arg(long, num_args = 2, value_names = ["THREAD_ID", "BODY"])]
    reply: Option<Vec<String>>,

    /// Resolve a thread, optionally replying first: THREAD_ID [BODY]
    #[arg(long, num_args = 1..=2, value_names = ["THREAD_ID", "BODY"])]
    resolve: Option<Vec<String>>,

    /// Resolve all unresolved threads (filtered by --bot)
    #[arg(long)]
    resolve_all: bool,

    /// Reply body to post before each resolve (with --resolve-all)
    #[arg(long, requires = "resolve_all")]
    body: Option<String>,
}

impl CommentsArgs {
    fn into_options(self) -> CommentsOptions {
        let action = if let Some(mut reply) = self.reply {
            let body = reply.pop().unwrap_or_default();
            let thread_id = reply.pop().unwrap_or_default();
            CommentsAction::Reply { thread_id, body }
        } else if let Some(resolve) = self.resolve {
            let mut values = resolve.into_iter();
            CommentsAction::Resolve {
                thread_id: values.next().unwrap_or_default(),
                body: values.next(),
            }
        } else if self.resolve_all {
            CommentsAction::ResolveAll { body: self.body }
        } else {
            CommentsAction::List {
                include_resolved: self.all,
                json: self.json,
            }
        };

        CommentsOptions {
            pr: self.pr,
            bots: self.bot.as_deref().map(parse_bot_filter).unwrap_or_default(),
            action,
        }
    }
}

#[derive(Args)]
struct ReviewArgs {
    /// PR number (default: current branch)
    #[arg(long)]
    pr: Option<u64>,

    /// Minimum severity to include (critical, major, minor, suggestion)
    #[arg(short, long)]
    severity: Option<Severity>,

    /// Pretty-print JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Read review input JSON from a file ('-' for stdin) instead of GitHub
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,
}

#[derive(Args)]
struct StatusArgs {
    /// Project directory
    #[arg(default_value = ".")]
    project_dir: PathBuf,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct GenerateArgs {
    /// Project directory
    #[arg(default_value = ".")]
    project_dir: PathBuf,

    /// Validate the registry only
    #[arg(long, conflicts_with = "check")]
    dry_run: bool,

    /// Check that generated configs are up to date
    #[arg(long)]
    check: bool,
}

fn init_logging(cli: &Cli, config: &GuardrailsConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(&config.log_level.value)
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .init();
    }
}

/// Catalog code for the first error in the chain that carries one.
fn error_code(err: &anyhow::Error) -> Option<ErrorCode> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<CommandError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<GhError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<RegistryError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<ReviewParseError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<GenerateError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<ConfigError>() {
            Some(e.code())
        } else if cause.is::<serde_json::Error>() {
            Some(ErrorCode::InternalSerializationError)
        } else if cause.is::<std::io::Error>() {
            Some(ErrorCode::InternalIoError)
        } else {
            None
        }
    })
}

fn report_error(err: &anyhow::Error) {
    eprintln!("{} {err:#}", "Error:".red().bold());
    if let Some(code) = error_code(err) {
        let entry = code.entry();
        if !entry.remediation.is_empty() {
            eprintln!();
            eprintln!("[{}] {}", entry.code, "Remediation steps:".bold());
            for (i, step) in entry.remediation.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, step);
            }
        }
    }
}

fn run(cli: Cli, config: &GuardrailsConfig) -> Result<u8> {
    let github = || GitHub::new(SystemGh::new(config.gh_bin.value.clone()), config.max_thread_pages.value);

    match cli.command {
        Commands::Comments(args) => commands::comments::run(&github(), &args.into_options()),
        Commands::Review(args) => {
            let options = ReviewOptions {
                pr: args.pr,
                min_severity: args.severity,
                pretty: args.pretty,
                input: args.input,
            };
            commands::review::run(&github(), &options)
        }
        Commands::Status(args) => commands::status::run(&args.project_dir, args.json),
        Commands::Generate(args) => {
            let mode = if args.dry_run {
                GenerateMode::DryRun
            } else if args.check {
                GenerateMode::Check
            } else {
                GenerateMode::Write
            };
            commands::generate::run(&GenerateOptions {
                project_dir: args.project_dir,
                mode,
                templates_dir: Some(config.templates_dir()),
            })
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, env_errors) = match GuardrailsConfig::load() {
        Ok(loaded) => loaded,
        Err(e) => {
            report_error(&anyhow::Error::new(e));
            return ExitCode::FAILURE;
        }
    };

    if !config.color.value {
        colored::control::set_override(false);
    }
    init_logging(&cli, &config);
    for err in &env_errors {
        warn!(code = %ErrorCode::ConfigEnvError.code_string(), "{err}");
    }
    debug!(gh_bin = %config.gh_bin, log_level = %config.log_level, "Configuration resolved");

    match run(cli, &config) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}
