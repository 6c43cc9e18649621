//! `ai-guardrails generate`: derive tool configs from the exception registry.

use super::CommandError;
use super::helpers::{bullet_lines, move_file};
use anyhow::{Context, Result};
use guardrails_common::generators::{self, GeneratedFile};
use guardrails_common::{ErrorCode, ExceptionRegistry, REGISTRY_FILENAME};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerateMode {
    #[default]
    Write,
    /// Validate the registry only.
    DryRun,
    /// Compare generated output with the files on disk.
    Check,
}

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub project_dir: PathBuf,
    pub mode: GenerateMode,
    /// `<install dir>/configs`, searched after the project's own `configs/`.
    pub templates_dir: Option<PathBuf>,
}

/// Files that differ between a fresh generation and the project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Freshness {
    pub missing: Vec<String>,
    pub stale: Vec<String>,
}

impl Freshness {
    pub fn is_current(&self) -> bool {
        self.missing.is_empty() && self.stale.is_empty()
    }
}

/// Load the registry and fail on any validation error.
pub fn load_valid_registry(project_dir: &Path) -> Result<ExceptionRegistry> {
    let path = project_dir.join(REGISTRY_FILENAME);
    if !path.is_file() {
        return Err(CommandError::RegistryNotFound {
            dir: project_dir.to_path_buf(),
        }
        .into());
    }

    let registry =
        ExceptionRegistry::load(&path).with_context(|| format!("Failed to load {}", path.display()))?;
    let errors = registry.validate();
    if !errors.is_empty() {
        return Err(CommandError::RegistryValidation { path, errors }.into());
    }
    Ok(registry)
}

fn write_files(files: &[GeneratedFile], dir: &Path) -> Result<()> {
    for file in files {
        let path = dir.join(file.name);
        fs::write(&path, &file.content).with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Generate into a scratch directory and compare with `project_dir`.
pub fn check_freshness(files: &[GeneratedFile], project_dir: &Path) -> Result<Freshness> {
    let scratch = tempfile::TempDir::new().context("Failed to create temporary directory")?;
    write_files(files, scratch.path())?;

    let mut freshness = Freshness::default();
    for file in files {
        let generated = fs::read(scratch.path().join(file.name))?;
        match fs::read(project_dir.join(file.name)) {
            Ok(existing) if existing == generated => {}
            Ok(_) => freshness.stale.push(file.name.to_string()),
            Err(_) => freshness.missing.push(file.name.to_string()),
        }
    }
    Ok(freshness)
}

/// Generate into a scratch directory inside the project, then move each file into place.
pub fn write_configs(files: &[GeneratedFile], project_dir: &Path) -> Result<()> {
    let scratch = tempfile::Builder::new()
        .prefix(".guardrails-generate")
        .tempdir_in(project_dir)
        .context("Failed to create temporary directory")?;
    write_files(files, scratch.path())?;

    for file in files {
        let target = project_dir.join(file.name);
        move_file(&scratch.path().join(file.name), &target)
            .with_context(|| format!("Failed to install {}", target.display()))?;
        debug!(file = file.name, "Installed generated config");
    }
    Ok(())
}

pub fn run(options: &GenerateOptions) -> Result<u8> {
    let project_dir = &options.project_dir;
    let registry = load_valid_registry(project_dir)?;

    if options.mode == GenerateMode::DryRun {
        println!("Registry is valid.");
        return Ok(0);
    }

    let files = generators::generate_all(&registry, project_dir, options.templates_dir.as_deref())?;
    info!(count = files.len(), "Rendered generated configs");

    if options.mode == GenerateMode::Check {
        let freshness = check_freshness(&files, project_dir)?;
        if freshness.is_current() {
            println!("All generated configs are up to date.");
            return Ok(0);
        }
        if !freshness.missing.is_empty() {
            eprintln!("Missing generated configs:\n{}", bullet_lines(&freshness.missing));
        }
        if !freshness.stale.is_empty() {
            eprintln!(
                "Stale generated configs (out of sync with registry):\n{}",
                bullet_lines(&freshness.stale)
            );
        }
        let entry = ErrorCode::GeneratedConfigsOutOfSync.entry();
        eprintln!("{}", entry.format_brief());
        for step in &entry.remediation {
            eprintln!("  {step}");
        }
        return Ok(1);
    }

    write_configs(&files, project_dir)?;
    for file in &files {
        println!("  ✓ {}", file.name);
    }
    println!("Configs generated from {REGISTRY_FILENAME}");
    Ok(0)
}
