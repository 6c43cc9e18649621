use crate::common::{TestProject, assert_contains, assert_exit_code, assert_path_exists, init_test_logging};

const REGISTRY: &str = r#"
schema_version = 1

[global.markdownlint]
MD013 = "long tables in docs"

[global.codespell]
skip = ["*.lock"]
ignore_words = ["crate"]
"#;

const BASE_MARKDOWNLINT: &str = "// shipped defaults\n{\n  \"default\": true\n}\n";

#[test]
fn test_generate_writes_and_checks_configs() {
    init_test_logging();
    crate::test_log!("TEST START: test_generate_writes_and_checks_configs");

    let project = TestProject::new();
    project.write(".guardrails-exceptions.toml", REGISTRY);
    std::fs::create_dir_all(project.home.path().join("configs")).unwrap();
    std::fs::write(
        project.home.path().join("configs/.markdownlint.jsonc"),
        BASE_MARKDOWNLINT,
    )
    .unwrap();

    let check = project.command().args(["generate", "--check"]).output().unwrap();
    assert_exit_code(&check, 1);
    let stderr = String::from_utf8_lossy(&check.stderr);
    assert_contains(&stderr, "Missing generated configs:\n  - .markdownlint.jsonc\n  - .codespellrc");
    assert_contains(&stderr, "GR-E304");
    assert!(check.stdout.is_empty());

    let write = project.command().arg("generate").output().unwrap();
    assert_exit_code(&write, 0);
    let stdout = String::from_utf8_lossy(&write.stdout);
    assert_contains(&stdout, "  ✓ .codespellrc");
    assert_contains(&stdout, "Configs generated from .guardrails-exceptions.toml");
    assert_path_exists(&project.path().join(".markdownlint.jsonc"));

    let codespell = project.read(".codespellrc");
    assert_contains(&codespell, "skip = *.lock\nignore-words-list = crate\n");
    assert_contains(&project.read(".markdownlint.jsonc"), "\"MD013\": false");

    let recheck = project.command().args(["generate", "--check"]).output().unwrap();
    assert_exit_code(&recheck, 0);
    assert_contains(
        &String::from_utf8_lossy(&recheck.stdout),
        "All generated configs are up to date.",
    );

    project.write(".codespellrc", "[codespell]\n");
    let stale = project.command().args(["generate", "--check"]).output().unwrap();
    assert_exit_code(&stale, 1);
    assert_contains(
        &String::from_utf8_lossy(&stale.stderr),
        "Stale generated configs (out of sync with registry):\n  - .codespellrc",
    );
}

#[test]
fn test_generate_dry_run_and_missing_registry() {
    init_test_logging();
    let project = TestProject::new();

    let missing = project.command().args(["generate", "--dry-run"]).output().unwrap();
    assert_exit_code(&missing, 1);
    assert_contains(
        &String::from_utf8_lossy(&missing.stderr),
        ".guardrails-exceptions.toml not found in",
    );

    project.write(".guardrails-exceptions.toml", REGISTRY);
    let valid = project.command().args(["generate", "--dry-run"]).output().unwrap();
    assert_exit_code(&valid, 0);
    assert_contains(&String::from_utf8_lossy(&valid.stdout), "Registry is valid.");
}

#[test]
fn test_generate_reports_validation_errors() {
    init_test_logging();
    let project = TestProject::new();
    project.write(
        ".guardrails-exceptions.toml",
        "schema_version = 1\n\n[[inline_suppressions]]\npattern = \"noqa\"\nglob = \"*.py\"\nreason = \"legacy\"\nexpires = 2020-01-01\n",
    );

    let output = project
        .command()
        .args(["generate"])
        .arg(project.path())
        .output()
        .unwrap();
    assert_exit_code(&output, 1);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_contains(&stderr, "Validation errors in");
    assert_contains(&stderr, "inline_suppressions[0]: expired on 2020-01-01 (pattern=noqa)");
    assert_contains(&stderr, "GR-E303");
}
