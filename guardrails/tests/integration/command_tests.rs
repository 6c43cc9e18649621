use crate::common::{assert_contains, assert_exit_code, guardrails, init_test_logging};
use tempfile::TempDir;

#[test]
fn test_help_includes_description() {
    init_test_logging();
    crate::test_log!("TEST START: test_help_includes_description");

    let home = TempDir::new().unwrap();
    let output = guardrails(home.path())
        .arg("--help")
        .output()
        .expect("Failed to run ai-guardrails --help");

    assert!(output.status.success(), "ai-guardrails --help failed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "Pedantic code enforcement");
    for sub in ["comments", "review", "status", "generate"] {
        assert_contains(&stdout, sub);
    }
    crate::test_log!("TEST PASS: test_help_includes_description");
}

#[test]
fn test_body_requires_resolve_all() {
    init_test_logging();
    let home = TempDir::new().unwrap();
    let output = guardrails(home.path())
        .args(["comments", "--body", "thanks"])
        .output()
        .expect("Failed to run ai-guardrails");

    assert!(!output.status.success());
    assert_contains(&String::from_utf8_lossy(&output.stderr), "--resolve-all");
}

#[test]
fn test_invalid_config_file_is_reported() {
    init_test_logging();
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("config.toml"), "[github\n").unwrap();

    let output = guardrails(home.path())
        .args(["status", "."])
        .output()
        .expect("Failed to run ai-guardrails");

    assert_exit_code(&output, 1);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_contains(&stderr, "Error:");
    assert_contains(&stderr, "GR-E002");
}
