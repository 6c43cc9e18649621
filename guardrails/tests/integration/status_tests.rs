use crate::common::{TestProject, assert_contains, assert_exit_code, init_test_logging};

#[test]
fn test_status_outside_git_repo_is_error() {
    init_test_logging();
    crate::test_log!("TEST START: test_status_outside_git_repo_is_error");

    let project = TestProject::new();
    let output = project.command().arg("status").output().unwrap();

    assert_exit_code(&output, 2);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "Not a git repository");
    assert_contains(&stdout, "Overall: ERROR");
    assert_contains(
        &String::from_utf8_lossy(&output.stderr),
        "[GR-E401] Guardrails health check reported problems",
    );
}

#[test]
fn test_status_json_report() {
    init_test_logging();
    let project = TestProject::new();
    std::fs::create_dir_all(project.path().join(".git")).unwrap();
    project.write("pyproject.toml", "[project]\nname = \"demo\"\n");
    project.write(".guardrails-exceptions.toml", "schema_version = 1\n");

    let output = project
        .command()
        .args(["status", "--json"])
        .arg(project.path())
        .output()
        .unwrap();

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["languages"], serde_json::json!(["python"]));
    assert_eq!(report["checks"].as_array().map(Vec::len), Some(8));
    assert_eq!(report["checks"][0]["status"], "ok");
    assert_eq!(report["checks"][4]["check"], "registry");
    assert_eq!(report["checks"][4]["status"], "ok");
    assert_eq!(report["checks"][2]["status"], "error");
    assert_eq!(report["overall"], "error");
    assert_exit_code(&output, 2);
}
