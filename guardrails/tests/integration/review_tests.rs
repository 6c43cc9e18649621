use crate::common::{TestProject, assert_contains, assert_exit_code, init_test_logging};
use std::io::Write;
use std::process::Stdio;

const INPUT: &str = r#"{
  "threads": [
    {"path": "src/api.py", "line": 12, "body": "_⚠️ Potential issue_ | _🔴 Critical_\n\n**SQL injection in query builder.**\n\nUse parameters.", "id": "PRRT_1"},
    {"path": "src/api.py", "line": 30, "body": "🟢 Nit\n\n**Prefer f-strings.**"}
  ],
  "review_bodies": []
}"#;

#[test]
fn test_review_from_file_with_severity_filter() {
    init_test_logging();
    crate::test_log!("TEST START: test_review_from_file_with_severity_filter");

    let project = TestProject::new();
    let input = project.write("review.json", INPUT);
    let output = project
        .command()
        .args(["review", "--severity", "major", "--input"])
        .arg(&input)
        .output()
        .expect("Failed to run ai-guardrails review");

    assert_exit_code(&output, 0);
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["total"], 1);
    assert_eq!(report["tasks"][0]["id"], "task-001");
    assert_eq!(report["tasks"][0]["severity"], "critical");
    assert_eq!(report["tasks"][0]["thread_id"], "PRRT_1");
    assert_eq!(report["summary"]["by_severity"]["suggestion"], 0);
}

#[test]
fn test_review_from_stdin() {
    init_test_logging();
    let project = TestProject::new();
    let mut child = project
        .command()
        .args(["review", "--input", "-", "--pretty"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn ai-guardrails review");
    child.stdin.take().unwrap().write_all(INPUT.as_bytes()).unwrap();
    let output = child.wait_with_output().unwrap();

    assert_exit_code(&output, 0);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("{\n  \"tasks\""), "{stdout}");
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["summary"]["total"], 2);
}

#[test]
fn test_review_invalid_input_reports_catalog_code() {
    init_test_logging();
    let project = TestProject::new();
    let input = project.write("review.json", "[not json");
    let output = project
        .command()
        .args(["review", "--input"])
        .arg(&input)
        .output()
        .unwrap();

    assert_exit_code(&output, 1);
    assert!(String::from_utf8_lossy(&output.stderr).contains("GR-E201"));
}

#[cfg(unix)]
#[test]
fn test_review_from_github_warns_when_reviews_fetch_fails() {
    use crate::common::FakeGh;

    init_test_logging();
    let threads = r#"{
  "pageInfo": {"hasNextPage": false, "endCursor": null},
  "nodes": [{
    "id": "PRRT_cr",
    "isResolved": false,
    "comments": {"totalCount": 1, "nodes": [{
      "id": "C9", "databaseId": 901, "author": {"login": "coderabbitai[bot]"},
      "body": "_🟠 Major_\n\n**Close the file handle.**\n\nLeaks on error.", "path": "src/io.rs",
      "line": 14, "startLine": null, "createdAt": "2026-03-02T09:00:00Z"
    }]}
  }]
}"#;
    let project = TestProject::new();
    let gh = FakeGh::new(threads);
    let output = project
        .command()
        .env("GUARDRAILS_GH_BIN", &gh.program)
        .arg("review")
        .output()
        .unwrap();

    assert_exit_code(&output, 0);
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["tasks"][0]["title"], "Close the file handle.");
    assert_eq!(report["tasks"][0]["thread_id"], "PRRT_cr");
    assert_eq!(report["summary"]["total"], 1);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_contains(&stderr, "Failed to fetch PR reviews");
    assert_contains(&stderr, "GR-E101");
}
