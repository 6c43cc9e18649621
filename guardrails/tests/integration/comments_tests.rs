use crate::common::{FakeGh, TestProject, assert_contains, assert_exit_code, init_test_logging};

const THREADS: &str = r#"{
  "pageInfo": {"hasNextPage": false, "endCursor": null},
  "nodes": [
    {
      "id": "PRRT_open",
      "isResolved": false,
      "comments": {"totalCount": 2, "nodes": [{
        "id": "C1", "databaseId": 501, "author": {"login": "coderabbitai[bot]"},
        "body": "<!-- meta -->Guard against <b>empty</b> input.", "path": "src/parser/lexer.rs",
        "line": 88, "startLine": null, "createdAt": "2026-03-01T10:00:00Z"
      }]}
    },
    {
      "id": "PRRT_done",
      "isResolved": true,
      "comments": {"totalCount": 1, "nodes": [{
        "id": "C2", "databaseId": 502, "author": {"login": "claude"},
        "body": "Consider a smaller function.", "path": "README.md",
        "line": null, "startLine": null, "createdAt": "2026-03-01T11:00:00Z"
      }]}
    }
  ]
}"#;

#[cfg(unix)]
#[test]
fn test_comments_compact_listing() {
    init_test_logging();
    crate::test_log!("TEST START: test_comments_compact_listing");

    let project = TestProject::new();
    let gh = FakeGh::new(THREADS);
    let output = project
        .command()
        .env("GUARDRAILS_GH_BIN", &gh.program)
        .arg("comments")
        .output()
        .expect("Failed to run ai-guardrails comments");

    assert_exit_code(&output, 0);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("# 1 unresolved | coderabbit: 1\n\n"), "{stdout}");
    assert_contains(&stdout, "PRRT_open  coderabbit  lexer.rs:88  Guard against empty input.");
    assert!(!stdout.contains("PRRT_done"));
    assert_eq!(gh.calls(), vec!["pr view", "repo view", "api graphql"]);
}

#[cfg(unix)]
#[test]
fn test_comments_json_includes_resolved_with_all() {
    init_test_logging();
    let project = TestProject::new();
    let gh = FakeGh::new(THREADS);
    let output = project
        .command()
        .env("GUARDRAILS_GH_BIN", &gh.program)
        .args(["comments", "--pr", "9", "--all", "--json"])
        .output()
        .unwrap();

    assert_exit_code(&output, 0);
    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listing["summary"]["total"], 2);
    assert_eq!(listing["summary"]["unresolved"], 1);
    assert_eq!(listing["threads"][0]["comment_id"], 501);
    assert_eq!(listing["threads"][0]["reply_count"], 1);
    assert_eq!(listing["threads"][1]["line"], serde_json::Value::Null);
    assert_eq!(gh.calls(), vec!["repo view", "api graphql"]);
}

#[cfg(unix)]
#[test]
fn test_comments_resolve_all_filtered_by_bot() {
    init_test_logging();
    let project = TestProject::new();
    let gh = FakeGh::new(THREADS);
    let output = project
        .command()
        .env("GUARDRAILS_GH_BIN", &gh.program)
        .args(["comments", "--resolve-all", "--bot", "coderabbit"])
        .output()
        .unwrap();

    assert_exit_code(&output, 0);
    assert_contains(&String::from_utf8_lossy(&output.stderr), "Resolved 1 thread(s), 0 failed");
    assert_eq!(gh.calls().last().map(String::as_str), Some("api graphql"));
    assert_eq!(gh.calls().len(), 4);
}

#[cfg(unix)]
#[test]
fn test_comments_unknown_thread_fails() {
    init_test_logging();
    let project = TestProject::new();
    let gh = FakeGh::new(THREADS);
    let output = project
        .command()
        .env("GUARDRAILS_GH_BIN", &gh.program)
        .args(["comments", "--resolve", "PRRT_nope"])
        .output()
        .unwrap();

    assert_exit_code(&output, 1);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_contains(&stderr, "Thread PRRT_nope not found");
    assert_contains(&stderr, "GR-E104");
}

#[test]
fn test_comments_missing_gh_binary() {
    init_test_logging();
    let project = TestProject::new();
    let missing = project.path().join("no-such-gh");
    let output = project
        .command()
        .env("GUARDRAILS_GH_BIN", &missing)
        .arg("comments")
        .output()
        .unwrap();

    assert_exit_code(&output, 1);
    assert_contains(&String::from_utf8_lossy(&output.stderr), "GR-E100");
}
