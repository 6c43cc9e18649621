use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// `ai-guardrails` with an isolated install dir and a clean environment.
pub fn guardrails(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ai-guardrails"));
    cmd.env("GUARDRAILS_HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("GUARDRAILS_GH_BIN")
        .env_remove("GUARDRAILS_MAX_THREAD_PAGES")
        .env_remove("GUARDRAILS_COLOR")
        .env_remove("GUARDRAILS_LOG_LEVEL");
    cmd
}

/// A scratch project directory plus a separate install dir.
pub struct TestProject {
    pub dir: TempDir,
    pub home: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        crate::test_log!("FIXTURE: Creating test project");
        Self {
            dir: TempDir::new().expect("Failed to create project dir"),
            home: TempDir::new().expect("Failed to create install dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write fixture file");
        path
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.dir.path().join(rel)).expect("Failed to read project file")
    }

    pub fn command(&self) -> Command {
        let mut cmd = guardrails(self.home.path());
        cmd.current_dir(self.dir.path());
        cmd
    }
}

/// Shell script standing in for `gh`; every call is appended to `calls.log`.
pub struct FakeGh {
    pub dir: TempDir,
    pub program: PathBuf,
}

#[cfg(unix)]
impl FakeGh {
    /// `threads_json` is the reviewThreads page returned for GraphQL queries.
    pub fn new(threads_json: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("Failed to create fake gh dir");
        fs::write(dir.path().join("threads.json"), threads_json).expect("Failed to write threads");

        let program = dir.path().join("gh");
        let script = format!(
            r#"#!/bin/sh
echo "$1 $2" >> "{dir}/calls.log"
case "$1 $2" in
  "pr view") echo 7 ;;
  "repo view") echo "octo widgets" ;;
  "api graphql")
    if echo "$@" | grep -q resolveReviewThread; then
      echo '{{}}'
    else
      cat "{dir}/threads.json"
    fi ;;
  *) echo "unexpected gh call: $*" >&2; exit 1 ;;
esac
"#,
            dir = dir.path().display()
        );
        fs::write(&program, script).expect("Failed to write fake gh");
        let mut perms = fs::metadata(&program).expect("stat fake gh").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&program, perms).expect("chmod fake gh");

        Self { dir, program }
    }

    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }
}
