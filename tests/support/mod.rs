#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// A board root in a temporary directory, driven through the binary.
pub struct TestBoard {
    dir: TempDir,
}

impl TestBoard {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    /// Create a board and run `taskboard init` with the given scope mode.
    pub fn init(scope: &str) -> Self {
        let board = Self::new();
        board
            .cmd()
            .args(["init", "--scope", scope])
            .assert()
            .success();
        board
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, rel_path: &str) -> PathBuf {
        self.dir.path().join(rel_path)
    }

    pub fn write_config(&self, contents: &str) {
        fs::write(self.file(".taskboard.toml"), contents).expect("write config");
    }

    /// The binary with `--root` pointing at this board.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("taskboard").expect("binary");
        cmd.env_remove("TASKBOARD_ROOT")
            .env_remove("TASKBOARD_ACTOR")
            .env_remove("RUST_LOG")
            .arg("--root")
            .arg(self.dir.path());
        cmd
    }

    /// Run a command with `--json` and return the `data` payload.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .arg("--json")
            .args(args)
            .output()
            .expect("run taskboard");
        assert!(
            output.status.success(),
            "taskboard {args:?} failed: {}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let envelope: Value = serde_json::from_slice(&output.stdout).expect("json output");
        assert_eq!(envelope["status"], "success");
        envelope["data"].clone()
    }

    pub fn add_milestone(&self, project: &str, name: &str) -> String {
        let data = self.json(&["milestone", "add", project, name]);
        data["id"].as_str().expect("milestone id").to_string()
    }

    pub fn add_task(&self, title: &str, milestone: &str, extra: &[&str]) -> String {
        let mut args = vec!["task", "add", title, "--milestone", milestone];
        args.extend_from_slice(extra);
        let data = self.json(&args);
        data["id"].as_str().expect("task id").to_string()
    }

    /// Task titles of a column in display order.
    pub fn column_titles(&self, milestone: &str, status: &str) -> Vec<String> {
        let data = self.json(&["task", "column", "--milestone", milestone, "--status", status]);
        data["tasks"]
            .as_array()
            .expect("tasks")
            .iter()
            .map(|task| task["title"].as_str().expect("title").to_string())
            .collect()
    }
}
