mod support;

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;

use support::TestBoard;

#[test]
fn taskboard_help_works() {
    Command::cargo_bin("taskboard")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("task ordering and bulk mutation"));
}

#[test]
fn subcommand_help_works() {
    let subcommands: [&[&str]; 9] = [
        &["init"],
        &["milestone"],
        &["task"],
        &["task", "add"],
        &["task", "move"],
        &["task", "reorder"],
        &["task", "bulk"],
        &["task", "list"],
        &["task", "column"],
    ];

    for cmd in subcommands {
        Command::cargo_bin("taskboard")
            .expect("binary")
            .args(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn init_is_idempotent() {
    let board = TestBoard::new();
    let first = board.json(&["init"]);
    assert_eq!(first["created"]["config"], true);
    assert_eq!(first["created"]["board"], true);
    assert!(board.file(".taskboard.toml").exists());
    assert!(board.file(".taskboard/board.json").exists());

    let second = board.json(&["init"]);
    assert_eq!(second["created"]["config"], false);
    assert_eq!(second["created"]["board"], false);
}

#[test]
fn commands_before_init_fail_with_hint() {
    let board = TestBoard::new();
    board
        .cmd()
        .args(["milestone", "list"])
        .assert()
        .code(2)
        .stderr(contains("Board not initialized"))
        .stderr(contains("taskboard init"));
}

#[test]
fn move_between_columns() {
    let board = TestBoard::init("status");
    let milestone = board.add_milestone("p1", "Sprint 1");
    let a = board.add_task("a", &milestone, &[]);
    board.add_task("b", &milestone, &[]);
    board.add_task("c", &milestone, &[]);

    let moved = board.json(&["task", "move", &a, "--status", "in_progress", "--index", "0"]);
    assert_eq!(moved["change"]["before"]["status"], "todo");
    assert_eq!(moved["change"]["after"]["status"], "in_progress");
    assert_eq!(moved["index"], 0);

    assert_eq!(board.column_titles(&milestone, "todo"), vec!["b", "c"]);
    assert_eq!(board.column_titles(&milestone, "in_progress"), vec!["a"]);
}

#[test]
fn move_clamps_index_and_renumbers_when_needed() {
    let board = TestBoard::init("status");
    let milestone = board.add_milestone("p1", "Sprint 1");
    board.add_task("a", &milestone, &[]);
    board.add_task("b", &milestone, &[]);
    let c = board.add_task("c", &milestone, &[]);

    let moved = board.json(&["task", "move", &c, "--index", "1"]);
    assert_eq!(moved["renumbered"], true);
    assert_eq!(board.column_titles(&milestone, "todo"), vec!["a", "c", "b"]);

    let moved = board.json(&["task", "move", &c, "--index", "-7"]);
    assert_eq!(moved["index"], 0);
    assert_eq!(board.column_titles(&milestone, "todo"), vec!["c", "a", "b"]);
}

#[test]
fn reorder_column_puts_listed_first() {
    let board = TestBoard::init("status");
    let milestone = board.add_milestone("p1", "Sprint 1");
    let a = board.add_task("a", &milestone, &[]);
    board.add_task("b", &milestone, &[]);
    let c = board.add_task("c", &milestone, &[]);

    board.json(&[
        "task", "reorder", &c, &a, "--milestone", &milestone, "--status", "todo",
    ]);
    assert_eq!(board.column_titles(&milestone, "todo"), vec!["c", "a", "b"]);
}

#[test]
fn bulk_update_reports_partial_failure() {
    let board = TestBoard::init("status");
    let milestone = board.add_milestone("p1", "Sprint 1");
    let a = board.add_task("a", &milestone, &[]);
    let b = board.add_task("b", &milestone, &[]);

    let outcome = board.json(&["task", "bulk", &a, &b, "missing", "--priority", "high"]);
    assert_eq!(outcome["requested"], 3);
    assert_eq!(outcome["succeeded"].as_array().map(Vec::len), Some(2));
    assert_eq!(outcome["failed"][0]["id"], "missing");
    assert_eq!(outcome["failed"][0]["reason"], "not_found");

    board
        .cmd()
        .args(["task", "bulk", &a, "--priority", "high"])
        .assert()
        .success()
        .stdout(contains("updated 1 of 1 tasks"));

    board
        .cmd()
        .args(["task", "bulk", &b, "ghost", "--status", "in_review"])
        .assert()
        .success()
        .stdout(contains("updated 1 of 2 tasks (partial)"))
        .stdout(contains("Failed:\n  ghost: not found"));
}

#[test]
fn empty_bulk_update_is_a_user_error() {
    let board = TestBoard::init("status");
    let milestone = board.add_milestone("p1", "Sprint 1");
    let a = board.add_task("a", &milestone, &[]);

    let output = board
        .cmd()
        .args(["--json", "task", "bulk", &a])
        .output()
        .expect("run taskboard");
    assert_eq!(output.status.code(), Some(2));
    let envelope: Value = serde_json::from_slice(&output.stdout).expect("json error");
    assert_eq!(envelope["status"], "error");
    assert_eq!(envelope["command"], "task bulk");
    assert_eq!(envelope["error"]["kind"], "user_error");
}

#[test]
fn unknown_status_is_rejected() {
    let board = TestBoard::init("status");
    let milestone = board.add_milestone("p1", "Sprint 1");
    let a = board.add_task("a", &milestone, &[]);
    board
        .cmd()
        .args(["task", "move", &a, "--status", "done", "--index", "0"])
        .assert()
        .code(2)
        .stderr(contains("unknown status"));
}

#[test]
fn list_uses_default_sort_and_filters() {
    let board = TestBoard::init("status");
    let milestone = board.add_milestone("p1", "Sprint 1");
    board.add_task("undated", &milestone, &["--priority", "low"]);
    board.add_task("later", &milestone, &["--priority", "high", "--due", "2024-01-02"]);
    board.add_task("sooner", &milestone, &["--priority", "high", "--due", "2024-01-01"]);

    let listed = board.json(&["task", "list", "--today", "2024-01-01"]);
    let titles: Vec<&str> = listed["tasks"]
        .as_array()
        .expect("tasks")
        .iter()
        .map(|task| task["title"].as_str().expect("title"))
        .collect();
    assert_eq!(titles, vec!["sooner", "later", "undated"]);
    assert_eq!(listed["active_filters"], 0);

    let due_today = board.json(&["task", "list", "--due", "today", "--today", "2024-01-01"]);
    assert_eq!(due_today["total"], 1);
    assert_eq!(due_today["tasks"][0]["title"], "sooner");
}

#[test]
fn delete_removes_tasks() {
    let board = TestBoard::init("status");
    let milestone = board.add_milestone("p1", "Sprint 1");
    let a = board.add_task("a", &milestone, &[]);
    board.add_task("b", &milestone, &[]);

    let outcome = board.json(&["task", "delete", &a]);
    assert_eq!(outcome["succeeded"][0], a.as_str());
    assert_eq!(board.column_titles(&milestone, "todo"), vec!["b"]);
}

#[test]
fn events_written_as_jsonl() {
    let board = TestBoard::init("status");
    let milestone = board.add_milestone("p1", "Sprint 1");
    let a = board.add_task("a", &milestone, &[]);
    let events_path = board.file("events.jsonl");
    let events_arg = events_path.display().to_string();

    board
        .cmd()
        .args(["--actor", "alice", "--events", &events_arg])
        .args(["task", "move", &a, "--status", "completed", "--index", "0"])
        .assert()
        .success();

    let content = std::fs::read_to_string(&events_path).expect("events file");
    let events: Vec<Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).expect("event json"))
        .collect();
    assert_eq!(events[0]["event"], "task_status_changed");
    assert_eq!(events[0]["actor"], "alice");
    assert_eq!(events[0]["data"]["to"], "completed");
}

#[test]
fn milestone_scope_mode_from_config() {
    let board = TestBoard::new();
    board.write_config("[ordering]\nscope = \"milestone\"\n");
    board.json(&["init"]);
    let milestone = board.add_milestone("p1", "Sprint 1");
    board.add_task("a", &milestone, &[]);
    board.add_task("b", &milestone, &["--status", "completed"]);

    let data = board.json(&["task", "column", "--milestone", &milestone]);
    assert_eq!(data["tasks"].as_array().map(Vec::len), Some(2));
    assert_eq!(data["tasks"][1]["position"], 1);
}
