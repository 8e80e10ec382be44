//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_focusdesk"))
        .args(args)
        .env("FOCUSDESK_DATA_DIR", data_dir)
        .env_remove("FOCUSDESK_LOG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

/// Parse stdout that may hold several pretty-printed JSON documents.
fn json_docs(stdout: &str) -> Vec<Value> {
    serde_json::Deserializer::from_str(stdout)
        .into_iter::<Value>()
        .collect::<Result<_, _>>()
        .expect("stdout is not JSON")
}

fn add_task(dir: &Path, title: &str, estimate: Option<&str>) -> String {
    let mut args = vec!["task", "add", title];
    if let Some(e) = estimate {
        args.extend(["--estimate", e]);
    }
    let (code, stdout, stderr) = run_cli(dir, &args);
    assert_eq!(code, 0, "task add failed: {stderr}");
    let task = &json_docs(&stdout)[0];
    task["id"].as_str().unwrap().to_string()
}

#[test]
fn test_task_add_and_list() {
    let dir = TempDir::new().unwrap();
    let id = add_task(dir.path(), "Write report", Some("30"));

    let (code, stdout, _) = run_cli(dir.path(), &["task", "list", "--json"]);
    assert_eq!(code, 0);
    let tasks = &json_docs(&stdout)[0];
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["id"], id.as_str());
    assert_eq!(tasks[0]["estimate_minutes"], 30);
    assert_eq!(tasks[0]["status"], "todo");
}

#[test]
fn test_task_done_unknown_id_fails() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["task", "done", "missing"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_timer_start_stop_records_session() {
    let dir = TempDir::new().unwrap();
    let id = add_task(dir.path(), "Timed", None);

    let (code, stdout, stderr) = run_cli(dir.path(), &["timer", "start", &id]);
    assert_eq!(code, 0, "timer start failed: {stderr}");
    let started = &json_docs(&stdout)[0];
    assert_eq!(started["type"], "timer_started");
    assert_eq!(started["task_id"], id.as_str());

    let (code, stdout, _) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0);
    let snapshot = json_docs(&stdout).pop().unwrap();
    assert_eq!(snapshot["task_id"], id.as_str());
    assert_eq!(snapshot["is_running"], true);

    let (code, stdout, stderr) = run_cli(dir.path(), &["timer", "stop"]);
    assert_eq!(code, 0, "timer stop failed: {stderr}");
    let session = &json_docs(&stdout)[0];
    assert_eq!(session["task_id"], id.as_str());
    assert_eq!(session["mode"], "continuous");

    let (code, stdout, _) = run_cli(dir.path(), &["session", "list", "--json"]);
    assert_eq!(code, 0);
    let sessions = &json_docs(&stdout)[0];
    let sessions = sessions.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["id"], session["id"]);

    // A second stop is a no-op.
    let (code, stdout, _) = run_cli(dir.path(), &["timer", "stop"]);
    assert_eq!(code, 0);
    assert_eq!(json_docs(&stdout)[0]["type"], "timer_idle");
}

#[test]
fn test_timer_pause_then_resume() {
    let dir = TempDir::new().unwrap();
    let id = add_task(dir.path(), "Pausable", Some("10"));

    let (code, _, _) = run_cli(dir.path(), &["timer", "start", &id, "--mode", "countdown"]);
    assert_eq!(code, 0);

    let (code, stdout, _) = run_cli(dir.path(), &["timer", "pause"]);
    assert_eq!(code, 0);
    assert_eq!(json_docs(&stdout)[0]["type"], "timer_paused");

    let (code, stdout, _) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0);
    let snapshot = json_docs(&stdout).pop().unwrap();
    assert_eq!(snapshot["is_running"], false);
    assert_eq!(snapshot["target_secs"], 600);

    let (code, stdout, _) = run_cli(dir.path(), &["timer", "resume"]);
    assert_eq!(code, 0);
    let resumed = &json_docs(&stdout)[0];
    assert_eq!(resumed["type"], "timer_started");
    assert_eq!(resumed["resumed"], true);
}

#[test]
fn test_timer_invalid_mode_rejected() {
    let dir = TempDir::new().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["timer", "start", "t1", "--mode", "sprint"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_roundtrip() {
    let dir = TempDir::new().unwrap();

    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.pomodoro_work_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "timer.pomodoro_work_minutes", "50"]);
    assert_eq!(code, 0);

    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.pomodoro_work_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "50");

    let (code, _, stderr) = run_cli(dir.path(), &["config", "get", "timer.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_list_json_and_reset() {
    let dir = TempDir::new().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["config", "set", "notifications.enable_sounds", "false"]);
    assert_eq!(code, 0);

    let (code, stdout, _) = run_cli(dir.path(), &["config", "list", "--json"]);
    assert_eq!(code, 0);
    let config = &json_docs(&stdout)[0];
    assert_eq!(config["notifications"]["enable_sounds"], false);
    assert_eq!(config["timer"]["pomodoro_long_break_after"], 4);

    let (code, _, _) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "notifications.enable_sounds"]);
    assert_eq!(stdout.trim(), "true");
}

#[test]
fn test_config_set_rejects_bad_value() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "set", "timer.pomodoro_long_break_after", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.pomodoro_long_break_after"]);
    assert_eq!(stdout.trim(), "4");
}
