use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn write_recording() -> tempfile::NamedTempFile {
    let begin = serde_json::json!({
        "type": "stdout",
        "content": serde_json::json!({
            "type": "exec_command_begin",
            "call_id": "c1",
            "command": ["echo", "hi"]
        })
        .to_string(),
        "id": "m1",
        "timestamp": 1_700_000_000_000_i64
    });
    let end = serde_json::json!({
        "type": "stdout",
        "content": serde_json::json!({
            "type": "exec_command_end",
            "call_id": "c1",
            "exit_code": 0,
            "stdout": "hi\n"
        })
        .to_string(),
        "id": "m2",
        "timestamp": 1_700_000_000_500_i64
    });
    let finished = serde_json::json!({
        "type": "finished",
        "exit_code": 0,
        "id": "m3",
        "timestamp": 1_700_000_001_000_i64
    });

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    for line in [begin, end, finished] {
        writeln!(file, "{line}").expect("write line");
    }
    file
}

#[test]
fn test_json_output_contains_normalized_entries() {
    let file = write_recording();

    let output = Command::cargo_bin("agentline-debug")
        .expect("binary")
        .arg(file.path())
        .args(["--tool", "codex", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let entries: serde_json::Value = serde_json::from_slice(&output).expect("json array");
    let entries = entries.as_array().expect("array");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["type"], "command_run");
    assert_eq!(entries[0]["content"], "echo hi");
    assert_eq!(entries[1]["type"], "tool_result");
    assert_eq!(entries[2]["content"], "Process exited with code 0");
}

#[test]
fn test_timeline_output_folds_result_under_call() {
    let file = write_recording();

    Command::cargo_bin("agentline-debug")
        .expect("binary")
        .arg(file.path())
        .args(["--tool", "codex"])
        .assert()
        .success()
        .stdout(predicate::str::contains("command_run"))
        .stdout(predicate::str::contains("tool_result"))
        .stdout(predicate::str::contains("Process exited with code 0"));
}

#[test]
fn test_missing_file_fails() {
    Command::cargo_bin("agentline-debug")
        .expect("binary")
        .arg("/nonexistent/session.jsonl")
        .args(["--tool", "codex"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}
