use std::io::Write;

use agentline_adapters::{Tool, normalize_session, read_session_file};
use agentline_types::EntryType;

#[test]
fn test_recording_round_trip() -> anyhow::Result<()> {
    let inner = serde_json::json!({
        "type": "assistant",
        "message": { "content": [{ "type": "text", "text": "hi" }] }
    });
    let stdout_env = serde_json::json!({
        "type": "stdout",
        "content": inner.to_string(),
        "id": "m1",
        "timestamp": 1_700_000_000_000_i64
    });
    let finished_env = serde_json::json!({
        "type": "finished",
        "exit_code": 0,
        "id": "m2",
        "timestamp": 1_700_000_001_000_i64
    });

    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "{stdout_env}")?;
    writeln!(file)?;
    writeln!(file, "{finished_env}")?;

    let msgs = read_session_file(file.path())?;
    assert_eq!(msgs.len(), 2);

    let entries = normalize_session(&Tool::from_id("claude-code"), &msgs);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].entry_type, EntryType::AssistantMessage);
    assert_eq!(entries[0].content, "hi");
    assert_eq!(entries[1].content, "Process exited with code 0");
    Ok(())
}

#[test]
fn test_malformed_recording_lines_survive_as_stdout() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "this is not an envelope")?;

    let msgs = read_session_file(file.path())?;
    assert_eq!(msgs.len(), 1);

    // The damaged line still reaches the timeline through the raw fallback.
    let entries = normalize_session(&Tool::from_id("codex"), &msgs);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].entry_type, EntryType::SystemMessage);
    assert_eq!(entries[0].content, "this is not an envelope");
    Ok(())
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(read_session_file(std::path::Path::new("/nonexistent/session.jsonl")).is_err());
}
