//! Envelope builders and canned protocol lines.
//!
//! Tests that exercise the pipeline want explicit ids and timestamps
//! everywhere, so results stay deterministic and idempotence is checkable.

use agentline_types::{LogMsg, NormalizedEntry};
use serde_json::json;

/// Fixed base timestamp used by the builders (epoch ms).
pub const T0: i64 = 1_700_000_000_000;

pub fn stdout_msg(content: &str, id: &str) -> LogMsg {
    LogMsg::Stdout {
        content: Some(content.to_string()),
        id: Some(id.to_string()),
        timestamp: Some(T0),
    }
}

pub fn stderr_msg(content: &str, id: &str) -> LogMsg {
    LogMsg::Stderr {
        content: Some(content.to_string()),
        id: Some(id.to_string()),
        timestamp: Some(T0),
    }
}

pub fn finished_msg(exit_code: Option<i64>, id: &str) -> LogMsg {
    LogMsg::Finished {
        exit_code,
        id: Some(id.to_string()),
        timestamp: Some(T0),
    }
}

pub fn normalized_msg(entry: NormalizedEntry, id: &str) -> LogMsg {
    LogMsg::Normalized {
        entry: Some(entry),
        id: Some(id.to_string()),
        timestamp: Some(T0),
    }
}

/// Canned single lines for each supported protocol.
pub mod lines {
    use super::json;

    pub fn claude_assistant_text(text: &str) -> String {
        json!({
            "type": "assistant",
            "message": { "content": [{ "type": "text", "text": text }] }
        })
        .to_string()
    }

    pub fn claude_bash_call(tool_use_id: &str, command: &str) -> String {
        json!({
            "type": "assistant",
            "message": { "content": [{
                "type": "tool_use",
                "id": tool_use_id,
                "name": "Bash",
                "input": { "command": command }
            }] }
        })
        .to_string()
    }

    pub fn claude_tool_result(tool_use_id: &str, content: &str, is_error: bool) -> String {
        json!({
            "type": "user",
            "message": { "content": [{
                "type": "tool_result",
                "tool_use_id": tool_use_id,
                "content": content,
                "is_error": is_error
            }] }
        })
        .to_string()
    }

    pub fn codex_exec_begin(call_id: &str, command: &[&str]) -> String {
        json!({
            "type": "exec_command_begin",
            "call_id": call_id,
            "command": command,
            "cwd": "/repo"
        })
        .to_string()
    }

    pub fn codex_exec_end(call_id: &str, exit_code: i64, stdout: &str) -> String {
        json!({
            "type": "exec_command_end",
            "call_id": call_id,
            "exit_code": exit_code,
            "stdout": stdout,
            "stderr": ""
        })
        .to_string()
    }

    pub fn cursor_assistant(text: &str) -> String {
        json!({
            "type": "assistant",
            "message": { "content": [{ "text": text }] }
        })
        .to_string()
    }

    pub fn cursor_result(text: &str) -> String {
        json!({ "type": "result", "content": text }).to_string()
    }

    pub fn gemini_model(text: &str) -> String {
        json!({ "role": "model", "text": text }).to_string()
    }
}
