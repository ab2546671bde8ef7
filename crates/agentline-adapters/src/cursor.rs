//! Cursor Agent adapter.
//!
//! Cursor wraps each tool invocation in a single-key `tool_call` object whose
//! key names the tool (`readToolCall`, `shellToolCall`, ...). The end-of-turn
//! `result` event duplicates the assistant transcript, so entries born from it
//! are tagged `is_result` and suppressed once a live assistant message exists
//! anywhere in the parsed stream.

use agentline_types::{EntryMetadata, EntryStatus, EntryType, NormalizedEntry};
use serde_json::{Map, Value};

use crate::support::{
    LineContext, call_content, classify_tool_name, command_text, first_str, pretty_input,
    to_snake_case, value_to_text,
};

pub(crate) fn parse_line(line: &str, ctx: &LineContext) -> Option<Vec<NormalizedEntry>> {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(_) => {
            return Some(vec![NormalizedEntry::new(
                ctx.id_base.clone(),
                EntryType::SystemMessage,
                ctx.timestamp,
                line,
            )]);
        }
    };
    let obj = value.as_object()?;

    match first_str(obj, &["type"]) {
        Some("assistant") => Some(message_entry(obj, ctx, EntryType::AssistantMessage).into_iter().collect()),
        Some("user") => Some(message_entry(obj, ctx, EntryType::UserMessage).into_iter().collect()),
        Some("system") => system_entry(obj, ctx).map(|entry| vec![entry]),
        Some("tool_call") => tool_call_entry(obj, ctx).map(|entry| vec![entry]),
        Some("result") => Some(vec![result_entry(obj, ctx)]),
        Some("error") => Some(vec![error_entry(obj, ctx, line)]),
        _ if obj.get("is_error").and_then(Value::as_bool).unwrap_or(false) => {
            Some(vec![error_entry(obj, ctx, line)])
        }
        _ => extract_text(obj).map(|text| {
            vec![NormalizedEntry::new(
                ctx.id_base.clone(),
                EntryType::SystemMessage,
                ctx.timestamp,
                text,
            )]
        }),
    }
}

/// Hide the synthetic end-of-turn summary once a live transcript exists.
///
/// Pure post-pass over the entire parsed stream; correctness depends on
/// seeing every entry parsed so far, so it must never become incremental.
pub(crate) fn suppress_redundant_results(entries: &mut Vec<NormalizedEntry>) {
    let has_live_assistant = entries.iter().any(|entry| {
        entry.entry_type == EntryType::AssistantMessage && !is_result(entry)
    });
    if has_live_assistant {
        entries.retain(|entry| !is_result(entry));
    }
}

fn is_result(entry: &NormalizedEntry) -> bool {
    entry
        .metadata
        .as_ref()
        .and_then(|m| m.is_result)
        .unwrap_or(false)
}

fn message_entry(
    obj: &Map<String, Value>,
    ctx: &LineContext,
    entry_type: EntryType,
) -> Option<NormalizedEntry> {
    let text = extract_text(obj)?;
    Some(NormalizedEntry::new(ctx.id_base.clone(), entry_type, ctx.timestamp, text))
}

/// Message text from `message.content` parts, or plain `content`/`text`.
fn extract_text(obj: &Map<String, Value>) -> Option<String> {
    if let Some(message) = obj.get("message").and_then(Value::as_object)
        && let Some(text) = message.get("content").and_then(value_to_text)
    {
        return Some(text);
    }
    obj.get("content")
        .or_else(|| obj.get("text"))
        .and_then(value_to_text)
}

fn system_entry(obj: &Map<String, Value>, ctx: &LineContext) -> Option<NormalizedEntry> {
    let subtype = first_str(obj, &["subtype"]);
    let content = if subtype == Some("init") {
        format!(
            "System initialized with model: {}",
            first_str(obj, &["model"]).unwrap_or("unknown")
        )
    } else if let Some(content) = first_str(obj, &["content"]) {
        content.to_string()
    } else if let Some(subtype) = subtype {
        format!("System: {subtype}")
    } else {
        return None;
    };

    Some(NormalizedEntry::new(
        ctx.id_base.clone(),
        EntryType::SystemMessage,
        ctx.timestamp,
        content,
    ))
}

fn tool_call_entry(obj: &Map<String, Value>, ctx: &LineContext) -> Option<NormalizedEntry> {
    let call = obj
        .get("tool_call")
        .or_else(|| obj.get("toolCall"))
        .and_then(Value::as_object)?;
    // The wrapper object carries exactly one key: the tool name.
    let (raw_name, body) = call.iter().next()?;
    let tool_name = to_snake_case(raw_name.strip_suffix("ToolCall").unwrap_or(raw_name));
    let body = body.as_object();

    let args = body.and_then(|b| b.get("args").or_else(|| b.get("input"))).cloned();
    let result = body.and_then(|b| b.get("result").or_else(|| b.get("output")));
    let tool_use_id = first_str(obj, &["call_id", "callId", "id"]).map(str::to_string);
    let subtype = first_str(obj, &["subtype"]);

    if subtype == Some("completed") {
        let failed = obj.get("is_error") == Some(&Value::Bool(true))
            || result.and_then(Value::as_object).is_some_and(|r| r.contains_key("error"));
        let output = result.and_then(value_to_text);
        let content = output
            .clone()
            .or_else(|| result.map(pretty_input))
            .unwrap_or_else(|| tool_name.clone());

        return Some(
            NormalizedEntry::new(ctx.id_base.clone(), EntryType::ToolResult, ctx.timestamp, content)
                .with_metadata(EntryMetadata {
                    tool_name: Some(tool_name),
                    tool_output: output,
                    tool_use_id,
                    status: Some(if failed { EntryStatus::Failed } else { EntryStatus::Success }),
                    ..Default::default()
                }),
        );
    }

    let entry_type = classify_tool_name(&tool_name);
    let status = if subtype == Some("started") {
        EntryStatus::Running
    } else {
        EntryStatus::Pending
    };
    let content = call_content(entry_type, args.as_ref());
    let args_obj = args.as_ref().and_then(Value::as_object);
    let command = args_obj.and_then(command_text);
    let file_path = args_obj
        .and_then(|a| first_str(a, &["file_path", "path"]))
        .map(str::to_string);

    Some(
        NormalizedEntry::new(ctx.id_base.clone(), entry_type, ctx.timestamp, content).with_metadata(
            EntryMetadata {
                tool_name: Some(tool_name),
                tool_input: args,
                tool_use_id,
                status: Some(status),
                command,
                file_path,
                ..Default::default()
            },
        ),
    )
}

/// End-of-turn summary; tagged so the session post-filter can drop it when a
/// live transcript exists.
fn result_entry(obj: &Map<String, Value>, ctx: &LineContext) -> NormalizedEntry {
    let metadata = EntryMetadata {
        is_result: Some(true),
        ..Default::default()
    };

    match extract_text(obj).or_else(|| obj.get("result").and_then(value_to_text)) {
        Some(text) => {
            NormalizedEntry::new(ctx.id_base.clone(), EntryType::AssistantMessage, ctx.timestamp, text)
                .with_metadata(metadata)
        }
        None => NormalizedEntry::new(
            ctx.id_base.clone(),
            EntryType::SystemMessage,
            ctx.timestamp,
            "Completed",
        )
        .with_metadata(metadata),
    }
}

fn error_entry(obj: &Map<String, Value>, ctx: &LineContext, line: &str) -> NormalizedEntry {
    let content = ["error", "message", "content", "text"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(value_to_text))
        .unwrap_or_else(|| line.to_string());
    NormalizedEntry::new(ctx.id_base.clone(), EntryType::Error, ctx.timestamp, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> LineContext {
        LineContext::new("u1", 1_700_000_000_000)
    }

    fn parse(line: &str) -> Option<Vec<NormalizedEntry>> {
        parse_line(line, &ctx())
    }

    #[test]
    fn test_assistant_message_from_parts() {
        let entries = parse(
            r#"{"type":"assistant","message":{"content":[{"text":"part one"},{"text":"part two"}]}}"#,
        )
        .expect("entries");
        assert_eq!(entries[0].entry_type, EntryType::AssistantMessage);
        assert_eq!(entries[0].content, "part one\npart two");
    }

    #[test]
    fn test_assistant_empty_content_dropped() {
        let entries = parse(r#"{"type":"assistant","message":{"content":[]}}"#).expect("entries");
        assert!(entries.is_empty());
    }

    #[test]
    fn test_tool_call_started_shell() {
        let entries = parse(
            r#"{"type":"tool_call","subtype":"started","call_id":"tc-1",
                "tool_call":{"shellToolCall":{"args":{"command":"npm test"}}}}"#,
        )
        .expect("entries");
        assert_eq!(entries[0].entry_type, EntryType::CommandRun);
        assert_eq!(entries[0].content, "$ npm test");

        let metadata = entries[0].metadata.as_ref().expect("metadata");
        assert_eq!(metadata.tool_name.as_deref(), Some("shell"));
        assert_eq!(metadata.status, Some(EntryStatus::Running));
        assert_eq!(metadata.tool_use_id.as_deref(), Some("tc-1"));
    }

    #[test]
    fn test_tool_call_name_snake_cased() {
        let entries = parse(
            r#"{"type":"tool_call","subtype":"started","tool_call":{"readFileToolCall":{"args":{"path":"a.rs"}}}}"#,
        )
        .expect("entries");
        let metadata = entries[0].metadata.as_ref().expect("metadata");
        assert_eq!(metadata.tool_name.as_deref(), Some("read_file"));
        assert_eq!(entries[0].entry_type, EntryType::FileRead);
        assert_eq!(entries[0].content, "a.rs");
    }

    #[test]
    fn test_tool_call_completed_success() {
        let entries = parse(
            r#"{"type":"tool_call","subtype":"completed","call_id":"tc-1",
                "tool_call":{"shellToolCall":{"result":{"output":"done"}}}}"#,
        )
        .expect("entries");
        assert_eq!(entries[0].entry_type, EntryType::ToolResult);
        let metadata = entries[0].metadata.as_ref().expect("metadata");
        assert_eq!(metadata.status, Some(EntryStatus::Success));
        assert_eq!(metadata.tool_use_id.as_deref(), Some("tc-1"));
    }

    #[test]
    fn test_tool_call_completed_with_error_field_fails() {
        let entries = parse(
            r#"{"type":"tool_call","subtype":"completed",
                "tool_call":{"shellToolCall":{"result":{"error":"denied"}}}}"#,
        )
        .expect("entries");
        let metadata = entries[0].metadata.as_ref().expect("metadata");
        assert_eq!(metadata.status, Some(EntryStatus::Failed));
    }

    #[test]
    fn test_result_tagged_is_result() {
        let entries = parse(r#"{"type":"result","content":"summary of the turn"}"#).expect("entries");
        assert_eq!(entries[0].entry_type, EntryType::AssistantMessage);
        assert_eq!(entries[0].metadata.as_ref().unwrap().is_result, Some(true));
    }

    #[test]
    fn test_result_without_text_is_completed_banner() {
        let entries = parse(r#"{"type":"result"}"#).expect("entries");
        assert_eq!(entries[0].entry_type, EntryType::SystemMessage);
        assert_eq!(entries[0].content, "Completed");
        assert_eq!(entries[0].metadata.as_ref().unwrap().is_result, Some(true));
    }

    #[test]
    fn test_error_type() {
        let entries = parse(r#"{"type":"error","message":"model overloaded"}"#).expect("entries");
        assert_eq!(entries[0].entry_type, EntryType::Error);
        assert_eq!(entries[0].content, "model overloaded");
    }

    #[test]
    fn test_suppress_redundant_results() {
        let live = NormalizedEntry::new("a", EntryType::AssistantMessage, 1, "live");
        let summary = NormalizedEntry::new("b", EntryType::AssistantMessage, 2, "summary")
            .with_metadata(EntryMetadata {
                is_result: Some(true),
                ..Default::default()
            });

        let mut entries = vec![live.clone(), summary.clone()];
        suppress_redundant_results(&mut entries);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "a");

        // Without a live assistant message the summary stays.
        let mut entries = vec![summary];
        suppress_redundant_results(&mut entries);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "b");
    }

    #[test]
    fn test_unknown_type_with_text_surfaces() {
        let entries = parse(r#"{"type":"status","text":"indexing workspace"}"#).expect("entries");
        assert_eq!(entries[0].entry_type, EntryType::SystemMessage);
        assert_eq!(entries[0].content, "indexing workspace");
    }

    #[test]
    fn test_unknown_type_without_text_yields_none() {
        assert!(parse(r#"{"type":"heartbeat","seq":42}"#).is_none());
    }
}
