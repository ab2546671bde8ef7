//! OpenCode adapter.
//!
//! OpenCode's event names vary across releases (`assistant` vs
//! `assistant_message`, `tool_use` vs `tool_call` vs `tool`), so dispatch
//! accepts the known synonyms. `sdk_event` wraps a nested event object that
//! is routed by whether its own discriminator mentions an error.

use agentline_types::{EntryMetadata, EntryStatus, EntryType, NormalizedEntry};
use serde_json::{Map, Value};

use crate::support::{
    LineContext, call_content, classify_tool_name, command_text, first_str, to_snake_case,
    value_to_text,
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
        Some("assistant") | Some("assistant_message") => {
            Some(message_entry(obj, ctx, EntryType::AssistantMessage).into_iter().collect())
        }
        Some("user") | Some("user_message") => {
            Some(message_entry(obj, ctx, EntryType::UserMessage).into_iter().collect())
        }
        Some("tool_use") | Some("tool_call") | Some("tool") => {
            Some(vec![tool_call_entry(obj, ctx)])
        }
        Some("tool_result") | Some("tool_output") => {
            Some(tool_result_entry(obj, ctx).into_iter().collect())
        }
        Some("error") => Some(vec![error_entry(obj, ctx, line)]),
        Some("sdk_event") => sdk_event_entry(obj, ctx, line),
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

fn extract_text(obj: &Map<String, Value>) -> Option<String> {
    ["message", "text", "content"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(value_to_text))
}

fn message_entry(
    obj: &Map<String, Value>,
    ctx: &LineContext,
    entry_type: EntryType,
) -> Option<NormalizedEntry> {
    let text = extract_text(obj)?;
    Some(NormalizedEntry::new(ctx.id_base.clone(), entry_type, ctx.timestamp, text))
}

fn tool_call_entry(obj: &Map<String, Value>, ctx: &LineContext) -> NormalizedEntry {
    let tool_name = first_str(obj, &["tool", "name", "tool_name"])
        .map(to_snake_case)
        .unwrap_or_else(|| "tool".to_string());
    let input = ["input", "args", "arguments"]
        .iter()
        .find_map(|key| obj.get(*key))
        .cloned();
    let tool_use_id = first_str(obj, &["tool_use_id", "call_id", "id"]).map(str::to_string);

    let entry_type = classify_tool_name(&tool_name);
    let content = {
        let derived = call_content(entry_type, input.as_ref());
        if derived.is_empty() || derived == "$ " {
            tool_name.clone()
        } else {
            derived
        }
    };
    let input_obj = input.as_ref().and_then(Value::as_object);
    let command = input_obj.and_then(command_text);
    let file_path = input_obj
        .and_then(|a| first_str(a, &["file_path", "path"]))
        .map(str::to_string);

    NormalizedEntry::new(ctx.id_base.clone(), entry_type, ctx.timestamp, content).with_metadata(
        EntryMetadata {
            tool_name: Some(tool_name),
            tool_input: input,
            tool_use_id,
            status: Some(EntryStatus::Pending),
            command,
            file_path,
            ..Default::default()
        },
    )
}

fn tool_result_entry(obj: &Map<String, Value>, ctx: &LineContext) -> Option<NormalizedEntry> {
    let output = ["output", "result", "content", "text"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(value_to_text))?;
    let failed = obj.get("is_error").and_then(Value::as_bool).unwrap_or(false);
    let tool_use_id = first_str(obj, &["tool_use_id", "call_id", "id"]).map(str::to_string);

    Some(
        NormalizedEntry::new(ctx.id_base.clone(), EntryType::ToolResult, ctx.timestamp, output.clone())
            .with_metadata(EntryMetadata {
                tool_output: Some(output),
                tool_use_id,
                status: Some(if failed { EntryStatus::Failed } else { EntryStatus::Success }),
                ..Default::default()
            }),
    )
}

fn error_entry(obj: &Map<String, Value>, ctx: &LineContext, line: &str) -> NormalizedEntry {
    let content = ["error", "message", "content", "text"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(value_to_text))
        .unwrap_or_else(|| line.to_string());
    NormalizedEntry::new(ctx.id_base.clone(), EntryType::Error, ctx.timestamp, content)
}

/// Unwrap the nested SDK event and route on its discriminator.
fn sdk_event_entry(
    obj: &Map<String, Value>,
    ctx: &LineContext,
    line: &str,
) -> Option<Vec<NormalizedEntry>> {
    let event = obj.get("event").and_then(Value::as_object)?;
    let discriminator = first_str(event, &["type", "name"]).unwrap_or_default();

    if discriminator.to_ascii_lowercase().contains("error") {
        return Some(vec![error_entry(event, ctx, line)]);
    }
    extract_text(event).map(|text| {
        vec![NormalizedEntry::new(
            ctx.id_base.clone(),
            EntryType::SystemMessage,
            ctx.timestamp,
            text,
        )]
    })
}
