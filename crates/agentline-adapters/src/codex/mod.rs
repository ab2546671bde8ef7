//! Codex adapter.
//!
//! Codex is event-sourced: a command is an `exec_command_begin` followed by an
//! `exec_command_end` sharing a `call_id`, and newer protocol versions carry
//! the same lifecycle inside `item_*` events keyed off the item status. Begin
//! and end become independent entries; the correlator joins them later via
//! `tool_use_id`. Batched notifications (`events`/`initial_messages`/
//! `messages`) unfold recursively through the same parser.

mod extract;

use agentline_types::{EntryMetadata, EntryStatus, EntryType, NormalizedEntry};
use serde_json::{Map, Value, json};

use crate::support::{LineContext, combine_output, value_to_text};
use extract::{extract_content, find_bool, find_field, find_i64, find_object, find_str};

pub(crate) fn parse_line(line: &str, ctx: &LineContext) -> Option<Vec<NormalizedEntry>> {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(_) => return Some(vec![raw_system_message(line, ctx)]),
    };
    if !value.is_object() {
        return Some(vec![raw_system_message(line, ctx)]);
    }

    parse_event(&value, ctx)
}

fn parse_event(value: &Value, ctx: &LineContext) -> Option<Vec<NormalizedEntry>> {
    let obj = value.as_object()?;

    // Batched sub-events unfold first; each child runs through this parser
    // with a suffixed id base so ids stay unique.
    if let Some(batch) = find_batch(obj) {
        let mut entries = Vec::new();
        for (i, sub) in batch.iter().enumerate() {
            let child_ctx = LineContext::new(ctx.child_id(&i.to_string()), ctx.timestamp);
            if let Some(sub_entries) = parse_event(sub, &child_ctx) {
                entries.extend(sub_entries);
            }
        }
        return Some(entries);
    }

    let event_type = normalized_event_type(obj)?;

    match event_type.as_str() {
        "exec_command_begin" => Some(command_begin_entry(obj, ctx).into_iter().collect()),
        "exec_command_end" => Some(command_end_entry(obj, ctx).into_iter().collect()),
        "patch_apply_begin" => Some(vec![patch_begin_entry(obj, ctx)]),
        "patch_apply_end" => Some(vec![patch_end_entry(obj, ctx)]),
        "thread_started" => Some(vec![system(ctx, "Thread started")]),
        "turn_started" => Some(vec![system(ctx, "Turn started")]),
        "turn_completed" => Some(vec![turn_completed_entry(obj, ctx)]),
        "agent_message" | "agent_message_delta" | "assistant_message" | "message" | "response" => {
            Some(message_entry(obj, ctx, EntryType::AssistantMessage).into_iter().collect())
        }
        "user_message" | "user" => {
            Some(message_entry(obj, ctx, EntryType::UserMessage).into_iter().collect())
        }
        "task_started" | "task_complete" | "task_completed" => {
            Some(vec![system(ctx, &title_case(&event_type))])
        }
        _ if event_type.starts_with("item_") => item_entries(obj, ctx),
        _ if event_type.contains("error") => Some(vec![
            NormalizedEntry::new(
                ctx.id_base.clone(),
                EntryType::Error,
                ctx.timestamp,
                extract_content(obj).unwrap_or_else(|| title_case(&event_type)),
            ),
        ]),
        _ if event_type.contains("warning") => Some(vec![system(
            ctx,
            &extract_content(obj).unwrap_or_else(|| title_case(&event_type)),
        )]),
        _ => extract_content(obj).map(|text| vec![system(ctx, &text)]),
    }
}

/// Batched sub-event array, probed across protocol generations.
fn find_batch(obj: &Map<String, Value>) -> Option<&Vec<Value>> {
    const BATCH_KEYS: [&str; 3] = ["events", "initial_messages", "messages"];

    for container in extract::candidate_objects(obj) {
        for key in BATCH_KEYS {
            if let Some(batch) = container.get(key).and_then(Value::as_array) {
                return Some(batch);
            }
        }
    }
    None
}

/// Discriminator under `type`/`event`/`method`, lowercased with dots folded
/// to underscores so JSON-RPC method names line up with event names.
fn normalized_event_type(obj: &Map<String, Value>) -> Option<String> {
    ["type", "event", "method"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(|raw| raw.to_ascii_lowercase().replace('.', "_"))
}

fn command_begin_entry(obj: &Map<String, Value>, ctx: &LineContext) -> Option<NormalizedEntry> {
    let call_id = find_str(obj, "call_id").map(str::to_string);
    let command = find_field(obj, "command")
        .and_then(command_value_text)
        .filter(|c| !c.is_empty())?;
    let cwd = find_str(obj, "cwd").map(str::to_string);

    let mut tool_input = json!({ "command": command.clone() });
    if let Some(cwd) = &cwd
        && let Some(map) = tool_input.as_object_mut()
    {
        map.insert("cwd".to_string(), Value::String(cwd.clone()));
    }

    Some(
        NormalizedEntry::new(ctx.id_base.clone(), EntryType::CommandRun, ctx.timestamp, &command)
            .with_metadata(EntryMetadata {
                tool_name: Some("shell".to_string()),
                tool_input: Some(tool_input),
                tool_use_id: call_id,
                status: Some(EntryStatus::Running),
                command: Some(command),
                ..Default::default()
            }),
    )
}

fn command_end_entry(obj: &Map<String, Value>, ctx: &LineContext) -> Option<NormalizedEntry> {
    let call_id = find_str(obj, "call_id").map(str::to_string);
    let exit_code = find_i64(obj, "exit_code");
    let output = command_output(obj)?;
    let status = if exit_code == Some(0) {
        EntryStatus::Success
    } else {
        EntryStatus::Failed
    };

    Some(
        NormalizedEntry::new(ctx.id_base.clone(), EntryType::ToolResult, ctx.timestamp, &output)
            .with_metadata(EntryMetadata {
                tool_output: Some(output),
                tool_use_id: call_id,
                status: Some(status),
                exit_code,
                ..Default::default()
            }),
    )
}

/// Aggregated/formatted output when present, else stdout + stderr.
fn command_output(obj: &Map<String, Value>) -> Option<String> {
    for key in ["aggregated_output", "formatted_output"] {
        if let Some(output) = find_str(obj, key) {
            let trimmed = output.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    combine_output(find_str(obj, "stdout"), find_str(obj, "stderr"))
}

/// `item_*` events: the nested item decides everything; the event name only
/// says that something about an item happened.
fn item_entries(obj: &Map<String, Value>, ctx: &LineContext) -> Option<Vec<NormalizedEntry>> {
    let item = find_object(obj, "item")?;
    let kind = ["type", "kind"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .map(|k| k.to_ascii_lowercase())
        .unwrap_or_default();

    if kind.contains("reasoning") {
        // Chain-of-thought items never render.
        return Some(vec![]);
    }

    if kind.contains("command") || kind.contains("exec") {
        return Some(command_item_entry(item, ctx).into_iter().collect());
    }

    if kind.contains("tool") {
        return Some(vec![tool_item_entry(item, ctx)]);
    }

    if kind.starts_with("agent") || kind.starts_with("assistant") {
        return Some(item_message(item, ctx, EntryType::AssistantMessage).into_iter().collect());
    }
    if kind.starts_with("user") {
        return Some(item_message(item, ctx, EntryType::UserMessage).into_iter().collect());
    }

    item_text(item).map(|text| vec![system(ctx, &text)])
}

/// Command items reuse the begin/end split, keyed off the item status instead
/// of the event name.
fn command_item_entry(item: &Map<String, Value>, ctx: &LineContext) -> Option<NormalizedEntry> {
    let status = item
        .get("status")
        .and_then(Value::as_str)
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();
    let exit_code = item.get("exit_code").and_then(Value::as_i64);
    let call_id = ["id", "call_id"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .map(str::to_string);

    let completed = exit_code.is_some() || status == "completed" || status == "failed";
    if !completed {
        let command = item.get("command").and_then(command_value_text).filter(|c| !c.is_empty())?;
        return Some(
            NormalizedEntry::new(ctx.id_base.clone(), EntryType::CommandRun, ctx.timestamp, &command)
                .with_metadata(EntryMetadata {
                    tool_name: Some("shell".to_string()),
                    tool_input: Some(json!({ "command": command.clone() })),
                    tool_use_id: call_id,
                    status: Some(EntryStatus::Running),
                    command: Some(command),
                    ..Default::default()
                }),
        );
    }

    let output = ["aggregated_output", "output", "stdout"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())?;
    let success = exit_code.map(|code| code == 0).unwrap_or(status == "completed");

    Some(
        NormalizedEntry::new(ctx.id_base.clone(), EntryType::ToolResult, ctx.timestamp, &output)
            .with_metadata(EntryMetadata {
                tool_output: Some(output),
                tool_use_id: call_id,
                status: Some(if success { EntryStatus::Success } else { EntryStatus::Failed }),
                exit_code,
                ..Default::default()
            }),
    )
}

fn tool_item_entry(item: &Map<String, Value>, ctx: &LineContext) -> NormalizedEntry {
    let name = ["tool", "name", "tool_name"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .unwrap_or("tool")
        .to_string();
    let input = ["input", "args", "arguments"]
        .iter()
        .find_map(|key| item.get(*key))
        .cloned();
    let call_id = ["id", "call_id"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .map(str::to_string);
    let status = match item.get("status").and_then(Value::as_str) {
        Some("in_progress") | Some("running") => EntryStatus::Running,
        Some("completed") => EntryStatus::Success,
        Some("failed") => EntryStatus::Failed,
        _ => EntryStatus::Pending,
    };

    let content = input
        .as_ref()
        .map(crate::support::pretty_input)
        .unwrap_or_else(|| name.clone());

    NormalizedEntry::new(ctx.id_base.clone(), EntryType::ToolUse, ctx.timestamp, content)
        .with_metadata(EntryMetadata {
            tool_name: Some(name),
            tool_input: input,
            tool_use_id: call_id,
            status: Some(status),
            ..Default::default()
        })
}

fn item_message(
    item: &Map<String, Value>,
    ctx: &LineContext,
    entry_type: EntryType,
) -> Option<NormalizedEntry> {
    let text = item_text(item)?;
    Some(NormalizedEntry::new(ctx.id_base.clone(), entry_type, ctx.timestamp, text))
}

fn item_text(item: &Map<String, Value>) -> Option<String> {
    ["text", "content", "message"]
        .iter()
        .find_map(|key| item.get(*key).and_then(value_to_text))
}

fn patch_begin_entry(obj: &Map<String, Value>, ctx: &LineContext) -> NormalizedEntry {
    let content = match find_object(obj, "changes") {
        Some(changes) if changes.len() == 1 => "Applying patch (1 file)".to_string(),
        Some(changes) => format!("Applying patch ({} files)", changes.len()),
        None => "Applying patch".to_string(),
    };
    system(ctx, &content)
}

fn patch_end_entry(obj: &Map<String, Value>, ctx: &LineContext) -> NormalizedEntry {
    let success = find_bool(obj, "success").unwrap_or(false);
    let label = if success { "Patch applied" } else { "Patch failed" };
    let detail = ["stdout", "stderr"]
        .iter()
        .find_map(|key| find_str(obj, key))
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let content = match detail {
        Some(detail) => format!("{label}: {detail}"),
        None => label.to_string(),
    };
    system(ctx, &content)
}

fn turn_completed_entry(obj: &Map<String, Value>, ctx: &LineContext) -> NormalizedEntry {
    let Some(usage) = find_object(obj, "usage") else {
        return system(ctx, "Turn completed");
    };

    let mut parts = Vec::new();
    for (key, label) in [
        ("input_tokens", "input"),
        ("cached_input_tokens", "cached input"),
        ("output_tokens", "output"),
    ] {
        if let Some(count) = usage.get(key).and_then(Value::as_i64) {
            parts.push(format!("{label} {count}"));
        }
    }

    if parts.is_empty() {
        system(ctx, "Turn completed")
    } else {
        system(ctx, &format!("Turn completed ({} tokens)", parts.join(", ")))
    }
}

fn message_entry(
    obj: &Map<String, Value>,
    ctx: &LineContext,
    entry_type: EntryType,
) -> Option<NormalizedEntry> {
    let text = extract_content(obj)?;
    Some(NormalizedEntry::new(ctx.id_base.clone(), entry_type, ctx.timestamp, text))
}

fn system(ctx: &LineContext, content: &str) -> NormalizedEntry {
    NormalizedEntry::new(ctx.id_base.clone(), EntryType::SystemMessage, ctx.timestamp, content)
}

fn raw_system_message(line: &str, ctx: &LineContext) -> NormalizedEntry {
    NormalizedEntry::new(ctx.id_base.clone(), EntryType::SystemMessage, ctx.timestamp, line)
}

/// Command may be a plain string or an argv array.
fn command_value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => {
            let words: Vec<&str> = parts.iter().filter_map(Value::as_str).collect();
            (!words.is_empty()).then(|| words.join(" "))
        }
        _ => None,
    }
}

fn title_case(event_type: &str) -> String {
    let spaced = event_type.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
