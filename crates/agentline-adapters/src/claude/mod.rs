//! Claude Code stream-json adapter.
//!
//! Dispatches on the top-level `type` discriminator. Assistant turns unfold
//! into one entry per content block (shared timestamp, distinct ids); tool
//! results arrive either as `tool_use_result` attachments on `user` lines or
//! as `tool_result` blocks/events.

mod schema;

use agentline_types::{EntryMetadata, EntryStatus, EntryType, NormalizedEntry};
use serde_json::Value;

use crate::support::{
    LineContext, combine_output, extract_exit_code, first_str, pretty_input, value_to_text,
};
use schema::{ClaudeLine, ContentBlock, MessageContent, ResultLine, SystemLine};

/// Placeholder Claude Code emits for empty text blocks; never worth an entry.
const NO_CONTENT: &str = "(no content)";

pub(crate) fn parse_line(line: &str, ctx: &LineContext) -> Option<Vec<NormalizedEntry>> {
    let parsed: ClaudeLine = match serde_json::from_str(line) {
        Ok(parsed) => parsed,
        // Malformed or shape-mismatched line: degrade to raw text, never drop.
        Err(_) => {
            return Some(vec![NormalizedEntry::new(
                ctx.id_base.clone(),
                EntryType::SystemMessage,
                ctx.timestamp,
                line,
            )]);
        }
    };

    match parsed {
        ClaudeLine::Assistant(assistant) => {
            let Some(content) = assistant.message.and_then(|m| m.content) else {
                return Some(vec![]);
            };
            Some(assistant_entries(content, ctx))
        }
        ClaudeLine::User(user) => {
            if let Some(result) = &user.tool_use_result {
                let combined = combine_output(result.stdout.as_deref(), result.stderr.as_deref());
                if let Some(output) = combined {
                    let tool_use_id = result
                        .tool_use_id
                        .clone()
                        .or_else(|| first_block_tool_use_id(user.message.as_ref()));
                    return Some(vec![tool_result_entry(
                        ctx.id_base.clone(),
                        ctx.timestamp,
                        output,
                        tool_use_id,
                        None,
                    )]);
                }
                return Some(vec![]);
            }

            let Some(content) = user.message.and_then(|m| m.content) else {
                return Some(vec![]);
            };
            match content {
                MessageContent::Blocks(blocks) => {
                    let mut saw_tool_result = false;
                    for block in &blocks {
                        if let ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                            is_error,
                        } = block
                        {
                            saw_tool_result = true;
                            let Some(text) = content.as_ref().and_then(value_to_text) else {
                                continue;
                            };
                            let status = if is_error.unwrap_or(false) {
                                EntryStatus::Failed
                            } else {
                                EntryStatus::Success
                            };
                            return Some(vec![tool_result_entry(
                                ctx.id_base.clone(),
                                ctx.timestamp,
                                text,
                                tool_use_id.clone(),
                                Some(status),
                            )]);
                        }
                    }
                    if saw_tool_result {
                        // Result blocks existed but none carried text.
                        return Some(vec![]);
                    }
                    // No tool result block: a plain user turn echoed into the stream.
                    let Some(text) = blocks.iter().find_map(|block| match block {
                        ContentBlock::Text { text } if !text.trim().is_empty() => {
                            Some(text.trim().to_string())
                        }
                        _ => None,
                    }) else {
                        return Some(vec![]);
                    };
                    Some(vec![NormalizedEntry::new(
                        ctx.id_base.clone(),
                        EntryType::UserMessage,
                        ctx.timestamp,
                        text,
                    )])
                }
                MessageContent::Text(text) => {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        return Some(vec![]);
                    }
                    Some(vec![NormalizedEntry::new(
                        ctx.id_base.clone(),
                        EntryType::UserMessage,
                        ctx.timestamp,
                        trimmed,
                    )])
                }
            }
        }
        ClaudeLine::System(system) => system_entry(system, ctx).map(|entry| vec![entry]),
        ClaudeLine::Result(result) => Some(vec![result_entry(result, ctx)]),
        ClaudeLine::ToolUse(tool_use) => {
            let name = tool_use.name.unwrap_or_default();
            Some(vec![tool_call_entry(
                ctx.id_base.clone(),
                ctx.timestamp,
                &name,
                tool_use.input,
                tool_use.id,
            )])
        }
        ClaudeLine::ToolResult(result) => {
            let Some(text) = result
                .content
                .as_ref()
                .and_then(value_to_text)
                .or_else(|| result.output.as_ref().and_then(value_to_text))
            else {
                return Some(vec![]);
            };
            let status = if result.is_error.unwrap_or(false) {
                EntryStatus::Failed
            } else {
                EntryStatus::Success
            };
            let mut entry = tool_result_entry(
                ctx.id_base.clone(),
                ctx.timestamp,
                text.clone(),
                result.tool_use_id,
                Some(status),
            );
            if let Some(code) = extract_exit_code(&text)
                && let Some(metadata) = entry.metadata.as_mut()
            {
                metadata.exit_code = Some(code);
            }
            Some(vec![entry])
        }
        ClaudeLine::ControlResponse(_) => Some(vec![NormalizedEntry::new(
            ctx.id_base.clone(),
            EntryType::SystemMessage,
            ctx.timestamp,
            "Session initialized",
        )]),
        ClaudeLine::Unknown => None,
    }
}

/// Unfold an assistant turn: text blocks and tool_use blocks become separate
/// entries sharing the line timestamp.
fn assistant_entries(content: MessageContent, ctx: &LineContext) -> Vec<NormalizedEntry> {
    match content {
        MessageContent::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed == NO_CONTENT {
                return Vec::new();
            }
            vec![NormalizedEntry::new(
                ctx.id_base.clone(),
                EntryType::AssistantMessage,
                ctx.timestamp,
                trimmed,
            )]
        }
        MessageContent::Blocks(blocks) => {
            let mut entries = Vec::new();
            for (i, block) in blocks.into_iter().enumerate() {
                match block {
                    ContentBlock::Text { text } => {
                        let trimmed = text.trim();
                        if trimmed.is_empty() || trimmed == NO_CONTENT {
                            continue;
                        }
                        entries.push(NormalizedEntry::new(
                            ctx.child_id(&format!("text-{i}")),
                            EntryType::AssistantMessage,
                            ctx.timestamp,
                            trimmed,
                        ));
                    }
                    ContentBlock::ToolUse { id, name, input } => {
                        let name = name.unwrap_or_default();
                        entries.push(tool_call_entry(
                            ctx.child_id(&format!("tool-{i}")),
                            ctx.timestamp,
                            &name,
                            input,
                            id,
                        ));
                    }
                    ContentBlock::ToolResult { .. } | ContentBlock::Unknown => {}
                }
            }
            entries
        }
    }
}

/// Map a tool invocation to its canonical entry kind and display content.
fn tool_call_entry(
    id: String,
    timestamp: i64,
    name: &str,
    input: Option<Value>,
    tool_use_id: Option<String>,
) -> NormalizedEntry {
    let lower = name.to_ascii_lowercase();
    let entry_type = match lower.as_str() {
        "bash" | "execute" => EntryType::CommandRun,
        "edit" | "write" => EntryType::FileEdit,
        "read" => EntryType::FileRead,
        _ => EntryType::ToolUse,
    };

    let input_obj = input.as_ref().and_then(Value::as_object);
    let command = input_obj.and_then(|obj| first_str(obj, &["command"])).map(str::to_string);
    let file_path = input_obj
        .and_then(|obj| first_str(obj, &["file_path", "path"]))
        .map(str::to_string);

    let content = match entry_type {
        EntryType::CommandRun => format!("$ {}", command.clone().unwrap_or_default()),
        EntryType::FileRead | EntryType::FileEdit => file_path
            .clone()
            .unwrap_or_else(|| input.as_ref().map(pretty_input).unwrap_or_default()),
        _ => input.as_ref().map(pretty_input).unwrap_or_default(),
    };

    NormalizedEntry::new(id, entry_type, timestamp, content).with_metadata(EntryMetadata {
        tool_name: Some(name.to_string()),
        tool_input: input,
        tool_use_id,
        status: Some(EntryStatus::Pending),
        command,
        file_path,
        ..Default::default()
    })
}

fn tool_result_entry(
    id: String,
    timestamp: i64,
    output: String,
    tool_use_id: Option<String>,
    status: Option<EntryStatus>,
) -> NormalizedEntry {
    NormalizedEntry::new(id, EntryType::ToolResult, timestamp, output.clone()).with_metadata(
        EntryMetadata {
            tool_output: Some(output),
            tool_use_id,
            status,
            ..Default::default()
        },
    )
}

fn system_entry(system: SystemLine, ctx: &LineContext) -> Option<NormalizedEntry> {
    let content = if system.subtype.as_deref() == Some("init") {
        format!(
            "System initialized with model: {}",
            system.model.as_deref().unwrap_or("unknown")
        )
    } else if let Some(content) = system.content.filter(|c| !c.trim().is_empty()) {
        content
    } else if let Some(subtype) = system.subtype.filter(|s| !s.is_empty()) {
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

/// Final `result` line: `✓ Completed in 3.5s ($0.0142)`.
fn result_entry(result: ResultLine, ctx: &LineContext) -> NormalizedEntry {
    let success = result.subtype.as_deref() == Some("success");
    let mut content = format!("{} Completed", if success { "✓" } else { "✗" });
    if let Some(ms) = result.duration_ms {
        content.push_str(&format!(" in {:.1}s", ms / 1000.0));
    }
    if let Some(cost) = result.total_cost_usd {
        content.push_str(&format!(" (${cost:.4})"));
    }

    NormalizedEntry::new(ctx.id_base.clone(), EntryType::SystemMessage, ctx.timestamp, content)
        .with_metadata(EntryMetadata {
            success: Some(success),
            ..Default::default()
        })
}

fn first_block_tool_use_id(message: Option<&schema::ClaudeMessage>) -> Option<String> {
    let MessageContent::Blocks(blocks) = message?.content.as_ref()? else {
        return None;
    };
    blocks.iter().find_map(|block| match block {
        ContentBlock::ToolResult { tool_use_id, .. } => tool_use_id.clone(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> LineContext {
        LineContext::new("m1", 1_700_000_000_000)
    }

    fn parse(line: &str) -> Option<Vec<NormalizedEntry>> {
        parse_line(line, &ctx())
    }

    #[test]
    fn test_assistant_text_block() {
        let entries = parse(r#"{"type":"assistant","message":{"content":[{"type":"text","text":"hello"}]}}"#)
            .expect("entries");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_type, EntryType::AssistantMessage);
        assert_eq!(entries[0].content, "hello");
        assert_eq!(entries[0].id, "m1-text-0");
    }

    #[test]
    fn test_assistant_no_content_placeholder_skipped() {
        let entries = parse(
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"(no content)"}]}}"#,
        )
        .expect("entries");
        assert!(entries.is_empty());
    }

    #[test]
    fn test_assistant_multi_block_shares_timestamp() {
        let entries = parse(
            r#"{"type":"assistant","message":{"content":[
                {"type":"text","text":"running it"},
                {"type":"tool_use","id":"toolu_1","name":"Bash","input":{"command":"cargo test"}}
            ]}}"#,
        )
        .expect("entries");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].timestamp, entries[1].timestamp);
        assert_ne!(entries[0].id, entries[1].id);

        assert_eq!(entries[1].entry_type, EntryType::CommandRun);
        assert_eq!(entries[1].content, "$ cargo test");
        let metadata = entries[1].metadata.as_ref().expect("metadata");
        assert_eq!(metadata.tool_use_id.as_deref(), Some("toolu_1"));
        assert_eq!(metadata.status, Some(EntryStatus::Pending));
        assert_eq!(metadata.command.as_deref(), Some("cargo test"));
    }

    #[test]
    fn test_assistant_plain_string_content() {
        let entries =
            parse(r#"{"type":"assistant","message":{"content":"just text"}}"#).expect("entries");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_type, EntryType::AssistantMessage);
        assert_eq!(entries[0].content, "just text");
    }

    #[test]
    fn test_file_tools_map_to_file_entry_kinds() {
        let entries = parse(
            r#"{"type":"assistant","message":{"content":[
                {"type":"tool_use","id":"t1","name":"Read","input":{"file_path":"src/main.rs"}},
                {"type":"tool_use","id":"t2","name":"Edit","input":{"file_path":"src/lib.rs"}},
                {"type":"tool_use","id":"t3","name":"Grep","input":{"pattern":"fn"}}
            ]}}"#,
        )
        .expect("entries");
        assert_eq!(entries[0].entry_type, EntryType::FileRead);
        assert_eq!(entries[0].content, "src/main.rs");
        assert_eq!(entries[1].entry_type, EntryType::FileEdit);
        assert_eq!(entries[2].entry_type, EntryType::ToolUse);
        assert!(entries[2].content.contains("pattern"));
    }

    #[test]
    fn test_user_tool_use_result_concatenates_streams() {
        let entries = parse(
            r#"{"type":"user","tool_use_result":{"stdout":"ok\n","stderr":"warn","tool_use_id":"toolu_9"}}"#,
        )
        .expect("entries");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_type, EntryType::ToolResult);
        assert_eq!(entries[0].content, "ok\n\nwarn");
        assert_eq!(entries[0].tool_use_id(), Some("toolu_9"));
    }

    #[test]
    fn test_user_tool_use_result_blank_yields_nothing() {
        let entries =
            parse(r#"{"type":"user","tool_use_result":{"stdout":"  \n","stderr":""}}"#).expect("entries");
        assert!(entries.is_empty());
    }

    #[test]
    fn test_user_tool_result_block_error_status() {
        let entries = parse(
            r#"{"type":"user","message":{"content":[
                {"type":"tool_result","tool_use_id":"toolu_2","content":"boom","is_error":true}
            ]}}"#,
        )
        .expect("entries");
        assert_eq!(entries[0].entry_type, EntryType::ToolResult);
        let metadata = entries[0].metadata.as_ref().expect("metadata");
        assert_eq!(metadata.status, Some(EntryStatus::Failed));
        assert_eq!(metadata.tool_use_id.as_deref(), Some("toolu_2"));
    }

    #[test]
    fn test_system_init_banner() {
        let entries =
            parse(r#"{"type":"system","subtype":"init","model":"claude-sonnet-4-5"}"#).expect("entries");
        assert_eq!(entries[0].content, "System initialized with model: claude-sonnet-4-5");
    }

    #[test]
    fn test_system_subtype_fallback() {
        let entries = parse(r#"{"type":"system","subtype":"compact_boundary"}"#).expect("entries");
        assert_eq!(entries[0].content, "System: compact_boundary");
    }

    #[test]
    fn test_result_line_composition() {
        let entries = parse(
            r#"{"type":"result","subtype":"success","duration_ms":3500,"total_cost_usd":0.0142}"#,
        )
        .expect("entries");
        assert_eq!(entries[0].content, "✓ Completed in 3.5s ($0.0142)");
        assert_eq!(entries[0].metadata.as_ref().unwrap().success, Some(true));
    }

    #[test]
    fn test_flat_tool_result_exit_code_heuristic() {
        let entries = parse(
            r#"{"type":"tool_result","tool_use_id":"t1","content":"done\n[Process exited with code 2]"}"#,
        )
        .expect("entries");
        let metadata = entries[0].metadata.as_ref().expect("metadata");
        assert_eq!(metadata.exit_code, Some(2));
        assert_eq!(metadata.status, Some(EntryStatus::Success));
    }

    #[test]
    fn test_control_response_fixed_banner() {
        let entries = parse(r#"{"type":"control_response","response":{}}"#).expect("entries");
        assert_eq!(entries[0].content, "Session initialized");
        assert_eq!(entries[0].entry_type, EntryType::SystemMessage);
    }

    #[test]
    fn test_unknown_type_yields_none() {
        assert!(parse(r#"{"type":"telemetry","payload":{}}"#).is_none());
    }

    #[test]
    fn test_invalid_json_degrades_to_raw_system_message() {
        let entries = parse("not json at all").expect("entries");
        assert_eq!(entries[0].entry_type, EntryType::SystemMessage);
        assert_eq!(entries[0].content, "not json at all");
    }
}
