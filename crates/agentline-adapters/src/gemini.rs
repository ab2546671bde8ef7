//! Gemini CLI adapter.
//!
//! The smallest protocol of the set: role-tagged message lines with `text` or
//! `content`. Everything else falls through to the envelope fallback.

use agentline_types::{EntryType, NormalizedEntry};
use serde_json::Value;

use crate::support::{LineContext, first_str, value_to_text};

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

    let entry_type = match first_str(obj, &["role"]) {
        Some("model") | Some("assistant") => EntryType::AssistantMessage,
        Some("user") => EntryType::UserMessage,
        _ => return None,
    };

    let text = obj
        .get("text")
        .or_else(|| obj.get("content"))
        .and_then(value_to_text)?;

    Some(vec![NormalizedEntry::new(
        ctx.id_base.clone(),
        entry_type,
        ctx.timestamp,
        text,
    )])
}
