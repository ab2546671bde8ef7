// Shared line-parsing primitives.
//
// Rationale for a single module:
//   Every adapter reads the same kinds of semi-structured shapes: string-or-
//   block-list message content, optional discriminators, tool argument bags.
//   The helpers live here once; each adapter is a strategy built on top of
//   them instead of a copy-pasted variant.

use std::sync::LazyLock;

use agentline_types::EntryType;
use regex::Regex;
use serde_json::{Map, Value};

/// Per-line parse context handed to every adapter.
///
/// `id_base` is the envelope id (or a synthesized `entry-{index}`); adapters
/// derive their entry ids from it, suffixing when one line yields several
/// entries. `timestamp` is already resolved from the envelope or the clock.
#[derive(Debug, Clone)]
pub struct LineContext {
    pub id_base: String,
    pub timestamp: i64,
}

impl LineContext {
    pub fn new(id_base: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id_base: id_base.into(),
            timestamp,
        }
    }

    /// Derive a suffixed entry id, e.g. `{base}-text-0`.
    pub fn child_id(&self, suffix: &str) -> String {
        format!("{}-{}", self.id_base, suffix)
    }
}

/// Best-effort exit-code extraction from tool output text.
///
/// Matches the literal `[Process exited with code N]` marker some CLIs embed
/// in result payloads. This is enrichment, not a guaranteed signal; keep the
/// pattern loose.
static PROCESS_EXIT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[Process exited with code (\d+)\]").expect("valid regex"));

pub fn extract_exit_code(output: &str) -> Option<i64> {
    PROCESS_EXIT_CODE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

// --- Value accessors ---

/// First non-empty string found under any of `keys`, tried in order.
pub fn first_str<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

// --- Content stringification ---

/// Flatten a message-content value into display text.
///
/// Accepts a plain string, an array of parts (strings or objects carrying
/// `text`/`content`), or an object carrying `text`/`content`. Returns None
/// when nothing textual can be derived.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Array(parts) => {
            let texts: Vec<String> = parts.iter().filter_map(value_to_text).collect();
            (!texts.is_empty()).then(|| texts.join("\n"))
        }
        Value::Object(obj) => obj
            .get("text")
            .or_else(|| obj.get("content"))
            .and_then(value_to_text),
        _ => None,
    }
}

/// Pretty-print a tool input bag for display when no better summary exists.
pub fn pretty_input(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Join stdout and stderr (stderr on a new line) and trim; None when the
/// combination is blank.
pub fn combine_output(stdout: Option<&str>, stderr: Option<&str>) -> Option<String> {
    let mut combined = String::new();
    if let Some(out) = stdout {
        combined.push_str(out);
    }
    if let Some(err) = stderr
        && !err.trim().is_empty()
    {
        if !combined.is_empty() {
            combined.push('\n');
        }
        combined.push_str(err);
    }

    let trimmed = combined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// --- Tool-name handling ---

/// Convert a camelCase/PascalCase tool name to snake_case.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Keyword heuristic mapping a normalized tool name to an entry kind.
///
/// Shared by the Cursor Agent and OpenCode adapters, which surface free-form
/// tool names rather than a fixed tool set.
pub fn classify_tool_name(name: &str) -> EntryType {
    let lower = name.to_ascii_lowercase();
    let has = |needle: &str| lower.contains(needle);

    if has("bash") || has("shell") || has("command") || has("exec") {
        EntryType::CommandRun
    } else if has("read") || has("ls") || has("cat") || has("open") {
        EntryType::FileRead
    } else if has("write") || has("edit") || has("patch") || has("apply") {
        EntryType::FileEdit
    } else {
        EntryType::ToolUse
    }
}

/// Display content for a call entry: commands render as `$ cmd`, file
/// operations render as the path, anything else as pretty-printed input.
pub fn call_content(entry_type: EntryType, input: Option<&Value>) -> String {
    let input_obj = input.and_then(Value::as_object);
    match entry_type {
        EntryType::CommandRun => {
            let command = input_obj
                .and_then(|obj| command_text(obj))
                .unwrap_or_default();
            format!("$ {command}")
        }
        EntryType::FileRead | EntryType::FileEdit => input_obj
            .and_then(|obj| first_str(obj, &["file_path", "path", "filePath"]))
            .map(|p| p.to_string())
            .unwrap_or_else(|| input.map(pretty_input).unwrap_or_default()),
        _ => input.map(pretty_input).unwrap_or_default(),
    }
}

/// Command string from an argument bag: accepts a plain string or an argv
/// array under `command`/`cmd`.
pub fn command_text(obj: &Map<String, Value>) -> Option<String> {
    let value = obj.get("command").or_else(|| obj.get("cmd"))?;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => {
            let words: Vec<&str> = parts.iter().filter_map(Value::as_str).collect();
            (!words.is_empty()).then(|| words.join(" "))
        }
        _ => None,
    }
}
