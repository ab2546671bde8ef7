use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// NOTE: Schema Design Goals
//
// 1. Normalization: Abstract per-CLI protocol quirks into one typed event record
//    - Claude Code: Unfold multi-block assistant messages into sequential entries
//    - Codex: Align begin/end lifecycle pairs via a shared correlation key
//    - Cursor Agent: Tag synthetic end-of-turn summaries so they can be suppressed
//
// 2. Display: Entries carry everything the timeline renderer needs inline
//    (content string first, structured detail in metadata)
//
// 3. Immutability: A completed tool invocation is a *new* tool_result entry
//    correlated via tool_use_id, never an in-place update of the call entry
//
// NOTE: Intentional Limitations (Not Goals)
//
// - No schema validation against upstream protocol specs; fields are read defensively
// - No streaming/incremental guarantees; the pipeline re-parses the whole buffer
// - No cross-restart identity; ids are unique within one parse of one session

/// Canonical event kind shared by every adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    AssistantMessage,
    UserMessage,
    SystemMessage,
    ToolUse,
    ToolResult,
    CommandRun,
    FileEdit,
    FileRead,
    Error,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::AssistantMessage => "assistant_message",
            EntryType::UserMessage => "user_message",
            EntryType::SystemMessage => "system_message",
            EntryType::ToolUse => "tool_use",
            EntryType::ToolResult => "tool_result",
            EntryType::CommandRun => "command_run",
            EntryType::FileEdit => "file_edit",
            EntryType::FileRead => "file_read",
            EntryType::Error => "error",
        }
    }

    /// Call-shaped entry kinds: anything that can own a correlated tool_result.
    pub fn is_tool_call(&self) -> bool {
        matches!(
            self,
            EntryType::ToolUse | EntryType::CommandRun | EntryType::FileEdit | EntryType::FileRead
        )
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a tool invocation or its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Running,
    Success,
    Failed,
}

/// Open metadata bag attached to an entry.
///
/// Recognized fields are typed; everything else a tool emits survives in
/// `extra`. Serialized in camelCase because that is the wire shape the
/// rendering collaborator consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<String>,

    /// Correlation key linking a tool invocation to its eventual result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EntryStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,

    /// Explicit ordering key used to merge interleaved output streams.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,

    /// Cursor Agent end-of-turn summary marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_result: Option<bool>,

    /// Tool-defined extension fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Canonical, tool-agnostic event record produced by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEntry {
    /// Unique within one parse of one session's buffer.
    ///
    /// Deserialization is lenient: pre-normalized entries delivered without an
    /// id (empty) or timestamp (zero) get both synthesized from their envelope
    /// by the pipeline.
    #[serde(default)]
    pub id: String,

    #[serde(rename = "type")]
    pub entry_type: EntryType,

    /// Epoch milliseconds.
    #[serde(default)]
    pub timestamp: i64,

    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EntryMetadata>,
}

impl NormalizedEntry {
    pub fn new(id: impl Into<String>, entry_type: EntryType, timestamp: i64, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entry_type,
            timestamp,
            content: content.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: EntryMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Correlation key, when the entry carries one.
    pub fn tool_use_id(&self) -> Option<&str> {
        self.metadata.as_ref()?.tool_use_id.as_deref()
    }
}
