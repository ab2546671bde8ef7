use serde::Deserialize;
use serde_json::Value;

/// One stdout line of the Claude Code stream-json protocol.
///
/// Fields are read defensively: everything optional, unknown discriminators
/// collapse into `Unknown`. A line that fails to decode entirely degrades to
/// a raw system message upstream.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub(crate) enum ClaudeLine {
    Assistant(MessageLine),
    User(UserLine),
    System(SystemLine),
    Result(ResultLine),
    ToolUse(FlatToolUse),
    ToolResult(FlatToolResult),
    ControlResponse(ControlResponseLine),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageLine {
    #[serde(default)]
    pub message: Option<ClaudeMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserLine {
    #[serde(default)]
    pub message: Option<ClaudeMessage>,
    #[serde(default)]
    pub tool_use_result: Option<ToolUseResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClaudeMessage {
    #[serde(default)]
    pub content: Option<MessageContent>,
}

/// `message.content` is either a plain string or a block list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub(crate) enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        input: Option<Value>,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: Option<String>,
        #[serde(default)]
        content: Option<Value>,
        #[serde(default)]
        is_error: Option<bool>,
    },
    #[serde(other)]
    Unknown,
}

/// Synthetic result attachment on `user` lines (command echoes).
#[derive(Debug, Deserialize)]
pub(crate) struct ToolUseResult {
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub tool_use_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SystemLine {
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultLine {
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<f64>,
    #[serde(default)]
    pub total_cost_usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FlatToolUse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub input: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FlatToolResult {
    #[serde(default)]
    pub tool_use_id: Option<String>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub is_error: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ControlResponseLine {}
