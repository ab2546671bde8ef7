use agentline_types::NormalizedEntry;

use crate::support::LineContext;
use crate::{claude, codex, cursor, gemini, opencode};

#[derive(Debug, Clone)]
pub struct ToolMetadata {
    pub id: &'static str,
    pub display_name: &'static str,
}

const TOOLS: &[ToolMetadata] = &[
    ToolMetadata {
        id: "claude-code",
        display_name: "Claude Code",
    },
    ToolMetadata {
        id: "codex",
        display_name: "Codex",
    },
    ToolMetadata {
        id: "cursor-agent",
        display_name: "Cursor Agent",
    },
    ToolMetadata {
        id: "opencode",
        display_name: "OpenCode",
    },
    ToolMetadata {
        id: "gemini-cli",
        display_name: "Gemini CLI",
    },
];

pub fn known_tools() -> &'static [ToolMetadata] {
    TOOLS
}

pub fn get_tool_ids() -> Vec<&'static str> {
    TOOLS.iter().map(|t| t.id).collect()
}

pub fn get_tool_metadata(id: &str) -> Option<&'static ToolMetadata> {
    TOOLS.iter().find(|t| t.id == id)
}

/// Tagged-union dispatch on the external tool identifier.
///
/// One variant per supported CLI protocol; anything else routes to the
/// unknown-tool fallback, which attempts no JSON parsing at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tool {
    ClaudeCode,
    Codex,
    CursorAgent,
    Opencode,
    GeminiCli,
    Unknown(String),
}

impl Tool {
    pub fn from_id(id: &str) -> Self {
        match id {
            "claude-code" | "claude" => Tool::ClaudeCode,
            "codex" => Tool::Codex,
            "cursor-agent" | "cursor" => Tool::CursorAgent,
            "opencode" => Tool::Opencode,
            "gemini-cli" | "gemini" => Tool::GeminiCli,
            other => Tool::Unknown(other.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Tool::ClaudeCode => "claude-code",
            Tool::Codex => "codex",
            Tool::CursorAgent => "cursor-agent",
            Tool::Opencode => "opencode",
            Tool::GeminiCli => "gemini-cli",
            Tool::Unknown(id) => id,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Tool::Unknown(id) => id,
            known => get_tool_metadata(known.id())
                .map(|t| t.display_name)
                .unwrap_or_else(|| known.id()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Tool::Unknown(_))
    }

    /// Run the tool's line strategy. `None` means "nothing derivable": either
    /// no adapter exists for this tool or the adapter rejected the line; the
    /// pipeline then surfaces the raw text instead of dropping it.
    pub(crate) fn parse_line(&self, line: &str, ctx: &LineContext) -> Option<Vec<NormalizedEntry>> {
        match self {
            Tool::ClaudeCode => claude::parse_line(line, ctx),
            Tool::Codex => codex::parse_line(line, ctx),
            Tool::CursorAgent => cursor::parse_line(line, ctx),
            Tool::Opencode => opencode::parse_line(line, ctx),
            Tool::GeminiCli => gemini::parse_line(line, ctx),
            Tool::Unknown(_) => None,
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
