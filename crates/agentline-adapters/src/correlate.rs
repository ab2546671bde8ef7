//! Call/result correlation.
//!
//! A tool invocation and its eventual result are independent entries linked
//! by `tool_use_id`. This pass derives, from the full assembled entry list,
//! which results are "attached" to a call and therefore hidden from
//! standalone rendering (they render folded under the call instead). The
//! underlying entries are never removed.
//!
//! The derivation is a pure function of the whole list and is recomputed on
//! every parse; keeping it incremental would break once late entries rebind
//! a duplicated correlation key (last writer wins).

use std::collections::{HashMap, HashSet};

use agentline_types::{EntryType, NormalizedEntry};

/// Derived correlation state for one parsed entry list.
#[derive(Debug, Default)]
pub struct Correlation {
    /// tool_use_id -> id of the winning tool_result entry.
    results_by_call: HashMap<String, String>,
    /// Result entry ids claimed by some call-shaped entry.
    attached: HashSet<String>,
}

impl Correlation {
    /// Result entry id correlated to a call's `tool_use_id`, if any.
    pub fn result_for(&self, tool_use_id: &str) -> Option<&str> {
        self.results_by_call.get(tool_use_id).map(String::as_str)
    }

    /// Whether a tool_result entry renders attached to its call rather than
    /// standalone.
    pub fn is_attached(&self, entry_id: &str) -> bool {
        self.attached.contains(entry_id)
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }
}

pub fn correlate_results(entries: &[NormalizedEntry]) -> Correlation {
    let mut results_by_call: HashMap<String, String> = HashMap::new();
    for entry in entries {
        if entry.entry_type == EntryType::ToolResult
            && let Some(tool_use_id) = entry.tool_use_id()
        {
            // Last writer wins on duplicated correlation keys.
            results_by_call.insert(tool_use_id.to_string(), entry.id.clone());
        }
    }

    let mut attached = HashSet::new();
    for entry in entries {
        if entry.entry_type.is_tool_call()
            && let Some(tool_use_id) = entry.tool_use_id()
            && let Some(result_id) = results_by_call.get(tool_use_id)
        {
            attached.insert(result_id.clone());
        }
    }

    Correlation {
        results_by_call,
        attached,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentline_types::EntryMetadata;

    fn entry(id: &str, entry_type: EntryType, tool_use_id: Option<&str>) -> NormalizedEntry {
        let mut e = NormalizedEntry::new(id, entry_type, 1, id);
        if let Some(tool_use_id) = tool_use_id {
            e.metadata = Some(EntryMetadata {
                tool_use_id: Some(tool_use_id.to_string()),
                ..Default::default()
            });
        }
        e
    }

    #[test]
    fn test_result_attaches_to_call() {
        let entries = vec![
            entry("call", EntryType::CommandRun, Some("c1")),
            entry("result", EntryType::ToolResult, Some("c1")),
        ];

        let correlation = correlate_results(&entries);
        assert_eq!(correlation.result_for("c1"), Some("result"));
        assert!(correlation.is_attached("result"));
        assert!(!correlation.is_attached("call"));
    }

    #[test]
    fn test_unmatched_sides_render_standalone() {
        let entries = vec![
            entry("call", EntryType::ToolUse, Some("c1")),
            entry("result", EntryType::ToolResult, Some("c2")),
        ];

        let correlation = correlate_results(&entries);
        assert_eq!(correlation.result_for("c1"), None);
        assert!(!correlation.is_attached("result"));
        assert_eq!(correlation.attached_count(), 0);
    }

    #[test]
    fn test_duplicate_results_last_writer_wins() {
        let entries = vec![
            entry("call", EntryType::CommandRun, Some("c1")),
            entry("result-early", EntryType::ToolResult, Some("c1")),
            entry("result-late", EntryType::ToolResult, Some("c1")),
        ];

        let correlation = correlate_results(&entries);
        assert_eq!(correlation.result_for("c1"), Some("result-late"));
        assert!(correlation.is_attached("result-late"));
        assert!(!correlation.is_attached("result-early"));
    }

    #[test]
    fn test_non_call_entries_never_attach() {
        let entries = vec![
            entry("msg", EntryType::AssistantMessage, Some("c1")),
            entry("result", EntryType::ToolResult, Some("c1")),
        ];

        let correlation = correlate_results(&entries);
        assert!(!correlation.is_attached("result"));
    }
}
