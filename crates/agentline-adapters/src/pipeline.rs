//! Envelope dispatch and sequencing.
//!
//! The pipeline is a pure function over the accumulated session buffer:
//! callers re-run it on every tick rather than feeding deltas, because the
//! Cursor Agent suppression filter and the correlator both need global
//! visibility of everything parsed so far. No state survives between calls.

use agentline_types::{EntryMetadata, EntryType, LogMsg, NormalizedEntry, now_ms};

use crate::cursor;
use crate::registry::Tool;
use crate::support::LineContext;

/// Normalize one session's buffer of envelopes into the canonical entry list.
///
/// Output preserves input envelope order; a stable sort by
/// `metadata.sequence` is applied only when every produced entry carries one.
pub fn normalize_session(tool: &Tool, msgs: &[LogMsg]) -> Vec<NormalizedEntry> {
    let mut entries = Vec::with_capacity(msgs.len());

    for (index, msg) in msgs.iter().enumerate() {
        let id_base = msg
            .id()
            .map(str::to_string)
            .unwrap_or_else(|| format!("entry-{index}"));
        let timestamp = msg.timestamp().unwrap_or_else(now_ms);

        match msg {
            LogMsg::Normalized { entry, .. } => match entry {
                Some(entry) => {
                    let mut entry = entry.clone();
                    if entry.id.is_empty() {
                        entry.id = id_base;
                    }
                    if entry.timestamp == 0 {
                        entry.timestamp = timestamp;
                    }
                    entries.push(entry);
                }
                None => {
                    tracing::warn!(index, "normalized envelope without an embedded entry");
                }
            },

            LogMsg::Finished { exit_code, .. } => {
                let (content, metadata) = match exit_code {
                    Some(code) => (
                        format!("Process exited with code {code}"),
                        Some(EntryMetadata {
                            exit_code: Some(*code),
                            ..Default::default()
                        }),
                    ),
                    None => ("Process finished".to_string(), None),
                };
                let mut entry =
                    NormalizedEntry::new(id_base, EntryType::SystemMessage, timestamp, content);
                entry.metadata = metadata;
                entries.push(entry);
            }

            LogMsg::Stderr { content, .. } => {
                let Some(trimmed) = trimmed_content(content) else {
                    continue;
                };
                entries.push(NormalizedEntry::new(
                    format!("{id_base}-stderr"),
                    EntryType::Error,
                    timestamp,
                    trimmed,
                ));
            }

            LogMsg::Stdout { content, .. } => {
                let Some(trimmed) = trimmed_content(content) else {
                    continue;
                };
                let ctx = LineContext::new(id_base.clone(), timestamp);
                match tool.parse_line(&trimmed, &ctx) {
                    Some(parsed) => entries.extend(parsed),
                    None => {
                        // No adapter, or the adapter derived nothing: surface
                        // the raw line rather than dropping it silently.
                        tracing::debug!(tool = %tool, index, "line fell back to raw display");
                        entries.push(NormalizedEntry::new(
                            format!("{id_base}-stdout"),
                            EntryType::SystemMessage,
                            timestamp,
                            trimmed,
                        ));
                    }
                }
            }
        }
    }

    if matches!(tool, Tool::CursorAgent) {
        cursor::suppress_redundant_results(&mut entries);
    }
    sort_by_sequence(&mut entries);

    entries
}

fn trimmed_content(content: &Option<String>) -> Option<String> {
    let trimmed = content.as_deref()?.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Deterministic merge of interleaved streams: applies only when every entry
/// in the batch carries a numeric sequence, so partially-sequenced batches
/// keep their envelope order.
fn sort_by_sequence(entries: &mut [NormalizedEntry]) {
    let sequence = |entry: &NormalizedEntry| entry.metadata.as_ref().and_then(|m| m.sequence);
    if entries.is_empty() || !entries.iter().all(|entry| sequence(entry).is_some()) {
        return;
    }
    entries.sort_by_key(|entry| sequence(entry).unwrap_or_default());
}
