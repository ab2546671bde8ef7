//! Payload extraction across Codex protocol generations.
//!
//! Codex has shipped several wire layouts for the same logical events:
//!
//!   - event-stream era: fields inline on the event object
//!   - JSON-RPC notification era: payload under `params`
//!   - wrapped notification era: payload under `params.event`
//!   - JSON-RPC response era: payload under `result`
//!
//! Rather than branch per version, every lookup walks an ordered candidate
//! list. First hit wins; later generations never shadow earlier fields.

use serde_json::{Map, Value};

use crate::support::value_to_text;

/// Candidate payload objects for one event, in probe order.
pub(super) fn candidate_objects<'a>(obj: &'a Map<String, Value>) -> Vec<&'a Map<String, Value>> {
    let mut candidates = vec![obj];
    if let Some(params) = obj.get("params").and_then(Value::as_object) {
        candidates.push(params);
        if let Some(event) = params.get("event").and_then(Value::as_object) {
            candidates.push(event);
        }
    }
    if let Some(result) = obj.get("result").and_then(Value::as_object) {
        candidates.push(result);
    }
    candidates
}

/// First value found under `key` across the candidate objects.
pub(super) fn find_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    candidate_objects(obj)
        .into_iter()
        .find_map(|candidate| candidate.get(key))
}

pub(super) fn find_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    find_field(obj, key).and_then(Value::as_str)
}

pub(super) fn find_i64(obj: &Map<String, Value>, key: &str) -> Option<i64> {
    find_field(obj, key).and_then(Value::as_i64)
}

pub(super) fn find_bool(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    find_field(obj, key).and_then(Value::as_bool)
}

pub(super) fn find_object<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    find_field(obj, key).and_then(Value::as_object)
}

/// Free-text content of an event.
///
/// Per candidate object: the message-ish keys first, then `error`, then
/// `warning` (both of which may be a bare string or an object carrying its
/// own `message`/`text`).
pub(super) fn extract_content(obj: &Map<String, Value>) -> Option<String> {
    const TEXT_KEYS: [&str; 4] = ["message", "text", "delta", "content"];

    for candidate in candidate_objects(obj) {
        for key in TEXT_KEYS {
            if let Some(text) = candidate.get(key).and_then(value_to_text) {
                return Some(text);
            }
        }
        for key in ["error", "warning"] {
            if let Some(value) = candidate.get(key) {
                if let Some(text) = value_to_text(value) {
                    return Some(text);
                }
                if let Some(nested) = value.as_object()
                    && let Some(text) = nested
                        .get("message")
                        .or_else(|| nested.get("text"))
                        .and_then(value_to_text)
                {
                    return Some(text);
                }
            }
        }
    }
    None
}
