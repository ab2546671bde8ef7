use serde::{Deserialize, Serialize};

use crate::entry::NormalizedEntry;
use crate::error::{Error, Result};

/// Raw transport envelope for one unit of process output or a pre-normalized
/// event, as delivered by the process-output collaborator.
///
/// Every payload field is optional and read defensively: envelopes are
/// produced by an external process and the engine must never reject one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogMsg {
    Stdout {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<i64>,
    },
    Stderr {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<i64>,
    },
    Normalized {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        entry: Option<NormalizedEntry>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<i64>,
    },
    Finished {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exit_code: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<i64>,
    },
}

impl LogMsg {
    /// Envelope id, when the collaborator assigned one.
    pub fn id(&self) -> Option<&str> {
        match self {
            LogMsg::Stdout { id, .. }
            | LogMsg::Stderr { id, .. }
            | LogMsg::Normalized { id, .. }
            | LogMsg::Finished { id, .. } => id.as_deref(),
        }
    }

    /// Envelope timestamp in epoch milliseconds, when present.
    pub fn timestamp(&self) -> Option<i64> {
        match self {
            LogMsg::Stdout { timestamp, .. }
            | LogMsg::Stderr { timestamp, .. }
            | LogMsg::Normalized { timestamp, .. }
            | LogMsg::Finished { timestamp, .. } => *timestamp,
        }
    }

    /// Decode one JSON-lines record into an envelope.
    pub fn from_json_line(line: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(Error::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdout_round_trip() {
        let msg = LogMsg::Stdout {
            content: Some("{\"type\":\"assistant\"}".to_string()),
            id: Some("m1".to_string()),
            timestamp: Some(1_700_000_000_000),
        };

        let json = serde_json::to_string(&msg).unwrap();
        let back = LogMsg::from_json_line(&json).unwrap();
        assert_eq!(back, msg);
        assert_eq!(back.id(), Some("m1"));
        assert_eq!(back.timestamp(), Some(1_700_000_000_000));
    }

    #[test]
    fn test_finished_defaults() {
        let msg = LogMsg::from_json_line(r#"{"type":"finished"}"#).unwrap();
        match msg {
            LogMsg::Finished { exit_code, id, timestamp } => {
                assert_eq!(exit_code, None);
                assert_eq!(id, None);
                assert_eq!(timestamp, None);
            }
            _ => panic!("expected finished envelope"),
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(LogMsg::from_json_line(r#"{"type":"telemetry"}"#).is_err());
    }
}
