//! Session recording reader.
//!
//! A recording is JSON-lines of `LogMsg` envelopes, as captured by the
//! process-output collaborator. Malformed lines are preserved as `stdout`
//! envelopes so the usual degradation path (raw system message) still
//! applies once the buffer is normalized.

use std::path::Path;

use agentline_types::LogMsg;

use crate::error::Result;

pub fn read_session_file(path: &Path) -> Result<Vec<LogMsg>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(parse_session_lines(&raw))
}

pub fn parse_session_lines(raw: &str) -> Vec<LogMsg> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            LogMsg::from_json_line(line).unwrap_or_else(|_| LogMsg::Stdout {
                content: Some(line.to_string()),
                id: None,
                timestamp: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_lines_mixed() {
        let raw = concat!(
            "{\"type\":\"stdout\",\"content\":\"{}\",\"id\":\"m1\"}\n",
            "\n",
            "garbage line\n",
            "{\"type\":\"finished\",\"exit_code\":0}\n",
        );

        let msgs = parse_session_lines(raw);
        assert_eq!(msgs.len(), 3);
        assert!(matches!(&msgs[0], LogMsg::Stdout { id: Some(id), .. } if id == "m1"));
        assert!(matches!(
            &msgs[1],
            LogMsg::Stdout { content: Some(content), .. } if content == "garbage line"
        ));
        assert!(matches!(&msgs[2], LogMsg::Finished { exit_code: Some(0), .. }));
    }
}
