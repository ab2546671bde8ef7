use chrono::Utc;

/// Current wall-clock time in epoch milliseconds.
///
/// Fallback for envelopes that arrive without a timestamp; callers that need
/// determinism must supply explicit timestamps instead.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Truncate a string to a maximum length
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect::<String>() + "...(truncated)"
    }
}
