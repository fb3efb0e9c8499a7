//! Utility module for common functionality

use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use regex::Regex;

/// Await a future and report how long it took
pub async fn measure_time_async<Fut, T>(fut: Fut) -> (T, Duration)
where
    Fut: std::future::Future<Output = T>,
{
    let start = Instant::now();
    let result = fut.await;
    (result, start.elapsed())
}

/// Truncate a string to at most `max_len` characters, adding an ellipsis if truncated
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

static SENSITIVE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"Bearer [A-Za-z0-9\-_.~+/]+=*", "Bearer [REDACTED]"),
        (r"access_token[=:]\s*[^\s&]+", "access_token=[REDACTED]"),
        (r"ya29\.[A-Za-z0-9\-_]+", "[REDACTED]"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

/// Strip OAuth tokens from a string before it is logged
pub fn sanitize_for_logging(s: &str) -> String {
    let mut result = s.to_string();
    for (re, replacement) in SENSITIVE_PATTERNS.iter() {
        result = re.replace_all(&result, *replacement).to_string();
    }
    result
}

/// Generate a unique request ID
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Parse a duration from a string (e.g., "300ms", "30s", "5m", "1h").
///
/// A bare number is read as milliseconds. Values that overflow `u64`
/// seconds are rejected.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim().to_lowercase();

    if let Some(ms) = s.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim().parse::<u64>().ok()?.checked_mul(60).map(Duration::from_secs)
    } else if let Some(hours) = s.strip_suffix('h') {
        hours.trim().parse::<u64>().ok()?.checked_mul(3600).map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_millis)
    }
}
