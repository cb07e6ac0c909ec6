//! Encoding of command arguments.
//!
//! The protocol is whitespace separated and has no escaping of its own, so
//! the command catalog uses these helpers to turn typed arguments into
//! tokens the engine accepts.

use std::time::Duration;

use chrono::{DateTime, TimeZone};

/// Placeholder the engine expects when an escape-digit set is empty.
pub const EMPTY_ARGUMENT: &str = "\"\"";

/// Returns the escape-digit argument, substituting `""` for an empty set.
pub fn escape_digits(digits: &str) -> &str {
    if digits.is_empty() {
        EMPTY_ARGUMENT
    } else {
        digits
    }
}

/// Wraps text in double quotes so it travels as a single argument.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Formats a duration as whole milliseconds.
pub fn millis(duration: Duration) -> String {
    duration.as_millis().to_string()
}

/// Formats a duration as whole seconds, truncating.
pub fn seconds(duration: Duration) -> String {
    duration.as_secs().to_string()
}

/// Formats a timestamp as seconds since the Unix epoch.
pub fn epoch<Tz: TimeZone>(when: &DateTime<Tz>) -> String {
    when.timestamp().to_string()
}
