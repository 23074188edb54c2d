//! Fixed-width cell formatting for the status table.

use std::time::Duration;

/// Format a duration as integer milliseconds below one second, else seconds
/// with two decimals. Always six characters wide for values under 100s.
pub fn format_duration(d: Duration) -> String {
    if d < Duration::from_secs(1) {
        format!("{:4}ms", d.as_millis())
    } else {
        format!("{:5.2}s", d.as_secs_f64())
    }
}

/// One glyph per history entry, newest first.
pub fn format_history(history: &[bool]) -> String {
    history.iter().map(|&ok| if ok { '.' } else { 'F' }).collect()
}
