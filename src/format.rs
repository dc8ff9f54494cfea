//! Display formatting for sizes, percentages and timestamps.

use chrono::{DateTime, Utc};

/// Compact human size, e.g. "4.0K", "9.5M", "48.0M".
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1_000.0;
    const MB: f64 = 1_000_000.0;
    const GB: f64 = 1_000_000_000.0;
    let bytes_f = bytes as f64;
    if bytes_f >= GB {
        format!("{:.1}G", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.1}M", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.1}K", bytes_f / KB)
    } else {
        format!("{}B", bytes)
    }
}

pub fn format_pct(pct: f64) -> String {
    format!("{:.1}%", pct)
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M").to_string()
}
