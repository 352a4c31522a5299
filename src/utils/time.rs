// src/utils/time.rs

//! Time-of-day formatting for booking path segments.

use chrono::NaiveTime;

/// Parse a booking path time segment (`"830"`, `"0830"`, `"13:45"`).
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let digits: String = raw.trim().chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveTime::parse_from_str(&format!("{digits:0>4}"), "%H%M").ok()
}

/// Render a booking path time segment as a 12-hour clock string.
///
/// Segments that do not look like a 24-hour `HHMM` value are returned as-is.
///
/// # Examples
/// ```
/// use mvc_watch::utils::time::format_clock;
///
/// assert_eq!(format_clock("830"), "8:30 AM");
/// assert_eq!(format_clock("1345"), "1:45 PM");
/// ```
pub fn format_clock(raw: &str) -> String {
    parse_clock(raw)
        .map(|t| t.format("%-I:%M %p").to_string())
        .unwrap_or_else(|| raw.to_string())
}
