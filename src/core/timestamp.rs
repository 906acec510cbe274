//! Fixed-width timestamp rendering
//!
//! Every plain-text record starts with a `YYYY/MM/DD HH:MM:SS.uuuuuu ` prefix.
//! The prefix always occupies [`TIMESTAMP_WIDTH`] bytes, trailing space included,
//! so records line up in the output regardless of the message.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// Width of a rendered timestamp, separator space included
pub const TIMESTAMP_WIDTH: usize = 27;

/// Render `datetime` as `YYYY/MM/DD HH:MM:SS.uuuuuu ` (microsecond precision)
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use loge::core::timestamp::{format_timestamp, TIMESTAMP_WIDTH};
///
/// let t = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
/// let s = format_timestamp(&t);
/// assert_eq!(s, "2025/01/08 10:30:45.000000 ");
/// assert_eq!(s.len(), TIMESTAMP_WIDTH);
/// ```
#[must_use]
pub fn format_timestamp<Tz>(datetime: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    // `%.6f` truncates to microseconds and emits the leading dot
    datetime.format("%Y/%m/%d %H:%M:%S%.6f ").to_string()
}
