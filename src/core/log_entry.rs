//! Log entry structure

use super::error::Result;
use super::log_level::LogLevel;
use super::timestamp::format_timestamp;
use chrono::{DateTime, Local};
use serde::Serialize;

/// One log call, captured once and never mutated afterwards
///
/// The plain-text timestamp prefix is rendered at creation time so that
/// serialization on the sink worker does not depend on when the batch drains.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    #[serde(skip)]
    pub timestring: String,
    pub message: String,
    pub level: Option<LogLevel>,
}

impl LogEntry {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// A single trailing line break is dropped first, since line-oriented
    /// callers usually terminate their messages. Remaining newlines, carriage
    /// returns and tabs are replaced with escape sequences so one entry always
    /// occupies exactly one output line.
    fn sanitize_message(message: &str) -> String {
        let message = message
            .strip_suffix('\n')
            .map(|m| m.strip_suffix('\r').unwrap_or(m))
            .unwrap_or(message);

        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(message: impl AsRef<str>) -> Self {
        Self::at(Local::now(), message)
    }

    /// Build an entry with an explicit wall-clock timestamp
    pub fn at(timestamp: DateTime<Local>, message: impl AsRef<str>) -> Self {
        Self {
            timestring: format_timestamp(&timestamp),
            timestamp,
            message: Self::sanitize_message(message.as_ref()),
            level: None,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Bytes this entry contributes to its transaction's size budget
    #[inline]
    pub fn size(&self) -> usize {
        self.message.len()
    }

    /// Structured form: one JSON object with `timestamp`, `message` and `level`
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Plain form: `<timestamp><message>` without the line terminator
    pub fn to_plain(&self) -> String {
        let mut out = String::with_capacity(self.timestring.len() + self.message.len());
        out.push_str(&self.timestring);
        out.push_str(&self.message);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timestamp::TIMESTAMP_WIDTH;

    #[test]
    fn test_trailing_newline_trimmed() {
        assert_eq!(LogEntry::new("hello\n").message, "hello");
        assert_eq!(LogEntry::new("hello\r\n").message, "hello");
        assert_eq!(LogEntry::new("hello").message, "hello");
    }

    #[test]
    fn test_embedded_newlines_escaped() {
        let entry = LogEntry::new("line one\nline two\tend");
        assert_eq!(entry.message, "line one\\nline two\\tend");
        assert_eq!(entry.size(), entry.message.len());
    }

    #[test]
    fn test_plain_format() {
        let entry = LogEntry::new("payload");
        let plain = entry.to_plain();
        assert_eq!(plain.len(), TIMESTAMP_WIDTH + "payload".len());
        assert!(plain.ends_with(" payload"));
    }

    #[test]
    fn test_json_fields() {
        let entry = LogEntry::new("payload").with_level(LogLevel::Debug);
        let value: serde_json::Value =
            serde_json::from_str(&entry.to_json().unwrap()).unwrap();

        assert_eq!(value["message"], "payload");
        assert_eq!(value["level"], "debug");
        assert!(value["timestamp"].is_string());
        assert!(value.get("timestring").is_none());
    }

    #[test]
    fn test_json_without_level() {
        let value: serde_json::Value =
            serde_json::from_str(&LogEntry::new("x").to_json().unwrap()).unwrap();
        assert!(value["level"].is_null());
    }
}
