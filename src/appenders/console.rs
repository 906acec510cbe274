//! Console appender implementation
//!
//! Synchronous passthrough: every entry is written to the target as soon as
//! it is logged, either as `timestamp + message` or as one JSON object.

use crate::core::{Appender, ConsoleTarget, LogEntry, Result};
use std::io::{self, Write};

pub struct ConsoleAppender {
    writer: Box<dyn Write + Send>,
    json: bool,
}

impl ConsoleAppender {
    pub fn new(target: ConsoleTarget) -> Self {
        let writer: Box<dyn Write + Send> = match target {
            ConsoleTarget::Stderr => Box::new(io::stderr()),
            ConsoleTarget::Stdout => Box::new(io::stdout()),
        };
        Self::with_writer(writer)
    }

    /// Write to an arbitrary sink, e.g. a buffer in tests or a pipe
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer,
            json: false,
        }
    }

    /// Emit JSON objects instead of plain lines
    ///
    /// # Example
    ///
    /// ```
    /// use loge::appenders::ConsoleAppender;
    /// use loge::ConsoleTarget;
    ///
    /// let appender = ConsoleAppender::new(ConsoleTarget::Stdout).with_json(true);
    /// ```
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new(ConsoleTarget::default())
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let mut line = if self.json {
            entry.to_json()?
        } else {
            entry.to_plain()
        };
        line.push('\n');

        self.writer.write_all(line.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
