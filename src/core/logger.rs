//! Main logger implementation
//!
//! [`Logger`] ties the pieces together: every entry goes synchronously to the
//! console writer (when enabled) and into the [`TransactionList`] feeding a
//! [`FileSink`] (when file output is enabled). Writes never fail and never
//! block on file I/O.

use super::{
    appender::Appender,
    config::{Configuration, ConsoleTarget, OutputMode},
    log_entry::LogEntry,
    log_level::{LevelMask, LogLevel},
    metrics::LoggerMetrics,
    transaction::{TransactionConfig, TransactionList},
};
use crate::appenders::{ConsoleAppender, DiskUsage, FileSink, FileSinkConfig, FsDiskUsage};
use parking_lot::{Mutex, RwLock};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

pub struct Logger {
    config: Configuration,
    console: Option<Mutex<Box<dyn Appender>>>,
    buffer: Option<Arc<TransactionList>>,
    sink: Mutex<Option<FileSink>>,
    metrics: Arc<LoggerMetrics>,
}

impl Logger {
    /// Create a logger from `config`
    ///
    /// An unusable output directory disables file output with a diagnostic on
    /// stderr; the logger itself is always created.
    #[must_use]
    pub fn new(config: Configuration) -> Self {
        Self::from_parts(config, None, Box::new(FsDiskUsage))
    }

    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    fn from_parts(
        mut config: Configuration,
        console_writer: Option<Box<dyn Write + Send>>,
        usage: Box<dyn DiskUsage>,
    ) -> Self {
        if let Some(e) = config.normalize() {
            eprintln!("[LOGGER WARNING] File output disabled: {}", e);
        }

        let metrics = Arc::new(LoggerMetrics::new());

        let console = config.console_enabled().then(|| {
            let appender = match console_writer {
                Some(writer) => ConsoleAppender::with_writer(writer),
                None => ConsoleAppender::new(config.console),
            }
            .with_json(config.mode.contains(OutputMode::CONSOLE_JSON));
            Mutex::new(Box::new(appender) as Box<dyn Appender>)
        });

        let mut buffer = None;
        let mut sink = None;
        if config.file_enabled() {
            let list = Arc::new(TransactionList::with_metrics(
                TransactionConfig::from(&config),
                Arc::clone(&metrics),
            ));
            match FileSink::with_disk_usage(
                Arc::clone(&list),
                FileSinkConfig::from(&config),
                usage,
            ) {
                Ok(started) => {
                    buffer = Some(list);
                    sink = Some(started);
                }
                Err(e) => {
                    eprintln!("[LOGGER ERROR] File output disabled: {}", e);
                    config.mode = config.mode.without(OutputMode::FILE);
                }
            }
        }

        Self {
            config,
            console,
            buffer,
            sink: Mutex::new(sink),
            metrics,
        }
    }

    /// Route an entry to every enabled output
    pub fn write(&self, entry: LogEntry) {
        if let Some(console) = &self.console {
            let mut console = console.lock();
            // Console failures have nowhere to be reported
            let _ = console.append(&entry);
        }

        if let Some(buffer) = &self.buffer {
            buffer.write(entry);
        }
    }

    /// Log raw bytes without a level, as produced by `write!` on the logger
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn write_raw(&self, data: &[u8]) {
        if !self.is_enabled() {
            return;
        }
        self.write(LogEntry::new(String::from_utf8_lossy(data)));
    }

    /// Log `message` at `level` if the level mask accepts it
    pub fn write_level(&self, level: LogLevel, message: impl AsRef<str>) {
        if !self.accepts(level) {
            return;
        }
        self.write(LogEntry::new(message).with_level(level));
    }

    /// Level-gated write carrying the call site, used by the logging macros
    ///
    /// The `file:line: ` prefix is added only in include-line mode.
    pub fn log_at(&self, level: LogLevel, file: &str, line: u32, message: impl AsRef<str>) {
        if !self.accepts(level) {
            return;
        }
        if self.config.mode.contains(OutputMode::INCLUDE_LINE) {
            let file = Path::new(file)
                .file_name()
                .map_or_else(|| file.into(), |name| name.to_string_lossy());
            self.write_level(level, format!("{}:{}: {}", file, line, message.as_ref()));
        } else {
            self.write_level(level, message);
        }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.write_level(LogLevel::Info, message);
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.write_level(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.write_level(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.write_level(LogLevel::Error, message);
    }

    #[inline]
    fn is_enabled(&self) -> bool {
        self.console.is_some() || self.buffer.is_some()
    }

    #[inline]
    fn accepts(&self, level: LogLevel) -> bool {
        self.is_enabled() && self.config.log_levels.enabled(level)
    }

    /// Normalized configuration in effect
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Whether entries are being persisted to files
    pub fn file_enabled(&self) -> bool {
        self.buffer.is_some()
    }

    /// Transaction buffer backing file output, if enabled
    pub fn buffer(&self) -> Option<&Arc<TransactionList>> {
        self.buffer.as_ref()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Flush the console writer
    pub fn flush(&self) {
        if let Some(console) = &self.console {
            let _ = console.lock().flush();
        }
    }

    /// Persist everything buffered and stop the file sink
    ///
    /// The open transaction is closed and written before this returns. Later
    /// writes still reach the console but are no longer persisted. Calling it
    /// again is a no-op.
    pub fn shutdown(&self) {
        if let Some(mut sink) = self.sink.lock().take() {
            sink.shutdown();
        }
        self.flush();
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Write for &Logger {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_raw(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Logger::flush(*self);
        Ok(())
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
///
/// ```
/// use loge::{LevelMask, LogLevel, Logger, OutputMode};
///
/// let logger = Logger::builder()
///     .mode(OutputMode::CONSOLE)
///     .log_levels(LevelMask::from(LogLevel::Info) | LogLevel::Error)
///     .console_writer(Box::new(std::io::sink()))
///     .build();
///
/// logger.info("service ready");
/// ```
pub struct LoggerBuilder {
    config: Configuration,
    console_writer: Option<Box<dyn Write + Send>>,
    disk_usage: Option<Box<dyn DiskUsage>>,
}

impl LoggerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Configuration::default(),
            console_writer: None,
            disk_usage: None,
        }
    }

    /// Start from an existing configuration
    #[must_use]
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config,
            ..Self::new()
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn mode(mut self, mode: OutputMode) -> Self {
        self.config.mode = mode;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.config.filename = filename.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn transaction_size(mut self, bytes: usize) -> Self {
        self.config.transaction_size = bytes;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn transaction_timeout(mut self, timeout: Duration) -> Self {
        self.config.transaction_timeout = timeout;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn backlog_expiration(mut self, timeout: Duration) -> Self {
        self.config.backlog_expiration_timeout = timeout;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_backlog(mut self, transactions: usize) -> Self {
        self.config.max_backlog = transactions;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn disk_threshold(mut self, fraction: f64) -> Self {
        self.config.disk_threshold = fraction;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn log_levels(mut self, levels: LevelMask) -> Self {
        self.config.log_levels = levels;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn console(mut self, target: ConsoleTarget) -> Self {
        self.config.console = target;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn json(mut self, json: bool) -> Self {
        self.config.json = json;
        self
    }

    /// Send console output to `writer` instead of stderr/stdout
    #[must_use = "builder methods return a new value"]
    pub fn console_writer(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.console_writer = Some(writer);
        self
    }

    /// Measure disk usage for eviction with a custom source
    #[must_use = "builder methods return a new value"]
    pub fn disk_usage(mut self, usage: Box<dyn DiskUsage>) -> Self {
        self.disk_usage = Some(usage);
        self
    }

    pub fn build(self) -> Logger {
        Logger::from_parts(
            self.config,
            self.console_writer,
            self.disk_usage.unwrap_or_else(|| Box::new(FsDiskUsage)),
        )
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: OnceLock<RwLock<Arc<Logger>>> = OnceLock::new();

fn global_slot() -> &'static RwLock<Arc<Logger>> {
    GLOBAL.get_or_init(|| RwLock::new(Arc::new(Logger::default())))
}

/// Process-wide logger
///
/// Created on first use with the default configuration: console output to
/// stderr, no file output, no levels enabled for `write_level`.
pub fn global() -> Arc<Logger> {
    Arc::clone(&global_slot().read())
}

/// Replace the process-wide logger
///
/// The previous logger's sink is shut down, persisting its buffer, before the
/// new one starts. Callers of [`global`] holding the old handle keep a logger
/// that still writes to the console but no longer persists.
pub fn init(config: Configuration) -> Arc<Logger> {
    let mut slot = global_slot().write();
    slot.shutdown();
    let logger = Arc::new(Logger::new(config));
    *slot = Arc::clone(&logger);
    logger
}

/// Shut down the process-wide logger's sink
pub fn shutdown() {
    global().shutdown();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn console_logger(mode: OutputMode, levels: LevelMask) -> (Logger, Capture) {
        let capture = Capture::default();
        let logger = Logger::builder()
            .mode(mode)
            .log_levels(levels)
            .console_writer(Box::new(capture.clone()))
            .build();
        (logger, capture)
    }

    #[test]
    fn test_write_raw_reaches_console() {
        let (logger, capture) = console_logger(OutputMode::CONSOLE, LevelMask::NONE);
        logger.write_raw(b"raw line\n");

        let text = capture.text();
        assert!(text.ends_with(" raw line\n"), "got {:?}", text);
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_io_write_impl() {
        let (logger, capture) = console_logger(OutputMode::CONSOLE, LevelMask::NONE);
        write!(&logger, "port {}", 8080).unwrap();
        assert!(capture.text().contains("port 8080"));
    }

    #[test]
    fn test_level_mask_gates_write_level() {
        let (logger, capture) = console_logger(OutputMode::CONSOLE, LogLevel::Info.into());
        logger.info("shown");
        logger.debug("hidden");

        let text = capture.text();
        assert!(text.contains("shown"));
        assert!(!text.contains("hidden"));
    }

    #[test]
    fn test_include_line_prefix() {
        let (logger, capture) = console_logger(
            OutputMode::CONSOLE | OutputMode::INCLUDE_LINE,
            LevelMask::ALL,
        );
        logger.log_at(LogLevel::Info, "src/server/main.rs", 42, "listening");
        assert!(capture.text().contains(" main.rs:42: listening"));
    }

    #[test]
    fn test_no_prefix_without_include_line() {
        let (logger, capture) = console_logger(OutputMode::CONSOLE, LevelMask::ALL);
        logger.log_at(LogLevel::Info, "src/main.rs", 42, "listening");
        assert!(!capture.text().contains("main.rs:42"));
    }

    #[test]
    fn test_console_json() {
        let (logger, capture) = console_logger(
            OutputMode::CONSOLE | OutputMode::CONSOLE_JSON,
            LevelMask::ALL,
        );
        logger.debug("as json");

        let value: serde_json::Value = serde_json::from_str(capture.text().trim_end()).unwrap();
        assert_eq!(value["message"], "as json");
        assert_eq!(value["level"], "debug");
    }

    #[test]
    fn test_invalid_directory_keeps_console() {
        let dir = tempdir().unwrap();
        let capture = Capture::default();
        let logger = Logger::builder()
            .mode(OutputMode::CONSOLE | OutputMode::FILE | OutputMode::FILE_ROTATE)
            .path(dir.path().join("missing"))
            .console_writer(Box::new(capture.clone()))
            .build();

        assert!(!logger.file_enabled());
        assert!(logger.buffer().is_none());
        logger.write_raw(b"still visible");
        assert!(capture.text().contains("still visible"));
    }

    #[test]
    fn test_file_output_persisted_on_shutdown() {
        let dir = tempdir().unwrap();
        let logger = Logger::builder()
            .mode(OutputMode::FILE)
            .path(dir.path())
            .filename("app.log")
            .build();

        assert!(logger.file_enabled());
        for i in 0..10 {
            logger.write_raw(format!("line {}", i).as_bytes());
        }
        logger.shutdown();
        logger.shutdown();

        let content = fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert_eq!(content.lines().count(), 10);
        assert!(content.lines().last().unwrap().ends_with("line 9"));
        assert_eq!(logger.metrics().entries_persisted(), 10);
    }

    #[test]
    fn test_disabled_outputs_ignore_writes() {
        let logger = Logger::builder().mode(OutputMode(0)).build();
        logger.write_raw(b"nowhere");
        assert_eq!(logger.metrics().entries_buffered(), 0);
    }
}
