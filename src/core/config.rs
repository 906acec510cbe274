//! Logger configuration
//!
//! [`Configuration`] carries every recognized option. Zero values mean "use the
//! default", so a configuration deserialized from a sparse file behaves the
//! same as one built in code. Call [`Configuration::normalize`] (done by the
//! logger itself) to fill defaults and validate the output directory.

use super::error::{LoggerError, Result};
use super::log_level::LevelMask;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;
use std::path::PathBuf;
use std::time::Duration;

/// Default transaction size limit (10 KiB)
pub const DEFAULT_TRANSACTION_SIZE: usize = 10 * 1024;

/// Default transaction age limit
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(3);

/// Default lifetime of a closed, unretrieved transaction
pub const DEFAULT_BACKLOG_EXPIRATION: Duration = Duration::from_secs(60 * 60);

/// Default used-disk fraction above which old files are deleted
pub const DEFAULT_DISK_THRESHOLD: f64 = 0.9;

/// Default size past which a rotated file gets a new sequence number (10 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default bound on closed transactions waiting for the sink
pub const DEFAULT_MAX_BACKLOG: usize = 4096;

/// Output mode bitmask
///
/// # Example
///
/// ```
/// use loge::OutputMode;
///
/// let mode = OutputMode::CONSOLE | OutputMode::FILE | OutputMode::FILE_ROTATE;
/// assert!(mode.contains(OutputMode::FILE_ROTATE));
/// assert!(!mode.contains(OutputMode::CONSOLE_JSON));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputMode(pub u32);

impl OutputMode {
    /// Write every entry to the console writer
    pub const CONSOLE: OutputMode = OutputMode(1);
    /// Persist entries through the transaction buffer and file sink
    pub const FILE: OutputMode = OutputMode(2);
    /// Name output files by date and sequence instead of the fixed file name
    pub const FILE_ROTATE: OutputMode = OutputMode(4);
    /// Prefix messages with the caller's `file:line`
    pub const INCLUDE_LINE: OutputMode = OutputMode(8);
    /// Emit console records as JSON objects
    pub const CONSOLE_JSON: OutputMode = OutputMode(16);

    #[inline]
    pub fn contains(&self, other: OutputMode) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub fn without(self, other: OutputMode) -> OutputMode {
        OutputMode(self.0 & !other.0)
    }
}

impl BitOr for OutputMode {
    type Output = OutputMode;

    fn bitor(self, rhs: OutputMode) -> OutputMode {
        OutputMode(self.0 | rhs.0)
    }
}

/// Where the console writer sends its records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleTarget {
    #[default]
    Stderr,
    Stdout,
}

/// Logger startup configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub mode: OutputMode,
    /// Output directory for file mode
    pub path: PathBuf,
    /// Log file name, ignored when rotation is enabled
    pub filename: String,
    /// Transaction size limit in bytes
    pub transaction_size: usize,
    /// Transaction age limit
    pub transaction_timeout: Duration,
    /// How long a closed transaction waits for the sink before being dropped
    pub backlog_expiration_timeout: Duration,
    /// Maximum number of closed transactions held for the sink
    pub max_backlog: usize,
    /// Used-disk fraction (0.0 - 1.0) above which old log files are deleted
    pub disk_threshold: f64,
    /// Size past which a rotated file advances its sequence number
    pub max_file_size: u64,
    /// Levels accepted by `write_level`
    pub log_levels: LevelMask,
    pub console: ConsoleTarget,
    /// Serialize file records as JSON instead of plain text
    pub json: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            mode: OutputMode::CONSOLE,
            path: PathBuf::new(),
            filename: String::new(),
            transaction_size: 0,
            transaction_timeout: Duration::ZERO,
            backlog_expiration_timeout: Duration::ZERO,
            max_backlog: 0,
            disk_threshold: 0.0,
            max_file_size: 0,
            log_levels: LevelMask::NONE,
            console: ConsoleTarget::Stderr,
            json: false,
        }
    }
}

impl Configuration {
    /// Fill zero values with defaults and disable file output when the
    /// output directory is unusable
    ///
    /// Returns the configuration error that disabled file output, if any. The
    /// configuration is usable either way.
    pub fn normalize(&mut self) -> Option<LoggerError> {
        if self.transaction_size == 0 {
            self.transaction_size = DEFAULT_TRANSACTION_SIZE;
        }
        if self.transaction_timeout.is_zero() {
            self.transaction_timeout = DEFAULT_TRANSACTION_TIMEOUT;
        }
        if self.backlog_expiration_timeout.is_zero() {
            self.backlog_expiration_timeout = DEFAULT_BACKLOG_EXPIRATION;
        }
        if self.max_backlog == 0 {
            self.max_backlog = DEFAULT_MAX_BACKLOG;
        }
        if !(self.disk_threshold > 0.0 && self.disk_threshold <= 1.0) {
            self.disk_threshold = DEFAULT_DISK_THRESHOLD;
        }
        if self.max_file_size == 0 {
            self.max_file_size = DEFAULT_MAX_FILE_SIZE;
        }

        if self.mode.contains(OutputMode::FILE) {
            if let Err(e) = self.validate_output() {
                self.mode = self.mode.without(OutputMode::FILE);
                return Some(e);
            }
        }
        None
    }

    fn validate_output(&self) -> Result<()> {
        let metadata = std::fs::metadata(&self.path).map_err(|e| {
            LoggerError::io_operation(
                "validating output directory",
                format!("cannot access '{}'", self.path.display()),
                e,
            )
        })?;
        if !metadata.is_dir() {
            return Err(LoggerError::config(
                "Configuration",
                format!("'{}' is not a directory", self.path.display()),
            ));
        }
        if !self.mode.contains(OutputMode::FILE_ROTATE) && self.filename.is_empty() {
            return Err(LoggerError::config(
                "Configuration",
                "a file name is required when rotation is disabled",
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn file_enabled(&self) -> bool {
        self.mode.contains(OutputMode::FILE)
    }

    #[inline]
    pub fn console_enabled(&self) -> bool {
        self.mode.contains(OutputMode::CONSOLE)
    }
}
