//! # loge
//!
//! A transaction-buffered logger with asynchronous file persistence.
//!
//! ## Features
//!
//! - **Non-blocking writes**: entries are grouped into transactions that close
//!   on size or age; a background sink persists them off the caller's thread
//! - **Ordered output**: transactions are written in id order, entries in
//!   append order
//! - **Rotation**: date and sequence named files (`YYYYMMDD_NNNN.log`)
//! - **Disk quota**: oldest log files are deleted while the volume is above a
//!   usage threshold
//! - **Console passthrough**: plain or JSON lines, written synchronously
//!
//! ## Example
//!
//! ```no_run
//! use loge::{info, Configuration, LevelMask, OutputMode};
//!
//! let logger = loge::init(Configuration {
//!     mode: OutputMode::CONSOLE | OutputMode::FILE | OutputMode::FILE_ROTATE,
//!     path: "/var/log/myservice".into(),
//!     log_levels: LevelMask::ALL,
//!     ..Default::default()
//! });
//!
//! info!("service started on port {}", 8080);
//! logger.shutdown();
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{
        ConsoleAppender, DiskUsage, FileSink, FileSinkConfig, FsDiskUsage, NamingPolicy,
    };
    pub use crate::core::{
        Appender, Configuration, ConsoleTarget, LevelMask, LogEntry, LogLevel, Logger,
        LoggerBuilder, LoggerError, LoggerMetrics, OutputMode, Result, Transaction,
        TransactionConfig, TransactionList, TransactionListener,
    };
}

pub use self::appenders::{
    ConsoleAppender, DiskUsage, FileSink, FileSinkConfig, FsDiskUsage, NamingPolicy,
};
pub use self::core::{
    global, init, shutdown, Appender, Configuration, ConsoleTarget, LevelMask, LogEntry,
    LogLevel, Logger, LoggerBuilder, LoggerError, LoggerMetrics, OutputMode, Result, Transaction,
    TransactionConfig, TransactionList, TransactionListener,
};
