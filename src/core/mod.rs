//! Core logger types and traits

pub mod appender;
pub mod config;
pub mod error;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod timestamp;
pub mod transaction;

pub use appender::Appender;
pub use config::{Configuration, ConsoleTarget, OutputMode};
pub use error::{LoggerError, Result};
pub use log_entry::LogEntry;
pub use log_level::{LevelMask, LogLevel};
pub use logger::{global, init, shutdown, Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use timestamp::{format_timestamp, TIMESTAMP_WIDTH};
pub use transaction::{Transaction, TransactionConfig, TransactionList, TransactionListener};
