//! Output destinations

pub mod console;
pub mod file_sink;
pub mod rotation;
pub mod storage;

pub use console::ConsoleAppender;
pub use file_sink::{FileSink, FileSinkConfig, DEFAULT_TICK_INTERVAL};
pub use rotation::{rotated_file_name, LogTarget, NamingPolicy, MAX_SEQUENCE};
pub use storage::{DiskUsage, FsDiskUsage};
