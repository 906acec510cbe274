//! Logging macros for ergonomic log message formatting.
//!
//! Each macro captures the call site with `file!()`/`line!()` so loggers in
//! include-line mode can prefix `file:line: `. Pass a logger first to log
//! through it, or start with the format string to use the process-wide
//! logger.
//!
//! # Examples
//!
//! ```
//! use loge::{info, LevelMask, Logger, OutputMode};
//!
//! let logger = Logger::builder()
//!     .mode(OutputMode::CONSOLE)
//!     .log_levels(LevelMask::ALL)
//!     .console_writer(Box::new(std::io::sink()))
//!     .build();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // Global logger
//! info!("Processing {} items", 100);
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use loge::prelude::*;
/// # let logger = Logger::default();
/// use loge::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_at($level, file!(), line!(), format!($($arg)+))
    };
}

/// Log a debug-level message.
///
/// ```
/// # use loge::prelude::*;
/// # let logger = Logger::default();
/// use loge::debug;
/// debug!(logger, "Counter value: {}", 10);
/// debug!("Through the global logger");
/// ```
#[macro_export]
macro_rules! debug {
    ($fmt:literal $($arg:tt)*) => {
        $crate::global().log_at($crate::LogLevel::Debug, file!(), line!(), format!($fmt $($arg)*))
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// ```
/// # use loge::prelude::*;
/// # let logger = Logger::default();
/// use loge::info;
/// info!(logger, "Processing {} items", 100);
/// info!("Application started");
/// ```
#[macro_export]
macro_rules! info {
    ($fmt:literal $($arg:tt)*) => {
        $crate::global().log_at($crate::LogLevel::Info, file!(), line!(), format!($fmt $($arg)*))
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// ```
/// # use loge::prelude::*;
/// # let logger = Logger::default();
/// use loge::warn;
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// warn!("Low disk space");
/// ```
#[macro_export]
macro_rules! warn {
    ($fmt:literal $($arg:tt)*) => {
        $crate::global().log_at($crate::LogLevel::Warn, file!(), line!(), format!($fmt $($arg)*))
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// ```
/// # use loge::prelude::*;
/// # let logger = Logger::default();
/// use loge::error;
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// error!("Failed to connect to database");
/// ```
#[macro_export]
macro_rules! error {
    ($fmt:literal $($arg:tt)*) => {
        $crate::global().log_at($crate::LogLevel::Error, file!(), line!(), format!($fmt $($arg)*))
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}
