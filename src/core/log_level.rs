//! Log level definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

/// Severity attached to entries written through [`Logger::write_level`].
///
/// Each level maps to one bit of a [`LevelMask`]; a level is emitted only when
/// its bit is enabled.
///
/// [`Logger::write_level`]: crate::Logger::write_level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum LogLevel {
    #[default]
    Info,
    Debug,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Bit of this level inside a [`LevelMask`]
    pub const fn bit(&self) -> u32 {
        match self {
            LogLevel::Info => 1,
            LogLevel::Debug => 2,
            LogLevel::Warn => 4,
            LogLevel::Error => 8,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// Set of enabled levels
///
/// # Example
///
/// ```
/// use loge::{LevelMask, LogLevel};
///
/// let mask = LevelMask::from(LogLevel::Info) | LogLevel::Error;
/// assert!(mask.enabled(LogLevel::Error));
/// assert!(!mask.enabled(LogLevel::Debug));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelMask(pub u32);

impl LevelMask {
    pub const NONE: LevelMask = LevelMask(0);
    pub const ALL: LevelMask = LevelMask(1 | 2 | 4 | 8);

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.0 & level.bit() != 0
    }
}

impl From<LogLevel> for LevelMask {
    fn from(level: LogLevel) -> Self {
        LevelMask(level.bit())
    }
}

impl BitOr<LogLevel> for LevelMask {
    type Output = LevelMask;

    fn bitor(self, rhs: LogLevel) -> LevelMask {
        LevelMask(self.0 | rhs.bit())
    }
}

impl BitOr for LevelMask {
    type Output = LevelMask;

    fn bitor(self, rhs: LevelMask) -> LevelMask {
        LevelMask(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse() {
        assert_eq!("INFO".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_mask() {
        let mask = LevelMask::from(LogLevel::Info) | LogLevel::Debug;
        assert!(mask.enabled(LogLevel::Info));
        assert!(mask.enabled(LogLevel::Debug));
        assert!(!mask.enabled(LogLevel::Warn));
        assert!(!LevelMask::NONE.enabled(LogLevel::Error));
        assert!(LevelMask::ALL.enabled(LogLevel::Error));
    }
}
