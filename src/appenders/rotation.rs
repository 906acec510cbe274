//! Output file naming
//!
//! With rotation enabled, files are named `YYYYMMDD_NNNN.log` after the local
//! date and a four-digit sequence number. The active file for a date is the most
//! recently modified one; once it grows past the size limit the next name
//! advances the sequence by exactly one. After `9999` the sequence wraps to
//! `0000`. Whenever the next name is already taken, that file predates the
//! active one and is replaced rather than appended to, so after a wrap each
//! stale file is overwritten in turn.
//!
//! Without rotation every lookup yields the same fixed file name.

use chrono::{Local, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Highest sequence number before wrapping back to zero
pub const MAX_SEQUENCE: u32 = 9999;

/// Length of `YYYYMMDD_NNNN.log`
const ROTATED_NAME_LEN: usize = 17;

/// How the sink names its output file
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use loge::appenders::NamingPolicy;
/// use std::path::Path;
///
/// let fixed = NamingPolicy::fixed("service.log");
/// let date = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
/// assert_eq!(
///     fixed.resolve_at(Path::new("/var/log/svc"), date).path,
///     Path::new("/var/log/svc/service.log"),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingPolicy {
    /// Always write to one file with this name
    Fixed(String),

    /// Date and sequence based names, advancing past `max_file_size` bytes
    Rotating { max_file_size: u64 },
}

/// File the sink should write to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub path: PathBuf,
    /// Existing content under `path` is stale and must be discarded on open
    pub replace: bool,
}

impl NamingPolicy {
    #[must_use]
    pub fn fixed(name: impl Into<String>) -> Self {
        NamingPolicy::Fixed(name.into())
    }

    #[must_use]
    pub fn rotating(max_file_size: u64) -> Self {
        NamingPolicy::Rotating { max_file_size }
    }

    #[must_use]
    pub fn is_rotating(&self) -> bool {
        matches!(self, NamingPolicy::Rotating { .. })
    }

    /// Target for the current local date
    pub fn resolve(&self, dir: &Path) -> LogTarget {
        self.resolve_at(dir, Local::now().date_naive())
    }

    /// Target for `date`
    ///
    /// Directory listing or stat failures are treated as an empty directory.
    pub fn resolve_at(&self, dir: &Path, date: NaiveDate) -> LogTarget {
        match self {
            NamingPolicy::Fixed(name) => LogTarget {
                path: dir.join(name),
                replace: false,
            },
            NamingPolicy::Rotating { max_file_size } => {
                let files = rotated_files(dir, date);
                let (sequence, replace) = match active_file(&files) {
                    None => (0, false),
                    Some(active) if active.size > *max_file_size => {
                        let next = if active.sequence >= MAX_SEQUENCE {
                            0
                        } else {
                            active.sequence + 1
                        };
                        (next, files.iter().any(|f| f.sequence == next))
                    }
                    Some(active) => (active.sequence, false),
                };
                LogTarget {
                    path: dir.join(rotated_file_name(date, sequence)),
                    replace,
                }
            }
        }
    }
}

/// `YYYYMMDD_NNNN.log`
#[must_use]
pub fn rotated_file_name(date: NaiveDate, sequence: u32) -> String {
    format!("{}_{:04}.log", date.format("%Y%m%d"), sequence)
}

/// Sequence number of `name` if it is a rotated file for the date `prefix`
fn parse_sequence(name: &str, prefix: &str) -> Option<u32> {
    if name.len() != ROTATED_NAME_LEN || !name.starts_with(prefix) {
        return None;
    }
    let digits = name.get(prefix.len()..)?.strip_suffix(".log")?;
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

struct RotatedFile {
    sequence: u32,
    size: u64,
    modified: SystemTime,
}

/// Rotated files for `date` present in `dir`
fn rotated_files(dir: &Path, date: NaiveDate) -> Vec<RotatedFile> {
    let prefix = format!("{}_", date.format("%Y%m%d"));
    let Ok(read_dir) = fs::read_dir(dir) else {
        return Vec::new();
    };

    read_dir
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let sequence = parse_sequence(e.file_name().to_str()?, &prefix)?;
            let metadata = e.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            Some(RotatedFile {
                sequence,
                size: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            })
        })
        .collect()
}

/// Most recently modified file; ties go to the higher sequence
fn active_file(files: &[RotatedFile]) -> Option<&RotatedFile> {
    files.iter().max_by_key(|f| (f.modified, f.sequence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::tempdir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 8).unwrap()
    }

    fn create(dir: &Path, name: &str, size: usize, age_secs: u64) {
        let path = dir.join(name);
        fs::write(&path, vec![b'x'; size]).unwrap();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
    }

    #[test]
    fn test_rotated_file_name_padding() {
        assert_eq!(rotated_file_name(date(), 0), "20250108_0000.log");
        assert_eq!(rotated_file_name(date(), 42), "20250108_0042.log");
        assert_eq!(rotated_file_name(date(), 9999), "20250108_9999.log");
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(parse_sequence("20250108_0042.log", "20250108_"), Some(42));
        assert_eq!(parse_sequence("20250107_0042.log", "20250108_"), None);
        assert_eq!(parse_sequence("20250108_00a2.log", "20250108_"), None);
        assert_eq!(parse_sequence("20250108_0042.txt", "20250108_"), None);
        assert_eq!(parse_sequence("20250108_00042.log", "20250108_"), None);
    }

    #[test]
    fn test_empty_directory_starts_at_zero() {
        let dir = tempdir().unwrap();
        let target = NamingPolicy::rotating(100).resolve_at(dir.path(), date());
        assert_eq!(target.path, dir.path().join("20250108_0000.log"));
        assert!(!target.replace);
    }

    #[test]
    fn test_missing_directory_treated_as_empty() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        let target = NamingPolicy::rotating(100).resolve_at(&missing, date());
        assert_eq!(target.path, missing.join("20250108_0000.log"));
    }

    #[test]
    fn test_stays_on_file_under_limit() {
        let dir = tempdir().unwrap();
        create(dir.path(), "20250108_0003.log", 100, 10);

        let target = NamingPolicy::rotating(100).resolve_at(dir.path(), date());
        assert_eq!(target.path, dir.path().join("20250108_0003.log"));
    }

    #[test]
    fn test_advances_by_one_past_limit() {
        let dir = tempdir().unwrap();
        create(dir.path(), "20250108_0003.log", 101, 10);

        let target = NamingPolicy::rotating(100).resolve_at(dir.path(), date());
        assert_eq!(target.path, dir.path().join("20250108_0004.log"));
        assert!(!target.replace);
    }

    #[test]
    fn test_most_recent_file_is_active() {
        let dir = tempdir().unwrap();
        create(dir.path(), "20250108_0007.log", 500, 300);
        create(dir.path(), "20250108_0002.log", 10, 5);

        let target = NamingPolicy::rotating(100).resolve_at(dir.path(), date());
        assert_eq!(target.path, dir.path().join("20250108_0002.log"));
    }

    #[test]
    fn test_other_dates_ignored() {
        let dir = tempdir().unwrap();
        create(dir.path(), "20250107_0005.log", 500, 5);

        let target = NamingPolicy::rotating(100).resolve_at(dir.path(), date());
        assert_eq!(target.path, dir.path().join("20250108_0000.log"));
    }

    #[test]
    fn test_wraps_after_max_sequence() {
        let dir = tempdir().unwrap();
        create(dir.path(), "20250108_0000.log", 500, 600);
        create(dir.path(), "20250108_9999.log", 500, 5);

        let target = NamingPolicy::rotating(100).resolve_at(dir.path(), date());
        assert_eq!(target.path, dir.path().join("20250108_0000.log"));
        assert!(target.replace);
    }

    #[test]
    fn test_stale_file_after_wrap_is_replaced() {
        let dir = tempdir().unwrap();
        create(dir.path(), "20250108_0001.log", 500, 6000);
        create(dir.path(), "20250108_0000.log", 101, 5);

        let target = NamingPolicy::rotating(100).resolve_at(dir.path(), date());
        assert_eq!(target.path, dir.path().join("20250108_0001.log"));
        assert!(target.replace);
    }

    #[test]
    fn test_replaced_file_stays_active_until_full() {
        let dir = tempdir().unwrap();
        create(dir.path(), "20250108_0002.log", 500, 6000);
        create(dir.path(), "20250108_0000.log", 500, 600);
        // Freshly rewritten after the wrap, still under the limit
        create(dir.path(), "20250108_0001.log", 40, 5);

        let target = NamingPolicy::rotating(100).resolve_at(dir.path(), date());
        assert_eq!(target.path, dir.path().join("20250108_0001.log"));
        assert!(!target.replace);
    }

    #[test]
    fn test_fixed_ignores_directory_content() {
        let dir = tempdir().unwrap();
        create(dir.path(), "20250108_0003.log", 500, 10);

        let policy = NamingPolicy::fixed("app.log");
        assert!(!policy.is_rotating());
        assert_eq!(
            policy.resolve_at(dir.path(), date()),
            LogTarget {
                path: dir.path().join("app.log"),
                replace: false
            }
        );
    }
}
