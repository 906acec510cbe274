//! Disk usage probing and quota-driven file eviction

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Reports how full the volume holding a directory is
pub trait DiskUsage: Send {
    /// Used fraction of the volume (0.0 - 1.0), or `None` when unavailable
    fn used_fraction(&self, path: &Path) -> Option<f64>;
}

/// [`DiskUsage`] backed by the operating system's filesystem statistics
///
/// Uses `statvfs` on unix and `GetDiskFreeSpaceExW` on Windows through `fs2`.
/// Space reserved for the superuser counts as used, matching what an
/// unprivileged process can still write.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDiskUsage;

impl DiskUsage for FsDiskUsage {
    #[cfg(feature = "disk-quota")]
    fn used_fraction(&self, path: &Path) -> Option<f64> {
        let total = fs2::total_space(path).ok()?;
        let available = fs2::available_space(path).ok()?;
        if total == 0 {
            return None;
        }
        Some(1.0 - available as f64 / total as f64)
    }

    #[cfg(not(feature = "disk-quota"))]
    fn used_fraction(&self, _path: &Path) -> Option<f64> {
        None
    }
}

/// Log files in `dir` eligible for eviction, oldest modification first
///
/// Only regular files named `*.log` or exactly `fixed_name` are considered,
/// and `active` is never returned. Listing or stat failures yield fewer (or
/// no) candidates rather than an error.
pub(crate) fn eviction_candidates(
    dir: &Path,
    fixed_name: Option<&str>,
    active: Option<&Path>,
) -> Vec<PathBuf> {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<(SystemTime, PathBuf)> = read_dir
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.ends_with(".log") || fixed_name == Some(name.as_ref())
        })
        .filter_map(|e| {
            let metadata = e.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            Some((metadata.modified().ok()?, e.path()))
        })
        .filter(|(_, path)| active != Some(path.as_path()))
        .collect();

    files.sort();
    files.into_iter().map(|(_, path)| path).collect()
}

/// Delete the oldest candidates while usage stays above `threshold`
///
/// Returns the number of files removed. Usage is re-queried after every
/// deletion; an unavailable reading stops the loop.
pub(crate) fn evict_until_below(
    usage: &dyn DiskUsage,
    dir: &Path,
    threshold: f64,
    candidates: Vec<PathBuf>,
) -> usize {
    let mut removed = 0;
    for path in candidates {
        match usage.used_fraction(dir) {
            Some(used) if used > threshold => {}
            _ => break,
        }
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!(
                "[LOGGER WARNING] Failed to remove old log file {}: {}",
                path.display(),
                e
            ),
        }
    }
    removed
}
