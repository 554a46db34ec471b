//! Process discovery in the process table.
//!
//! This module lists the process-table directory and yields the numeric
//! pid directories it contains. Everything else (`self`, `meminfo`, ...)
//! is skipped.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::CensusError;
use crate::process::Pid;

/// Process entry representing a pid directory in the process table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcEntry {
    pub pid: Pid,
    pub proc_path: PathBuf,
}

/// Bounds applied while listing the process table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanLimits {
    /// Pids above this value are skipped.
    pub max_pid: Option<Pid>,
    /// Stop after this many candidates.
    pub max_processes: Option<usize>,
}

/// Parses a directory name as a pid: all ASCII digits, positive.
pub fn parse_pid(name: &str) -> Option<Pid> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match name.parse::<Pid>() {
        Ok(0) | Err(_) => None,
        Ok(pid) => Some(pid),
    }
}

/// Lazily iterates candidate pid directories under `root`.
///
/// Opening `root` is the only fatal step. Entries that fail to read or
/// stat are skipped, since they usually belong to exiting processes.
pub fn iter_proc_entries(
    root: &Path,
    limits: ScanLimits,
) -> Result<impl Iterator<Item = ProcEntry>, CensusError> {
    let entries = fs::read_dir(root).map_err(|source| CensusError::ProcTableUnreadable {
        path: root.to_path_buf(),
        source,
    })?;

    let iter = entries
        .flatten()
        .filter_map(move |entry| {
            let name = entry.file_name();
            let pid = parse_pid(name.to_str()?)?;

            if let Some(max_pid) = limits.max_pid {
                if pid > max_pid {
                    debug!("Skipping pid {}: above max_pid {}", pid, max_pid);
                    return None;
                }
            }

            // file_type() does not follow symlinks, which keeps `self` out
            match entry.file_type() {
                Ok(ft) if ft.is_dir() => Some(ProcEntry {
                    pid,
                    proc_path: entry.path(),
                }),
                _ => None,
            }
        })
        .take(limits.max_processes.unwrap_or(usize::MAX));

    Ok(iter)
}

/// Collects all candidate entries under `root`. Order follows the directory
/// listing and is not guaranteed.
pub fn collect_proc_entries(root: &Path, limits: ScanLimits) -> Result<Vec<ProcEntry>, CensusError> {
    Ok(iter_proc_entries(root, limits)?.collect())
}
