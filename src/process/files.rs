//! Working directory and open-handle facets.
//!
//! Both need the same privilege as ptrace on the target, so unprivileged
//! scans mostly see `PermissionDenied` for other users' processes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::FacetError;

/// Open file descriptor counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenFiles {
    /// Entries in `fd/`.
    pub fd_count: usize,
    /// Entries in `fdinfo/`, when readable. Normally equal to `fd_count`.
    pub fdinfo_count: Option<usize>,
}

/// Counts directory entries, excluding the `.` and `..` pseudo-entries.
fn count_entries(dir: &Path) -> Result<usize, FacetError> {
    let count = fs::read_dir(dir)?
        .flatten()
        .filter(|e| {
            let name = e.file_name();
            name != "." && name != ".."
        })
        .count();
    Ok(count)
}

/// Reads the open-handle facet. A readable but empty `fd/` is a valid zero.
pub fn read_open_files(proc_path: &Path) -> Result<OpenFiles, FacetError> {
    let fd_count = count_entries(&proc_path.join("fd"))?;
    let fdinfo_count = count_entries(&proc_path.join("fdinfo")).ok();
    Ok(OpenFiles {
        fd_count,
        fdinfo_count,
    })
}

/// Reads the target of the `cwd` symlink.
pub fn read_cwd(proc_path: &Path) -> Result<String, FacetError> {
    let target = fs::read_link(proc_path.join("cwd"))?;
    Ok(target.to_string_lossy().into_owned())
}
