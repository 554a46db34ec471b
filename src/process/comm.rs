//! Short process names from `/proc/<pid>/comm`.

use std::fs;
use std::path::Path;

use crate::error::FacetError;

/// Maximum visible characters of a short name (kernel TASK_COMM_LEN plus slack).
pub const MAX_NAME_LEN: usize = 16;

/// Strips one trailing newline and truncates to [`MAX_NAME_LEN`] characters.
pub fn normalize_name(raw: &str) -> String {
    let line = raw.strip_suffix('\n').unwrap_or(raw);
    line.chars().take(MAX_NAME_LEN).collect()
}

/// Reads a `comm` file. `proc_path` may be a process or a task directory.
pub fn read_comm(proc_path: &Path) -> Result<String, FacetError> {
    let bytes = fs::read(proc_path.join("comm"))?;
    Ok(normalize_name(&String::from_utf8_lossy(&bytes)))
}
