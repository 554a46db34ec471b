//! Thread enumeration from `/proc/<pid>/task/`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::FacetError;
use crate::process::comm::read_comm;
use crate::process::scanner::parse_pid;
use crate::process::Pid;

/// One thread of a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadInfo {
    pub tid: Pid,
    pub name: String,
}

/// Lists the threads of a process in ascending tid order.
///
/// A thread whose `comm` disappears mid-scan is omitted, so the count is the
/// number of names actually read. Zero threads is reported as
/// [`FacetError::Empty`].
pub fn read_threads(proc_path: &Path) -> Result<Vec<ThreadInfo>, FacetError> {
    let entries = fs::read_dir(proc_path.join("task"))?;

    let mut tids: Vec<Pid> = entries
        .flatten()
        .filter(|e| e.file_type().map(|ft| ft.is_dir()).unwrap_or(false))
        .filter_map(|e| parse_pid(e.file_name().to_str()?))
        .collect();
    tids.sort_unstable();

    let task_dir = proc_path.join("task");
    let threads: Vec<ThreadInfo> = tids
        .into_iter()
        .filter_map(|tid| {
            read_comm(&task_dir.join(tid.to_string()))
                .ok()
                .map(|name| ThreadInfo { tid, name })
        })
        .collect();

    if threads.is_empty() {
        return Err(FacetError::Empty);
    }
    Ok(threads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn add_thread(proc_path: &Path, tid: &str, comm: Option<&str>) {
        let dir = proc_path.join("task").join(tid);
        fs::create_dir_all(&dir).expect("mkdir");
        if let Some(c) = comm {
            fs::write(dir.join("comm"), c).expect("write");
        }
    }

    #[test]
    fn test_read_threads_sorted_by_tid() {
        let dir = tempdir().expect("Failed to create temp dir");
        add_thread(dir.path(), "120", Some("worker-2\n"));
        add_thread(dir.path(), "100", Some("main\n"));
        add_thread(dir.path(), "110", Some("worker-1\n"));

        let threads = read_threads(dir.path()).unwrap();
        let tids: Vec<Pid> = threads.iter().map(|t| t.tid).collect();
        assert_eq!(tids, vec![100, 110, 120]);
        assert_eq!(threads[0].name, "main");
    }

    #[test]
    fn test_read_threads_omits_vanished_thread() {
        let dir = tempdir().expect("Failed to create temp dir");
        add_thread(dir.path(), "100", Some("main\n"));
        add_thread(dir.path(), "101", None);
        fs::write(dir.path().join("task").join("notes"), "x").expect("write");

        let threads = read_threads(dir.path()).unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].tid, 100);
    }

    #[test]
    fn test_read_threads_none_readable_is_skip() {
        let dir = tempdir().expect("Failed to create temp dir");
        add_thread(dir.path(), "100", None);
        assert!(matches!(read_threads(dir.path()), Err(FacetError::Empty)));
    }

    #[test]
    fn test_read_threads_missing_task_dir() {
        let dir = tempdir().expect("Failed to create temp dir");
        assert!(matches!(read_threads(dir.path()), Err(FacetError::Vanished)));
    }
}
