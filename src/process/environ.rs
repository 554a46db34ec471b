//! Environment blobs from `/proc/<pid>/environ`.
//!
//! The blob is a sequence of NUL-terminated `KEY=VALUE` strings. Reading
//! another user's environment needs privileges, so `PermissionDenied` is the
//! common outcome of an unprivileged scan.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::FacetError;

/// Ordered environment entries of one process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment {
    pub entries: Vec<String>,
}

impl Environment {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Splits every entry at its first `=`. Entries without one get an empty value.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|e| e.split_once('=').unwrap_or((e.as_str(), "")))
    }

    /// Value of the first entry named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Splits a NUL-delimited blob; zero-length fragments are dropped.
pub fn split_environ(blob: &[u8]) -> Vec<String> {
    blob.split(|&b| b == 0u8)
        .filter(|s| !s.is_empty())
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect()
}

/// Reads the environment facet. An empty environment cannot be told apart
/// from a failed read and is reported as [`FacetError::Empty`].
pub fn read_environ(proc_path: &Path) -> Result<Environment, FacetError> {
    let blob = fs::read(proc_path.join("environ"))?;
    let entries = split_environ(&blob);
    if entries.is_empty() {
        return Err(FacetError::Empty);
    }
    Ok(Environment { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_split_environ_drops_empty_fragments() {
        assert_eq!(split_environ(b"A=1\0\0B=2\0"), vec!["A=1", "B=2"]);
        assert_eq!(split_environ(b"\0\0\0"), Vec::<String>::new());
        assert_eq!(split_environ(b""), Vec::<String>::new());
        assert_eq!(split_environ(b"NOTRAILING=1"), vec!["NOTRAILING=1"]);
    }

    #[test]
    fn test_split_environ_invalid_utf8_is_lossy() {
        let out = split_environ(b"K=\xff\0");
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("K="));
    }

    #[test]
    fn test_environment_lookup() {
        let env = Environment {
            entries: split_environ(b"PATH=/bin:/usr/bin\0EQ=a=b\0FLAG\0"),
        };
        assert_eq!(env.get("PATH"), Some("/bin:/usr/bin"));
        assert_eq!(env.get("EQ"), Some("a=b"));
        assert_eq!(env.get("FLAG"), Some(""));
        assert_eq!(env.get("MISSING"), None);
        assert_eq!(env.len(), 3);
    }

    #[test]
    fn test_read_environ_empty_is_skip() {
        let dir = tempdir().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("environ"), b"").expect("write");
        assert!(matches!(read_environ(dir.path()), Err(FacetError::Empty)));
    }

    #[test]
    fn test_read_environ() {
        let dir = tempdir().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("environ"), b"HOME=/root\0LANG=C\0").expect("write");
        let env = read_environ(dir.path()).unwrap();
        assert_eq!(env.entries, vec!["HOME=/root", "LANG=C"]);
    }
}
