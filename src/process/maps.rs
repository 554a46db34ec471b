//! Loaded shared libraries from `/proc/<pid>/maps`.
//!
//! A maps line looks like
//! `7f8b5c000000-7f8b5c021000 r-xp 00000000 08:01 1234567 /usr/lib/libc.so.6`.
//! The address, permission, offset, device and inode columns never contain
//! a `/`, so the path column starts at the first `/` of the line.

use ahash::AHashSet;
use std::fs;
use std::path::Path;

use crate::error::FacetError;

const SHARED_LIB_MARKER: &str = ".so";
const DELETED_SUFFIX: &str = " (deleted)";

/// Extracts the shared-library path of one maps line, if it has one.
pub fn library_path(line: &str) -> Option<&str> {
    let start = line.find('/')?;
    let path = line[start..].trim_end();
    let path = path.strip_suffix(DELETED_SUFFIX).unwrap_or(path);

    let file_name = path.rsplit('/').next()?;
    if file_name.contains(SHARED_LIB_MARKER) {
        Some(path)
    } else {
        None
    }
}

/// Collects unique library paths in first-seen order.
pub fn parse_maps<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = AHashSet::new();
    let mut libs = Vec::new();

    for line in lines {
        if let Some(path) = library_path(line.as_ref()) {
            if seen.insert(path.to_string()) {
                libs.push(path.to_string());
            }
        }
    }
    libs
}

/// Reads the library facet. A process without any shared library (static
/// binaries, kernel threads) is reported as [`FacetError::Empty`].
///
/// Paths are arbitrary bytes, so each line is decoded on its own and
/// lossily. A bad line never discards the rest of the mapping.
pub fn read_libraries(proc_path: &Path) -> Result<Vec<String>, FacetError> {
    let content = fs::read(proc_path.join("maps"))?;
    let libs = parse_maps(content.split(|b| *b == b'\n').map(String::from_utf8_lossy));
    if libs.is_empty() {
        return Err(FacetError::Empty);
    }
    Ok(libs)
}
