//! Key-prefixed records from `/proc/<pid>/status`.
//!
//! This module provides the memory and credential facets. Each line is
//! tested for a known key prefix; unknown keys are ignored and a facet is
//! only accepted once its required keys were all found.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::FacetError;

/// Memory figures in KiB as reported by the kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub vm_size_kb: u64,
    pub vm_rss_kb: u64,
    pub vm_hwm_kb: u64,
    pub vm_swap_kb: u64,
    pub vm_data_kb: u64,
    pub vm_stk_kb: u64,
}

/// Real, effective, saved and filesystem ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdQuad {
    pub real: u32,
    pub effective: u32,
    pub saved: u32,
    pub fs: u32,
}

/// User and group credentials of a process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub uid: IdQuad,
    pub gid: IdQuad,
}

/// Parses kilobyte values from status lines ("   1234 kB").
pub fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}

/// Parses exactly four whitespace-separated ids.
fn parse_id_quad(v: &str) -> Option<IdQuad> {
    let mut it = v.split_whitespace().map(|s| s.parse::<u32>());
    let quad = IdQuad {
        real: it.next()?.ok()?,
        effective: it.next()?.ok()?,
        saved: it.next()?.ok()?,
        fs: it.next()?.ok()?,
    };
    Some(quad)
}

/// Extracts the memory facet. Requires `VmSize:` and `VmRSS:`; kernel
/// threads carry neither and are skipped.
pub fn parse_memory(content: &str) -> Result<MemoryUsage, FacetError> {
    let mut mem = MemoryUsage::default();
    let mut found_size = false;
    let mut found_rss = false;

    for line in content.lines() {
        if let Some(v) = line.strip_prefix("VmSize:") {
            if let Some(kb) = parse_kb_value(v) {
                mem.vm_size_kb = kb;
                found_size = true;
            }
        } else if let Some(v) = line.strip_prefix("VmRSS:") {
            if let Some(kb) = parse_kb_value(v) {
                mem.vm_rss_kb = kb;
                found_rss = true;
            }
        } else if let Some(v) = line.strip_prefix("VmHWM:") {
            mem.vm_hwm_kb = parse_kb_value(v).unwrap_or(0);
        } else if let Some(v) = line.strip_prefix("VmSwap:") {
            mem.vm_swap_kb = parse_kb_value(v).unwrap_or(0);
        } else if let Some(v) = line.strip_prefix("VmData:") {
            mem.vm_data_kb = parse_kb_value(v).unwrap_or(0);
        } else if let Some(v) = line.strip_prefix("VmStk:") {
            mem.vm_stk_kb = parse_kb_value(v).unwrap_or(0);
        }
    }

    if !(found_size && found_rss) {
        return Err(FacetError::malformed("Missing VmSize/VmRSS"));
    }
    Ok(mem)
}

/// Extracts the credential facet. Requires both `Uid:` and `Gid:` lines
/// with four ids each.
pub fn parse_credentials(content: &str) -> Result<Credentials, FacetError> {
    let mut uid = None;
    let mut gid = None;

    for line in content.lines() {
        if let Some(v) = line.strip_prefix("Uid:") {
            uid = parse_id_quad(v);
        } else if let Some(v) = line.strip_prefix("Gid:") {
            gid = parse_id_quad(v);
        }

        if uid.is_some() && gid.is_some() {
            break;
        }
    }

    match (uid, gid) {
        (Some(uid), Some(gid)) => Ok(Credentials { uid, gid }),
        _ => Err(FacetError::malformed("Missing Uid/Gid")),
    }
}

/// Reads `<proc_path>/status` once so several facets can share it.
/// Decoded lossily: the `Name:` line carries the raw process name bytes.
pub fn read_status(proc_path: &Path) -> Result<String, FacetError> {
    let bytes = fs::read(proc_path.join("status"))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = "Name:\tbash\n\
Umask:\t0022\n\
State:\tS (sleeping)\n\
Tgid:\t4242\n\
Pid:\t4242\n\
PPid:\t4000\n\
Uid:\t1000\t1001\t1002\t1003\n\
Gid:\t100\t101\t102\t103\n\
VmPeak:\t   12000 kB\n\
VmSize:\t   11000 kB\n\
VmHWM:\t    5000 kB\n\
VmRSS:\t    4800 kB\n\
VmData:\t    2000 kB\n\
VmStk:\t     132 kB\n\
VmSwap:\t      16 kB\n\
Threads:\t1\n";

    // -------------------------------------------------------------------------
    // Tests for parse_kb_value
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_kb_value() {
        assert_eq!(parse_kb_value("       1234 kB"), Some(1234));
        assert_eq!(parse_kb_value("0 kB"), Some(0));
        assert_eq!(parse_kb_value("  42  "), Some(42));
        assert_eq!(parse_kb_value(""), None);
        assert_eq!(parse_kb_value("kB"), None);
        assert_eq!(parse_kb_value("-1 kB"), None);
    }

    // -------------------------------------------------------------------------
    // Tests for parse_memory
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_memory() {
        let mem = parse_memory(STATUS).unwrap();
        assert_eq!(
            mem,
            MemoryUsage {
                vm_size_kb: 11000,
                vm_rss_kb: 4800,
                vm_hwm_kb: 5000,
                vm_swap_kb: 16,
                vm_data_kb: 2000,
                vm_stk_kb: 132,
            }
        );
    }

    #[test]
    fn test_parse_memory_kernel_thread_is_skipped() {
        let kthread = "Name:\tkthreadd\nState:\tS (sleeping)\nPPid:\t0\nThreads:\t1\n";
        assert!(matches!(
            parse_memory(kthread),
            Err(FacetError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_memory_optional_keys_default_to_zero() {
        let minimal = "VmSize:\t100 kB\nVmRSS:\t50 kB\n";
        let mem = parse_memory(minimal).unwrap();
        assert_eq!(mem.vm_size_kb, 100);
        assert_eq!(mem.vm_rss_kb, 50);
        assert_eq!(mem.vm_swap_kb, 0);
        assert_eq!(mem.vm_stk_kb, 0);
    }

    #[test]
    fn test_parse_memory_ignores_unknown_keys() {
        let noisy = "VmSizeExtra:\t999 kB\nVmSize:\t100 kB\nFoo:\t1\nVmRSS:\t50 kB\n";
        assert_eq!(parse_memory(noisy).unwrap().vm_size_kb, 100);
    }

    // -------------------------------------------------------------------------
    // Tests for parse_credentials
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_credentials() {
        let creds = parse_credentials(STATUS).unwrap();
        assert_eq!(
            creds.uid,
            IdQuad {
                real: 1000,
                effective: 1001,
                saved: 1002,
                fs: 1003
            }
        );
        assert_eq!(creds.gid.real, 100);
        assert_eq!(creds.gid.fs, 103);
    }

    #[test]
    fn test_parse_credentials_requires_both_lines() {
        assert!(parse_credentials("Uid:\t0\t0\t0\t0\n").is_err());
        assert!(parse_credentials("Gid:\t0\t0\t0\t0\n").is_err());
    }

    #[test]
    fn test_parse_credentials_requires_four_ids() {
        let short = "Uid:\t0\t0\t0\nGid:\t0\t0\t0\t0\n";
        assert!(parse_credentials(short).is_err());
    }

    // -------------------------------------------------------------------------
    // Tests for read_status
    // -------------------------------------------------------------------------

    #[test]
    fn test_read_status_non_utf8_name() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut raw = b"Name:\tcaf\xe9\n".to_vec();
        raw.extend_from_slice(STATUS.split_once('\n').map(|(_, rest)| rest).unwrap_or("").as_bytes());
        fs::write(dir.path().join("status"), raw).expect("write");

        let content = read_status(dir.path()).unwrap();
        assert!(content.starts_with("Name:\tcaf\u{FFFD}\n"));
        assert_eq!(parse_memory(&content).unwrap().vm_rss_kb, 4800);
        assert_eq!(parse_credentials(&content).unwrap().uid.real, 1000);
    }

    #[test]
    fn test_read_status_missing_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        assert!(matches!(read_status(dir.path()), Err(FacetError::Vanished)));
    }
}
