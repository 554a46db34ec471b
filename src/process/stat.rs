//! Parsing of the positional `/proc/<pid>/stat` record.
//!
//! One line holds the identity (pid, name, state, parent) and the CPU and
//! start-time counters. The name sits in parentheses and may itself contain
//! spaces and parentheses, so it is bounded by the first `(` and the *last*
//! `)` before any field is indexed.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::FacetError;
use crate::process::Pid;

// Field indices counted from the state field that follows the name.
const FIELD_STATE: usize = 0;
const FIELD_PPID: usize = 1;
const FIELD_UTIME: usize = 11;
const FIELD_STIME: usize = 12;
const FIELD_CUTIME: usize = 13;
const FIELD_CSTIME: usize = 14;
const FIELD_NUM_THREADS: usize = 17;
const FIELD_STARTTIME: usize = 19;

/// Process lifecycle state from the single-letter stat field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Running,
    Sleeping,
    DiskSleep,
    Zombie,
    Stopped,
    TracingStop,
    Idle,
    Dead,
    Unknown,
}

impl LifecycleState {
    pub fn from_char(c: char) -> Self {
        match c {
            'R' => LifecycleState::Running,
            'S' => LifecycleState::Sleeping,
            'D' => LifecycleState::DiskSleep,
            'Z' => LifecycleState::Zombie,
            'T' => LifecycleState::Stopped,
            't' => LifecycleState::TracingStop,
            'I' => LifecycleState::Idle,
            'X' | 'x' => LifecycleState::Dead,
            _ => LifecycleState::Unknown,
        }
    }

    /// Canonical stat letter of the state, `?` for [`LifecycleState::Unknown`].
    pub fn as_char(&self) -> char {
        match self {
            LifecycleState::Running => 'R',
            LifecycleState::Sleeping => 'S',
            LifecycleState::DiskSleep => 'D',
            LifecycleState::Zombie => 'Z',
            LifecycleState::Stopped => 'T',
            LifecycleState::TracingStop => 't',
            LifecycleState::Idle => 'I',
            LifecycleState::Dead => 'X',
            LifecycleState::Unknown => '?',
        }
    }

    /// Human-readable explanation of the state.
    pub fn description(&self) -> &'static str {
        match self {
            LifecycleState::Running => "Running or runnable (on CPU/run queue)",
            LifecycleState::Sleeping => "Sleeping (interruptible wait)",
            LifecycleState::DiskSleep => "Uninterruptible sleep (usually I/O)",
            LifecycleState::Zombie => "Zombie (defunct, waiting to be reaped)",
            LifecycleState::Stopped => "Stopped (job control signal or trace)",
            LifecycleState::TracingStop => "Tracing stop (ptrace)",
            LifecycleState::Idle => "Idle kernel thread",
            LifecycleState::Dead => "Dead (should never be visible)",
            LifecycleState::Unknown => "Unknown / other state",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LifecycleState::Running => "running",
            LifecycleState::Sleeping => "sleeping",
            LifecycleState::DiskSleep => "disk_sleep",
            LifecycleState::Zombie => "zombie",
            LifecycleState::Stopped => "stopped",
            LifecycleState::TracingStop => "tracing_stop",
            LifecycleState::Idle => "idle",
            LifecycleState::Dead => "dead",
            LifecycleState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// CPU time in clock ticks. Children values only cover reaped children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuTimes {
    pub utime: u64,
    pub stime: u64,
    pub cutime: i64,
    pub cstime: i64,
}

impl CpuTimes {
    pub fn total_own(&self) -> u64 {
        self.utime + self.stime
    }

    pub fn total_with_children(&self) -> u64 {
        let children = (self.cutime + self.cstime).max(0) as u64;
        self.total_own() + children
    }
}

/// The fields of one stat line this crate cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatRecord {
    pub pid: Pid,
    pub name: String,
    pub state_char: char,
    pub state: LifecycleState,
    pub ppid: Pid,
    pub cpu: CpuTimes,
    pub num_threads: u64,
    pub start_ticks: u64,
}

fn field<T: std::str::FromStr>(fields: &[&str], idx: usize, label: &str) -> Result<T, FacetError> {
    fields
        .get(idx)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| FacetError::malformed(format!("Failed to parse {} field", label)))
}

/// Parses a raw stat line.
pub fn parse_stat(content: &str) -> Result<StatRecord, FacetError> {
    let open = content
        .find('(')
        .ok_or_else(|| FacetError::malformed("Missing name start"))?;
    let close = content
        .rfind(')')
        .ok_or_else(|| FacetError::malformed("Missing name end"))?;
    if close < open {
        return Err(FacetError::malformed("Name delimiters out of order"));
    }

    let pid: Pid = content[..open]
        .trim()
        .parse()
        .map_err(|_| FacetError::malformed("Failed to parse pid field"))?;
    let name = content[open + 1..close].to_string();

    let fields: Vec<&str> = content[close + 1..].split_whitespace().collect();
    if fields.len() <= FIELD_STARTTIME {
        return Err(FacetError::malformed(format!(
            "Insufficient stat fields: {}",
            fields.len()
        )));
    }

    let state_char = fields[FIELD_STATE]
        .chars()
        .next()
        .ok_or_else(|| FacetError::malformed("Empty state field"))?;

    // ppid is signed in the kernel format; anything negative means "no parent"
    let ppid: i64 = field(&fields, FIELD_PPID, "ppid")?;

    Ok(StatRecord {
        pid,
        name,
        state_char,
        state: LifecycleState::from_char(state_char),
        ppid: Pid::try_from(ppid).unwrap_or(0),
        cpu: CpuTimes {
            utime: field(&fields, FIELD_UTIME, "utime")?,
            stime: field(&fields, FIELD_STIME, "stime")?,
            cutime: field(&fields, FIELD_CUTIME, "cutime")?,
            cstime: field(&fields, FIELD_CSTIME, "cstime")?,
        },
        num_threads: field(&fields, FIELD_NUM_THREADS, "num_threads")?,
        start_ticks: field(&fields, FIELD_STARTTIME, "starttime")?,
    })
}

/// Reads and parses `<proc_path>/stat`.
///
/// The name field holds raw bytes from the kernel and need not be UTF-8,
/// so the line is decoded lossily.
pub fn read_stat(proc_path: &Path) -> Result<StatRecord, FacetError> {
    let bytes = fs::read(proc_path.join("stat"))?;
    parse_stat(&String::from_utf8_lossy(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const STAT_LINE: &str = "1234 (test_process) S 1 1234 1234 0 -1 4194304 100 0 0 0 1000 500 7 3 20 0 4 0 12345 12345678 1234 18446744073709551615 4194304 4238788 140736466511168 0 0 0 0 0 0 0 0 0 17 1 0 0 0 0 0";

    // -------------------------------------------------------------------------
    // Tests for parse_stat
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_stat() {
        let rec = parse_stat(STAT_LINE).unwrap();
        assert_eq!(rec.pid, 1234);
        assert_eq!(rec.name, "test_process");
        assert_eq!(rec.state, LifecycleState::Sleeping);
        assert_eq!(rec.ppid, 1);
        assert_eq!(rec.cpu.utime, 1000);
        assert_eq!(rec.cpu.stime, 500);
        assert_eq!(rec.cpu.cutime, 7);
        assert_eq!(rec.cpu.cstime, 3);
        assert_eq!(rec.num_threads, 4);
        assert_eq!(rec.start_ticks, 12345);
    }

    #[test]
    fn test_parse_stat_name_with_parenthesis() {
        let line = STAT_LINE.replace("(test_process)", "(a)b)");
        let rec = parse_stat(&line).unwrap();
        assert_eq!(rec.name, "a)b");
        assert_eq!(rec.ppid, 1);
        assert_eq!(rec.cpu.utime, 1000);
        assert_eq!(rec.start_ticks, 12345);
    }

    #[test]
    fn test_parse_stat_name_with_spaces_and_parens() {
        let line = STAT_LINE.replace("(test_process)", "(my (weird) name )");
        let rec = parse_stat(&line).unwrap();
        assert_eq!(rec.name, "my (weird) name ");
        assert_eq!(rec.state, LifecycleState::Sleeping);
        assert_eq!(rec.cpu.stime, 500);
    }

    #[test]
    fn test_parse_stat_truncated() {
        assert!(matches!(
            parse_stat("1234 (test) S 1 2 3"),
            Err(FacetError::Malformed(_))
        ));
        assert!(matches!(
            parse_stat("1234 (test"),
            Err(FacetError::Malformed(_))
        ));
        assert!(matches!(parse_stat(""), Err(FacetError::Malformed(_))));
    }

    #[test]
    fn test_parse_stat_non_numeric_field() {
        let line = STAT_LINE.replace(" 1000 500 ", " abc 500 ");
        assert!(matches!(parse_stat(&line), Err(FacetError::Malformed(_))));
    }

    #[test]
    fn test_parse_stat_kernel_thread_has_no_parent() {
        let line = STAT_LINE
            .replace("(test_process) S 1 ", "(kthreadd) S 0 ")
            .replacen("1234", "2", 1);
        let rec = parse_stat(&line).unwrap();
        assert_eq!(rec.pid, 2);
        assert_eq!(rec.ppid, 0);
    }

    #[test]
    fn test_read_stat_non_utf8_name() {
        let dir = tempdir().expect("Failed to create temp dir");
        let mut raw = b"77 (caf\xe9) S 1 ".to_vec();
        raw.extend_from_slice(b"77 77 0 -1 0 0 0 0 0 5 6 0 0 20 0 1 0 900 0 0 0\n");
        fs::write(dir.path().join("stat"), raw).expect("write");

        let rec = read_stat(dir.path()).unwrap();
        assert_eq!(rec.pid, 77);
        assert_eq!(rec.name, "caf\u{FFFD}");
        assert_eq!(rec.ppid, 1);
        assert_eq!(rec.cpu.utime, 5);
        assert_eq!(rec.start_ticks, 900);
    }

    #[test]
    fn test_read_stat_missing_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        assert!(matches!(read_stat(dir.path()), Err(FacetError::Vanished)));
    }

    // -------------------------------------------------------------------------
    // Tests for LifecycleState / CpuTimes
    // -------------------------------------------------------------------------

    #[test]
    fn test_lifecycle_state_from_char() {
        assert_eq!(LifecycleState::from_char('R'), LifecycleState::Running);
        assert_eq!(LifecycleState::from_char('D'), LifecycleState::DiskSleep);
        assert_eq!(LifecycleState::from_char('Z'), LifecycleState::Zombie);
        assert_eq!(LifecycleState::from_char('T'), LifecycleState::Stopped);
        assert_eq!(LifecycleState::from_char('t'), LifecycleState::TracingStop);
        assert_eq!(LifecycleState::from_char('I'), LifecycleState::Idle);
        assert_eq!(LifecycleState::from_char('x'), LifecycleState::Dead);
        assert_eq!(LifecycleState::from_char('W'), LifecycleState::Unknown);
        assert_eq!(LifecycleState::Zombie.to_string(), "zombie");
    }

    #[test]
    fn test_lifecycle_state_as_char() {
        for c in ['R', 'S', 'D', 'Z', 'T', 't', 'I', 'X'] {
            assert_eq!(LifecycleState::from_char(c).as_char(), c);
        }
        assert_eq!(LifecycleState::from_char('K').as_char(), '?');
        assert_eq!(
            LifecycleState::DiskSleep.description(),
            "Uninterruptible sleep (usually I/O)"
        );
    }

    #[test]
    fn test_cpu_times_totals() {
        let cpu = CpuTimes {
            utime: 10,
            stime: 5,
            cutime: 3,
            cstime: 2,
        };
        assert_eq!(cpu.total_own(), 15);
        assert_eq!(cpu.total_with_children(), 20);
    }
}
