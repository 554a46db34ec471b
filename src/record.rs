//! Snapshot data model.
//!
//! This module provides the `ProcessRecord` produced per scanned process
//! and the `Snapshot` that holds one census worth of records, sorted by pid.

use serde::Serialize;

use crate::process::{
    Credentials, CpuTimes, Environment, Facet, LifecycleState, MemoryUsage, OpenFiles, Pid,
    ProcessTimes, ThreadInfo,
};

/// One successfully scanned process. Facet fields are `None` when the
/// facet was not requested or its extractor skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessRecord {
    pub pid: Pid,
    pub short_name: String,
    /// 0 when the process has no parent (pid 1, kthreadd, or parent reaped).
    pub parent_pid: Pid,
    pub state: LifecycleState,
    /// Raw stat state letter. Letters without a [`LifecycleState`] (`K`,
    /// `W`, `P`) survive here while `state` is `unknown`.
    pub state_code: char,
    pub state_description: &'static str,
    /// Thread count reported by stat, available without the threads facet.
    pub num_threads: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuTimes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_files: Option<OpenFiles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<Vec<ThreadInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub libraries: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub times: Option<ProcessTimes>,
}

impl ProcessRecord {
    /// A record carrying identity only.
    pub fn new(pid: Pid, short_name: impl Into<String>, parent_pid: Pid, state: LifecycleState) -> Self {
        Self {
            pid,
            short_name: short_name.into(),
            parent_pid,
            state,
            state_code: state.as_char(),
            state_description: state.description(),
            num_threads: 0,
            cpu: None,
            memory: None,
            credentials: None,
            cwd: None,
            environment: None,
            open_files: None,
            threads: None,
            libraries: None,
            times: None,
        }
    }

    /// Parent pid, or `None` when the record is rootless (0 or self).
    pub fn parent(&self) -> Option<Pid> {
        if self.parent_pid == 0 || self.parent_pid == self.pid {
            None
        } else {
            Some(self.parent_pid)
        }
    }
}

/// Counters describing one census run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CensusStats {
    /// Pid directories listed by the enumerator.
    pub candidates: usize,
    /// Records in the snapshot.
    pub records: usize,
    /// Candidates dropped because identity extraction failed.
    pub identity_skips: usize,
    /// Skips per requested facet, in facet order.
    pub facet_skips: Vec<(Facet, usize)>,
}

impl CensusStats {
    pub fn facet_skips_for(&self, facet: Facet) -> usize {
        self.facet_skips
            .iter()
            .find(|(f, _)| *f == facet)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// Result of one census: records sorted ascending by unique pid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Capture time, epoch seconds.
    pub captured_at: i64,
    pub clock_ticks: u64,
    /// Boot time in epoch seconds, when the uptime facet was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_time: Option<i64>,
    pub stats: CensusStats,
    pub records: Vec<ProcessRecord>,
}

impl Snapshot {
    /// Builds a snapshot from records in any order. Records are sorted by
    /// pid; if a pid occurs more than once only the first is kept.
    pub fn from_records(mut records: Vec<ProcessRecord>) -> Self {
        records.sort_by_key(|r| r.pid);
        records.dedup_by_key(|r| r.pid);
        Self {
            records,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProcessRecord> {
        self.records.iter()
    }

    /// Binary search by pid.
    pub fn get(&self, pid: Pid) -> Option<&ProcessRecord> {
        self.records
            .binary_search_by_key(&pid, |r| r.pid)
            .ok()
            .map(|idx| &self.records[idx])
    }

    pub fn pids(&self) -> Vec<Pid> {
        self.records.iter().map(|r| r.pid).collect()
    }
}
