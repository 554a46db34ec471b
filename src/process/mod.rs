//! Process-table readers: discovery plus one extractor per facet.
//!
//! This module provides:
//! - `scanner`: pid directory discovery
//! - `comm`: short names
//! - `stat`: identity, lifecycle state, CPU time and start ticks
//! - `status`: memory and credentials
//! - `environ`: environment variables
//! - `maps`: loaded shared libraries
//! - `threads`: thread ids and names
//! - `files`: working directory and open-handle counts
//! - `uptime`: start time and uptime derivation

pub mod comm;
pub mod environ;
pub mod files;
pub mod maps;
pub mod scanner;
pub mod stat;
pub mod status;
pub mod threads;
pub mod uptime;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kernel process identifier. Transient: reused after the process dies.
pub type Pid = u32;

// Re-export commonly used types
pub use comm::{normalize_name, read_comm, MAX_NAME_LEN};
pub use environ::{read_environ, split_environ, Environment};
pub use files::{read_cwd, read_open_files, OpenFiles};
pub use maps::{parse_maps, read_libraries};
pub use scanner::{collect_proc_entries, iter_proc_entries, parse_pid, ProcEntry, ScanLimits};
pub use stat::{parse_stat, read_stat, CpuTimes, LifecycleState, StatRecord};
pub use status::{parse_credentials, parse_memory, read_status, Credentials, IdQuad, MemoryUsage};
pub use threads::{read_threads, ThreadInfo};
pub use uptime::{derive_times, format_uptime, ProcessTimes};

/// One independently extracted attribute category.
///
/// Identity (pid, name, parent, state) is always extracted and is not a
/// facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Cpu,
    Memory,
    Credentials,
    Cwd,
    Environment,
    OpenFiles,
    Threads,
    Libraries,
    Uptime,
}

impl Facet {
    pub const ALL: [Facet; 9] = [
        Facet::Cpu,
        Facet::Memory,
        Facet::Credentials,
        Facet::Cwd,
        Facet::Environment,
        Facet::OpenFiles,
        Facet::Threads,
        Facet::Libraries,
        Facet::Uptime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::Cpu => "cpu",
            Facet::Memory => "memory",
            Facet::Credentials => "credentials",
            Facet::Cwd => "cwd",
            Facet::Environment => "environment",
            Facet::OpenFiles => "open_files",
            Facet::Threads => "threads",
            Facet::Libraries => "libraries",
            Facet::Uptime => "uptime",
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Facet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Facet::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Unknown facet '{}', expected one of: {}",
                    s,
                    Facet::ALL.map(|f| f.as_str()).join(", ")
                )
            })
    }
}

/// Set of facets requested for a census.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FacetSet(u16);

impl FacetSet {
    pub fn empty() -> Self {
        FacetSet(0)
    }

    pub fn all() -> Self {
        Facet::ALL.iter().copied().collect()
    }

    pub fn insert(&mut self, facet: Facet) {
        self.0 |= facet.bit();
    }

    pub fn with(mut self, facet: Facet) -> Self {
        self.insert(facet);
        self
    }

    pub fn contains(&self, facet: Facet) -> bool {
        self.0 & facet.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Facet> + '_ {
        Facet::ALL.iter().copied().filter(move |f| self.contains(*f))
    }

    /// Parses a comma-separated list; `all` selects every facet.
    pub fn parse_list(list: &str) -> Result<Self, String> {
        let mut set = FacetSet::empty();
        for part in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if part.eq_ignore_ascii_case("all") {
                return Ok(FacetSet::all());
            }
            set.insert(part.parse()?);
        }
        Ok(set)
    }
}

impl FromIterator<Facet> for FacetSet {
    fn from_iter<T: IntoIterator<Item = Facet>>(iter: T) -> Self {
        let mut set = FacetSet::empty();
        for f in iter {
            set.insert(f);
        }
        set
    }
}
