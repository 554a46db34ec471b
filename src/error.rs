//! Error taxonomy for the process census.
//!
//! Two levels exist:
//! - [`CensusError`] aborts a whole census run and yields no snapshot.
//! - [`FacetError`] is a per-process skip. It never leaves the extractor
//!   boundary except as an absent facet on an otherwise complete record.

use std::io;
use std::path::PathBuf;

/// Fatal failures that abort a census.
#[derive(Debug, thiserror::Error)]
pub enum CensusError {
    #[error("Cannot read process table {path}: {source}")]
    ProcTableUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid clock ticks per second: {0}")]
    InvalidClockTicks(i64),

    #[error("Cannot determine boot time from {path}: {reason}")]
    BootTimeUnavailable { path: PathBuf, reason: String },

    #[error("Census cancelled")]
    Cancelled,
}

/// Reasons a single facet of a single process could not be extracted.
#[derive(Debug, thiserror::Error)]
pub enum FacetError {
    #[error("process vanished")]
    Vanished,

    #[error("permission denied")]
    PermissionDenied,

    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("empty result")]
    Empty,

    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for FacetError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => FacetError::Vanished,
            io::ErrorKind::PermissionDenied => FacetError::PermissionDenied,
            _ => {
                // ESRCH surfaces when a pid dies while its files are open
                if e.raw_os_error() == Some(libc::ESRCH) {
                    FacetError::Vanished
                } else {
                    FacetError::Io(e)
                }
            }
        }
    }
}

impl FacetError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        FacetError::Malformed(msg.into())
    }
}
