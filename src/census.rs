//! Census aggregation.
//!
//! This module drives pid discovery, fans the per-process facet extraction
//! out over the rayon pool and assembles the pid-sorted [`Snapshot`].
//! Facet failures are logged, counted and leave the facet absent; only
//! the failures in [`CensusError`] abort a run.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::error::{CensusError, FacetError};
use crate::process::{
    collect_proc_entries, derive_times, normalize_name, parse_credentials, parse_memory,
    read_comm, read_cwd, read_environ, read_libraries, read_open_files, read_stat, read_status,
    read_threads, Facet, FacetSet, Pid, ProcEntry, ScanLimits,
};
use crate::record::{CensusStats, ProcessRecord, Snapshot};
use crate::system::{self, CLK_TCK};

/// Default process-table mount point.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Inputs of one census run.
#[derive(Debug, Clone)]
pub struct CensusOptions {
    pub proc_root: PathBuf,
    pub facets: FacetSet,
    /// Clock ticks per second used for all time facets.
    pub clock_ticks: i64,
    pub limits: ScanLimits,
}

impl Default for CensusOptions {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            facets: FacetSet::empty(),
            clock_ticks: *CLK_TCK,
            limits: ScanLimits::default(),
        }
    }
}

/// Shared flag that stops dispatch of new per-process work.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Values fixed for the whole run and shared by all workers.
struct ScanContext {
    facets: FacetSet,
    clock_ticks: u64,
    boot_time: Option<i64>,
    now: i64,
}

/// Per-facet skip counters, indexed by facet discriminant.
#[derive(Default)]
struct FacetCounters {
    skips: [AtomicUsize; Facet::ALL.len()],
}

impl FacetCounters {
    fn record(&self, facet: Facet) {
        self.skips[facet as usize].fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, facets: FacetSet) -> Vec<(Facet, usize)> {
        facets
            .iter()
            .map(|f| (f, self.skips[f as usize].load(Ordering::Relaxed)))
            .collect()
    }
}

/// Turns a facet result into an optional payload, logging and counting skips.
fn keep<T>(
    pid: Pid,
    facet: Facet,
    result: Result<T, FacetError>,
    counters: &FacetCounters,
) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            debug!("Skipping {} facet for pid {}: {}", facet, pid, e);
            counters.record(facet);
            None
        }
    }
}

/// Extracts the identity and every requested facet of one process.
///
/// Fails only when the identity (`stat`) cannot be read, which excludes the
/// process from the snapshot.
fn scan_process(
    entry: &ProcEntry,
    ctx: &ScanContext,
    counters: &FacetCounters,
) -> Result<ProcessRecord, FacetError> {
    let path = entry.proc_path.as_path();
    let pid = entry.pid;

    let stat = read_stat(path)?;
    if stat.pid != pid {
        return Err(FacetError::malformed(format!(
            "stat reports pid {} in directory of pid {}",
            stat.pid, pid
        )));
    }

    let short_name = read_comm(path).unwrap_or_else(|_| normalize_name(&stat.name));
    let mut record = ProcessRecord::new(pid, short_name, stat.ppid, stat.state);
    record.state_code = stat.state_char;
    record.num_threads = stat.num_threads;
    let facets = ctx.facets;

    if facets.contains(Facet::Cpu) {
        record.cpu = Some(stat.cpu);
    }

    if facets.contains(Facet::Uptime) {
        // boot_time is always resolved when Uptime is requested
        if let Some(boot_time) = ctx.boot_time {
            record.times = Some(derive_times(
                stat.start_ticks,
                boot_time,
                ctx.clock_ticks,
                ctx.now,
            ));
        }
    }

    let wants_memory = facets.contains(Facet::Memory);
    let wants_credentials = facets.contains(Facet::Credentials);
    if wants_memory || wants_credentials {
        match read_status(path) {
            Ok(content) => {
                if wants_memory {
                    record.memory = keep(pid, Facet::Memory, parse_memory(&content), counters);
                }
                if wants_credentials {
                    record.credentials =
                        keep(pid, Facet::Credentials, parse_credentials(&content), counters);
                }
            }
            Err(e) => {
                debug!("Cannot read status for pid {}: {}", pid, e);
                if wants_memory {
                    counters.record(Facet::Memory);
                }
                if wants_credentials {
                    counters.record(Facet::Credentials);
                }
            }
        }
    }

    if facets.contains(Facet::Cwd) {
        record.cwd = keep(pid, Facet::Cwd, read_cwd(path), counters);
    }
    if facets.contains(Facet::Environment) {
        record.environment = keep(pid, Facet::Environment, read_environ(path), counters);
    }
    if facets.contains(Facet::OpenFiles) {
        record.open_files = keep(pid, Facet::OpenFiles, read_open_files(path), counters);
    }
    if facets.contains(Facet::Threads) {
        record.threads = keep(pid, Facet::Threads, read_threads(path), counters);
    }
    if facets.contains(Facet::Libraries) {
        record.libraries = keep(pid, Facet::Libraries, read_libraries(path), counters);
    }

    Ok(record)
}

/// A configured census that can be cancelled from another thread.
pub struct Census {
    options: CensusOptions,
    cancel: CancelHandle,
}

impl Census {
    pub fn new(options: CensusOptions) -> Self {
        Self {
            options,
            cancel: CancelHandle::default(),
        }
    }

    pub fn options(&self) -> &CensusOptions {
        &self.options
    }

    /// Handle that stops the run from dispatching further processes.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Runs the census once.
    pub fn run(&self) -> Result<Snapshot, CensusError> {
        self.run_with_progress(|_| {})
    }

    /// Runs the census once, calling `progress` from the worker threads
    /// after each process is scanned.
    #[instrument(skip(self, progress), fields(proc_root = %self.options.proc_root.display()))]
    pub fn run_with_progress<F>(&self, progress: F) -> Result<Snapshot, CensusError>
    where
        F: Fn(&ProcessRecord) + Sync,
    {
        let start = Instant::now();
        let opts = &self.options;

        let clock_ticks = system::validate_clock_ticks(opts.clock_ticks)?;
        let now = chrono::Utc::now().timestamp();
        let boot_time = if opts.facets.contains(Facet::Uptime) {
            Some(system::read_boot_time(&opts.proc_root, now)?)
        } else {
            None
        };

        let entries = collect_proc_entries(&opts.proc_root, opts.limits)?;
        debug!(
            "Collected {} process entries from {}",
            entries.len(),
            opts.proc_root.display()
        );

        if self.cancel.is_cancelled() {
            return Err(CensusError::Cancelled);
        }

        let ctx = ScanContext {
            facets: opts.facets,
            clock_ticks,
            boot_time,
            now,
        };
        let counters = FacetCounters::default();
        let identity_skips = AtomicUsize::new(0);

        let records: Vec<ProcessRecord> = entries
            .par_iter()
            .filter_map(|entry| {
                if self.cancel.is_cancelled() {
                    return None;
                }
                match scan_process(entry, &ctx, &counters) {
                    Ok(record) => {
                        progress(&record);
                        Some(record)
                    }
                    Err(e) => {
                        debug!("Skipping process {}: {}", entry.pid, e);
                        identity_skips.fetch_add(1, Ordering::Relaxed);
                        None
                    }
                }
            })
            .collect();

        if self.cancel.is_cancelled() {
            info!("Census cancelled after {} records", records.len());
            return Err(CensusError::Cancelled);
        }

        let mut snapshot = Snapshot::from_records(records);
        snapshot.captured_at = now;
        snapshot.clock_ticks = clock_ticks;
        snapshot.boot_time = boot_time;
        snapshot.stats = CensusStats {
            candidates: entries.len(),
            records: snapshot.records.len(),
            identity_skips: identity_skips.load(Ordering::Relaxed),
            facet_skips: counters.snapshot(opts.facets),
        };

        info!(
            "Census completed in {:.2}ms: {} records from {} candidates ({} skipped)",
            start.elapsed().as_secs_f64() * 1000.0,
            snapshot.stats.records,
            snapshot.stats.candidates,
            snapshot.stats.identity_skips
        );
        for (facet, skips) in &snapshot.stats.facet_skips {
            if *skips > 0 {
                debug!("Facet {} absent on {} records", facet, skips);
            }
        }

        Ok(snapshot)
    }
}

/// Runs a single census with the given options.
pub fn run_census(options: CensusOptions) -> Result<Snapshot, CensusError> {
    Census::new(options).run()
}

/// Identity-only census of `proc_root`, enough to build the process tree.
pub fn identity_census(proc_root: &Path) -> Result<Snapshot, CensusError> {
    run_census(CensusOptions {
        proc_root: proc_root.to_path_buf(),
        ..Default::default()
    })
}
