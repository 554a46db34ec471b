//! Host-wide values every census depends on.
//!
//! This module provides the clock-tick rate used to interpret raw `stat`
//! time fields, the system boot time derived from `/proc/uptime`, and the
//! kernel's `pid_max` ceiling.

use once_cell::sync::Lazy;
use std::fs;
use std::path::Path;

use crate::error::CensusError;

/// Get system clock ticks per second as reported by the host.
/// Returns the raw `sysconf` value; validation happens in [`validate_clock_ticks`].
fn get_clk_tck() -> i64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_CLK_TCK
        unsafe { libc::sysconf(libc::_SC_CLK_TCK) as i64 }
    }
    #[cfg(not(unix))]
    {
        -1
    }
}

/// Host clock ticks per second (may be invalid, see [`validate_clock_ticks`]).
pub static CLK_TCK: Lazy<i64> = Lazy::new(get_clk_tck);

/// Rejects zero or negative tick rates. Every time-based facet divides by
/// this value, so an invalid rate is fatal for the whole census.
pub fn validate_clock_ticks(ticks: i64) -> Result<u64, CensusError> {
    if ticks <= 0 {
        return Err(CensusError::InvalidClockTicks(ticks));
    }
    Ok(ticks as u64)
}

/// Parses the first field of `/proc/uptime` ("12345.67 54321.00").
pub fn parse_uptime(content: &str) -> Option<f64> {
    let value: f64 = content.split_whitespace().next()?.parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Reads seconds since boot from `<proc_root>/uptime`.
pub fn read_uptime(proc_root: &Path) -> Result<f64, CensusError> {
    let path = proc_root.join("uptime");
    let content = fs::read_to_string(&path).map_err(|e| CensusError::BootTimeUnavailable {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    parse_uptime(&content).ok_or_else(|| CensusError::BootTimeUnavailable {
        path,
        reason: "Invalid uptime format".to_string(),
    })
}

/// Absolute boot time in epoch seconds: `now - uptime`, whole seconds.
/// Saturates at `i64::MIN` instead of overflowing.
pub fn boot_time_from_uptime(now_epoch: i64, uptime_seconds: f64) -> i64 {
    now_epoch.saturating_sub(uptime_seconds as i64)
}

/// Reads the boot time once per census, relative to `now_epoch`.
///
/// An uptime reaching back before the epoch is rejected as a bogus source.
pub fn read_boot_time(proc_root: &Path, now_epoch: i64) -> Result<i64, CensusError> {
    let uptime = read_uptime(proc_root)?;
    let boot_time = boot_time_from_uptime(now_epoch, uptime);
    if boot_time < 0 {
        return Err(CensusError::BootTimeUnavailable {
            path: proc_root.join("uptime"),
            reason: format!("Uptime {:.0}s predates the epoch", uptime),
        });
    }
    Ok(boot_time)
}

/// Reads the kernel's pid ceiling from `<proc_root>/sys/kernel/pid_max`.
pub fn read_pid_max(proc_root: &Path) -> Option<u32> {
    let content = fs::read_to_string(proc_root.join("sys/kernel/pid_max")).ok()?;
    content.trim().parse().ok()
}
