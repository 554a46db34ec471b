//! Start time and uptime derived from raw start ticks.

use serde::{Deserialize, Serialize};

/// Process timing in absolute terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessTimes {
    /// Raw `starttime` from stat, in clock ticks since boot.
    pub start_ticks: u64,
    /// Absolute start time, epoch seconds.
    pub start_time: i64,
    /// Seconds the process has been alive at capture time.
    pub uptime_seconds: u64,
    /// `uptime_seconds` as "Xd Yh Zm Ws".
    pub uptime_human: String,
}

/// Derives absolute start time and uptime.
///
/// `start_time = boot_time + start_ticks / ticks_per_second` (whole seconds)
/// and `uptime = now - start_time`, clamped at zero for processes that
/// appear to start after `now` because of clock skew. Out-of-range inputs
/// saturate instead of overflowing.
pub fn derive_times(start_ticks: u64, boot_time: i64, ticks_per_second: u64, now: i64) -> ProcessTimes {
    let since_boot = i64::try_from(start_ticks / ticks_per_second.max(1)).unwrap_or(i64::MAX);
    let start_time = boot_time.saturating_add(since_boot);
    let uptime_seconds = now.saturating_sub(start_time).max(0) as u64;

    ProcessTimes {
        start_ticks,
        start_time,
        uptime_seconds,
        uptime_human: format_uptime(uptime_seconds),
    }
}

/// Formats seconds as "Xd Yh Zm Ws".
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{}d {}h {}m {}s", days, hours, mins, secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_times() {
        // booted at 1_000_000, started 50s after boot, now 1_000_200
        let t = derive_times(5000, 1_000_000, 100, 1_000_200);
        assert_eq!(t.start_ticks, 5000);
        assert_eq!(t.start_time, 1_000_050);
        assert_eq!(t.uptime_seconds, 150);
        assert_eq!(t.uptime_human, "0d 0h 2m 30s");
    }

    #[test]
    fn test_derive_times_truncates_partial_seconds() {
        let t = derive_times(199, 0, 100, 10);
        assert_eq!(t.start_time, 1);
        assert_eq!(t.uptime_seconds, 9);
    }

    #[test]
    fn test_derive_times_future_start_clamps_to_zero() {
        let t = derive_times(100_000, 1_000_000, 100, 1_000_000);
        assert_eq!(t.uptime_seconds, 0);
        assert_eq!(t.uptime_human, "0d 0h 0m 0s");
    }

    #[test]
    fn test_derive_times_extreme_values_saturate() {
        let t = derive_times(u64::MAX, i64::MAX - 10, 1, i64::MAX);
        assert_eq!(t.start_time, i64::MAX);
        assert_eq!(t.uptime_seconds, 0);

        let t = derive_times(0, i64::MIN, 100, i64::MAX);
        assert_eq!(t.start_time, i64::MIN);
        assert_eq!(t.uptime_seconds, i64::MAX as u64);
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "0d 0h 0m 0s");
        assert_eq!(format_uptime(45), "0d 0h 0m 45s");
        assert_eq!(format_uptime(2 * 86400 + 3 * 3600 + 45 * 60 + 12), "2d 3h 45m 12s");
    }
}
