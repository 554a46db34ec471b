//! Check command implementation.
//!
//! Validates process table access, host constants and configuration.

use nix::unistd::geteuid;
use std::fs;
use std::io;

use herakles_process_census::config::{validate_effective_config, Config};
use herakles_process_census::process::{collect_proc_entries, ScanLimits};
use herakles_process_census::system::{read_boot_time, read_pid_max, validate_clock_ticks};

/// Validates system requirements and configuration.
pub fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Herakles Process Census - System Check");
    println!("=========================================");

    let mut all_ok = true;
    let proc_root = config.proc_root();

    println!("\n👤 Checking privileges...");
    if geteuid().is_root() {
        println!("   ✅ Running as root (uid=0)");
    } else {
        println!("   ⚠️  Not running as root - environment, cwd and open-file facets");
        println!("      of other users' processes will be absent");
    }

    println!("\n📁 Checking {} ...", proc_root.display());
    let limits = ScanLimits {
        max_pid: None,
        max_processes: Some(5),
    };
    match collect_proc_entries(&proc_root, limits) {
        Ok(entries) if entries.is_empty() => {
            println!("   ❌ No process entries found");
            all_ok = false;
        }
        Ok(entries) => println!("   ✅ Can read {} process entries", entries.len()),
        Err(e) => {
            println!("   ❌ {}", e);
            all_ok = false;
        }
    }

    // environ of init needs the same privilege as the sensitive facets
    match fs::read(proc_root.join("1").join("environ")) {
        Ok(_) => println!("   ✅ Can read sensitive facets of pid 1"),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            println!("   ⚠️  Cannot read pid 1 environment - only own processes are fully visible");
            println!("      Run as root or grant cap_dac_read_search,cap_sys_ptrace");
        }
        Err(e) => println!("   ⚠️  Could not test pid 1 access: {}", e),
    }

    println!("\n⏱️  Checking host constants...");
    let ticks = config
        .clock_ticks
        .unwrap_or(*herakles_process_census::system::CLK_TCK);
    match validate_clock_ticks(ticks) {
        Ok(t) => println!("   ✅ Clock ticks per second: {}", t),
        Err(e) => {
            println!("   ❌ {}", e);
            all_ok = false;
        }
    }

    let now = chrono::Utc::now().timestamp();
    match read_boot_time(&proc_root, now) {
        Ok(boot) => {
            let boot_str = chrono::DateTime::<chrono::Utc>::from_timestamp(boot, 0)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| boot.to_string());
            println!("   ✅ Boot time: {}", boot_str);
        }
        Err(e) => {
            println!("   ❌ {} (uptime facet unavailable)", e);
            all_ok = false;
        }
    }

    match read_pid_max(&proc_root) {
        Some(max) => println!("   ✅ pid_max: {}", max),
        None => println!("   ⚠️  pid_max not readable"),
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        Err("system check failed".into())
    }
}
