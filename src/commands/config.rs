//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use herakles_process_census::cli::ConfigFormat;
use herakles_process_census::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::with_defaults();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("herakles-process-census.yaml"),
    };

    let mut content = render_config(&config, format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Herakles Process Census Configuration
# =====================================
#
# Data Source
# -----------
# proc_root: "/proc"           # Process table mount point (e.g. /host/proc in a container)
# clock_ticks: null            # Override host ticks per second (null = sysconf)
#
# Scan Scope
# ----------
# facets: []                   # cpu, memory, credentials, cwd, environment,
#                              # open_files, threads, libraries, uptime, or [all]
# max_pid: null                # Ignore pids above this value
# max_processes: null          # Maximum processes to scan
# parallelism: null            # Worker threads (null = number of CPUs)
#
# Tree Traversal
# --------------
# root_pid: 1                  # Root of the rendered tree
# max_depth: 4096              # Subtrees deeper than this are reported as orphans
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}
