//! CLI arguments and subcommands for herakles-process-census.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::process::Pid;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Snapshot output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-process-census",
    about = "Point-in-time census of the Linux process table",
    long_about = "Point-in-time census of the Linux process table.\n\n\
                  Enumerates running processes from /proc, extracts identity plus an optional \
                  set of facets (CPU, memory, credentials, environment, threads, libraries, ...) \
                  and reconstructs the parent/child process tree including orphans.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (overrides config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Process table mount point
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Comma-separated facets to extract (cpu, memory, credentials, cwd,
    /// environment, open_files, threads, libraries, uptime, or all)
    #[arg(short = 'f', long)]
    pub facets: Option<String>,

    /// Root pid of the process tree
    #[arg(long)]
    pub root_pid: Option<Pid>,

    /// Maximum tree depth before a subtree is cut off
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Ignore pids above this value
    #[arg(long)]
    pub max_pid: Option<Pid>,

    /// Worker threads for facet extraction (default: number of CPUs)
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Maximum number of processes to scan
    #[arg(long)]
    pub max_processes: Option<usize>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a census and print the snapshot
    Scan {
        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Write to file instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Also print the parent to children mapping and traversal
        #[arg(long)]
        with_tree: bool,
    },

    /// Print the process tree from the root pid
    Tree {
        /// Omit the orphan list
        #[arg(long)]
        no_orphans: bool,

        /// Show lifecycle state next to each process
        #[arg(long)]
        state: bool,
    },

    /// Validate configuration and process table access
    Check,

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },
}
