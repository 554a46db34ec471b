//! CLI command implementations for herakles-process-census.
//!
//! This module provides implementations for all CLI subcommands:
//! - `scan`: Census snapshot output
//! - `tree`: Process tree rendering
//! - `check`: System validation
//! - `config`: Configuration file generation

pub mod check;
pub mod config;
pub mod scan;
pub mod tree;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use scan::command_scan;
pub use tree::command_tree;
