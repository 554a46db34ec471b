//! Scan command implementation.
//!
//! Runs one census and prints the snapshot, optionally with the derived
//! process tree.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use herakles_process_census::cli::OutputFormat;
use herakles_process_census::config::Config;
use herakles_process_census::process::Pid;
use herakles_process_census::record::Snapshot;
use herakles_process_census::tree::{traverse, ProcessGraph, Traversal, TraversalOptions};
use herakles_process_census::Census;

/// Snapshot plus its derived graph and traversal.
#[derive(Serialize)]
struct ScanReport<'a> {
    snapshot: &'a Snapshot,
    children: &'a BTreeMap<Pid, Vec<Pid>>,
    traversal: Traversal,
}

/// Serializes a snapshot, with the tree when `tree` is given.
pub fn render_scan(
    snapshot: &Snapshot,
    format: OutputFormat,
    tree: Option<TraversalOptions>,
) -> Result<String, Box<dyn std::error::Error>> {
    let out = match tree {
        Some(opts) => {
            let graph = ProcessGraph::build(snapshot);
            let report = ScanReport {
                snapshot,
                children: graph.children(),
                traversal: traverse(&graph, opts),
            };
            match format {
                OutputFormat::Json => serde_json::to_string_pretty(&report)?,
                OutputFormat::Yaml => serde_yaml::to_string(&report)?,
            }
        }
        None => match format {
            OutputFormat::Json => serde_json::to_string_pretty(snapshot)?,
            OutputFormat::Yaml => serde_yaml::to_string(snapshot)?,
        },
    };
    Ok(out)
}

/// Runs a census and writes it to stdout or `output`.
pub fn command_scan(
    config: &Config,
    format: OutputFormat,
    output: Option<PathBuf>,
    with_tree: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let census = Census::new(config.census_options()?);
    let snapshot = census.run()?;

    let tree = with_tree.then(|| config.traversal_options());
    let content = render_scan(&snapshot, format, tree)?;

    match output {
        Some(path) if path.to_string_lossy() != "-" => {
            fs::write(&path, content)?;
            info!(
                "Wrote {} records to {}",
                snapshot.len(),
                path.display()
            );
        }
        _ => println!("{}", content),
    }

    Ok(())
}
