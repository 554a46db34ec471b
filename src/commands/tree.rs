//! Tree command implementation.
//!
//! Prints the process tree as indented branch lines followed by the
//! processes unreachable from the root.

use herakles_process_census::config::Config;
use herakles_process_census::process::FacetSet;
use herakles_process_census::tree::{traverse, ProcessGraph, Traversal};
use herakles_process_census::Census;

fn label(graph: &ProcessGraph<'_>, pid: u32, show_state: bool) -> String {
    match graph.lookup(pid) {
        Some(rec) if show_state => format!(
            "{} {} [{} {}]",
            pid, rec.short_name, rec.state_code, rec.state
        ),
        Some(rec) => format!("{} {}", pid, rec.short_name),
        None => pid.to_string(),
    }
}

/// Renders a traversal as `├─` / `└─` branch lines.
pub fn render_tree(graph: &ProcessGraph<'_>, traversal: &Traversal, show_state: bool) -> Vec<String> {
    let mut lines = Vec::with_capacity(traversal.nodes.len());
    // is_last flags of the ancestors between the root and the current node
    let mut lasts: Vec<bool> = Vec::new();

    for node in &traversal.nodes {
        if node.depth == 0 {
            lasts.clear();
            lines.push(label(graph, node.pid, show_state));
            continue;
        }

        lasts.truncate(node.depth - 1);
        let mut line = String::new();
        for last in &lasts {
            line.push_str(if *last { "   " } else { "│  " });
        }
        line.push_str(if node.is_last { "└─ " } else { "├─ " });
        line.push_str(&label(graph, node.pid, show_state));
        lines.push(line);
        lasts.push(node.is_last);
    }

    lines
}

/// Renders the orphan section, or nothing when there are no orphans.
pub fn render_orphans(graph: &ProcessGraph<'_>, traversal: &Traversal) -> Vec<String> {
    if traversal.orphans.is_empty() {
        return Vec::new();
    }

    let mut lines = vec![format!("Orphans ({}):", traversal.orphans.len())];
    for pid in &traversal.orphans {
        let line = match graph.parent_of(*pid) {
            Some(parent) => format!("  {} (parent {})", label(graph, *pid, false), parent),
            None => format!("  {} (no parent)", label(graph, *pid, false)),
        };
        lines.push(line);
    }
    lines
}

/// Runs an identity census and prints its tree.
pub fn command_tree(
    config: &Config,
    no_orphans: bool,
    show_state: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // identity is all the tree needs
    let mut options = config.census_options()?;
    options.facets = FacetSet::empty();
    let snapshot = Census::new(options).run()?;
    let graph = ProcessGraph::build(&snapshot);
    let opts = config.traversal_options();
    let traversal = traverse(&graph, opts);

    if traversal.nodes.is_empty() {
        println!("Root pid {} not found ({} processes scanned)", opts.root, snapshot.len());
    }
    for line in render_tree(&graph, &traversal, show_state) {
        println!("{}", line);
    }

    if !no_orphans {
        let orphans = render_orphans(&graph, &traversal);
        if !orphans.is_empty() {
            println!();
            for line in orphans {
                println!("{}", line);
            }
        }
    }

    Ok(())
}
