//! Herakles Process Census Library
//!
//! Point-in-time introspection of the Linux process table. A census lists
//! the pid directories under `/proc`, extracts identity plus a requested set
//! of facets for each process in parallel, and returns a pid-sorted
//! [`Snapshot`]. The snapshot can then be turned into a parent/child
//! [`ProcessGraph`] and traversed from a root with orphan detection.
//!
//! # Usage
//!
//! ```rust,no_run
//! use herakles_process_census::{
//!     run_census, traverse, CensusOptions, Facet, FacetSet, ProcessGraph, TraversalOptions,
//! };
//!
//! let options = CensusOptions {
//!     facets: FacetSet::empty().with(Facet::Cpu).with(Facet::Memory),
//!     ..Default::default()
//! };
//! let snapshot = run_census(options)?;
//!
//! let graph = ProcessGraph::build(&snapshot);
//! let traversal = traverse(&graph, TraversalOptions::default());
//! for node in &traversal.nodes {
//!     println!("{}{}", "  ".repeat(node.depth), node.pid);
//! }
//! println!("orphans: {:?}", traversal.orphans);
//! # Ok::<(), herakles_process_census::CensusError>(())
//! ```

pub mod census;
pub mod cli;
pub mod config;
pub mod error;
pub mod process;
pub mod record;
pub mod system;
pub mod tree;

// Re-export main types for convenience
pub use census::{identity_census, run_census, CancelHandle, Census, CensusOptions};
pub use error::{CensusError, FacetError};
pub use process::{Facet, FacetSet, Pid};
pub use record::{CensusStats, ProcessRecord, Snapshot};
pub use tree::{traverse, ProcessGraph, Traversal, TraversalOptions, TreeNode};
