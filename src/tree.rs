//! Parent/child graph and orphan-aware traversal over a [`Snapshot`].
//!
//! Both are pure derivations: nothing here performs I/O or mutates the
//! snapshot.

use ahash::AHashSet;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::process::Pid;
use crate::record::{ProcessRecord, Snapshot};

/// Conventional traversal root (init).
pub const DEFAULT_ROOT_PID: Pid = 1;

/// Default depth guard for malformed parent chains.
pub const DEFAULT_MAX_DEPTH: usize = 4096;

/// Parent to children mapping plus pid lookup over a sorted snapshot.
#[derive(Debug)]
pub struct ProcessGraph<'a> {
    snapshot: &'a Snapshot,
    children: BTreeMap<Pid, Vec<Pid>>,
}

impl<'a> ProcessGraph<'a> {
    /// Builds the graph in one pass. Children are appended in snapshot
    /// order, so every child list is ascending. Records whose parent is 0
    /// or themselves attach to no parent.
    pub fn build(snapshot: &'a Snapshot) -> Self {
        let mut children: BTreeMap<Pid, Vec<Pid>> = BTreeMap::new();
        for record in snapshot.iter() {
            if let Some(parent) = record.parent() {
                children.entry(parent).or_default().push(record.pid);
            }
        }
        debug!(
            "Built process graph: {} records, {} parents",
            snapshot.len(),
            children.len()
        );
        Self { snapshot, children }
    }

    pub fn snapshot(&self) -> &'a Snapshot {
        self.snapshot
    }

    /// O(log n) record lookup.
    pub fn lookup(&self, pid: Pid) -> Option<&'a ProcessRecord> {
        self.snapshot.get(pid)
    }

    /// Children of `pid` in ascending order; empty if none.
    pub fn children_of(&self, pid: Pid) -> &[Pid] {
        self.children.get(&pid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parent of `pid` as recorded, even if the parent is not in the snapshot.
    pub fn parent_of(&self, pid: Pid) -> Option<Pid> {
        self.lookup(pid).and_then(ProcessRecord::parent)
    }

    /// The full parent to children mapping. Keys may name pids that are
    /// absent from the snapshot.
    pub fn children(&self) -> &BTreeMap<Pid, Vec<Pid>> {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TraversalOptions {
    pub root: Pid,
    pub max_depth: usize,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT_PID,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// One emitted node of a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub pid: Pid,
    /// `None` for the root.
    pub parent: Option<Pid>,
    /// 0 for the root.
    pub depth: usize,
    /// Whether this node is the last child of its parent. True for the root.
    pub is_last: bool,
}

/// Depth-first order from the root plus the unreachable records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Traversal {
    pub root: Pid,
    pub nodes: Vec<TreeNode>,
    /// Snapshot pids never visited, excluding the root, ascending.
    pub orphans: Vec<Pid>,
}

impl Traversal {
    pub fn visited_pids(&self) -> Vec<Pid> {
        self.nodes.iter().map(|n| n.pid).collect()
    }
}

/// Walks `graph` depth-first from `opts.root` with an explicit stack.
///
/// A pid is emitted at most once. Nodes deeper than `opts.max_depth` are not
/// emitted and end up in the orphan list. If the root is not in the
/// snapshot nothing is emitted and every record is an orphan.
pub fn traverse(graph: &ProcessGraph<'_>, opts: TraversalOptions) -> Traversal {
    let mut nodes = Vec::new();
    let mut visited: AHashSet<Pid> = AHashSet::with_capacity(graph.len());

    if graph.lookup(opts.root).is_some() {
        let mut stack = vec![TreeNode {
            pid: opts.root,
            parent: None,
            depth: 0,
            is_last: true,
        }];
        let mut depth_hits = 0usize;

        while let Some(node) = stack.pop() {
            if node.depth > opts.max_depth {
                depth_hits += 1;
                continue;
            }
            if !visited.insert(node.pid) {
                continue;
            }
            nodes.push(node);

            let kids = graph.children_of(node.pid);
            // a child already visited is the root reached through a cycle
            let pending: Vec<Pid> = kids
                .iter()
                .copied()
                .filter(|child| !visited.contains(child))
                .collect();
            // reversed so the smallest pid is popped first
            for (idx, &child) in pending.iter().enumerate().rev() {
                stack.push(TreeNode {
                    pid: child,
                    parent: Some(node.pid),
                    depth: node.depth + 1,
                    is_last: idx + 1 == pending.len(),
                });
            }
        }

        if depth_hits > 0 {
            warn!(
                "Tree depth limit {} reached, {} subtrees not traversed",
                opts.max_depth, depth_hits
            );
        }
    } else {
        debug!("Traversal root {} not in snapshot", opts.root);
    }

    let orphans = graph
        .snapshot()
        .iter()
        .map(|r| r.pid)
        .filter(|pid| *pid != opts.root && !visited.contains(pid))
        .collect();

    Traversal {
        root: opts.root,
        nodes,
        orphans,
    }
}
