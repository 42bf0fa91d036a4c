//! Cycle bookkeeping for the per-root breadth-first traversals.
//!
//! # Detection rule
//!
//! A cycle is reported only when the traversal rooted at `root` reaches an
//! edge `u → root`. The cycle is the predecessor path from `u` back to
//! `root`. Back-edges to any other visited vertex are ignored; every vertex
//! serves as a root once, so each cycle through its own members is still
//! found by some traversal.
//!
//! Cycles are identified by their member set. The same loop discovered from
//! a different root, or along a different walk order, is recorded once.

#![allow(clippy::module_name_repetitions)]

use std::collections::BTreeSet;

use serde::Serialize;

/// A directed preference loop, identified by its member set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Cycle {
    /// Member item indices in ascending order.
    pub members: Vec<usize>,
}

impl Cycle {
    /// Number of items in the loop.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the cycle has no members (never true for a discovered cycle).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether `index` participates in this loop.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.members.binary_search(&index).is_ok()
    }
}

/// Deduplicating collector shared by all traversals of one analysis run.
#[derive(Debug, Default)]
pub struct CycleSet {
    seen: BTreeSet<Vec<usize>>,
}

impl CycleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the loop closed by the edge `current → root`.
    ///
    /// `predecessor[v]` is the BFS parent of `v` in the traversal rooted at
    /// `root`. Returns `true` if this member set had not been seen before.
    pub fn record_closing_edge(
        &mut self,
        predecessor: &[Option<usize>],
        current: usize,
        root: usize,
    ) -> bool {
        let path = walk_to_root(predecessor, current, root);
        let members: BTreeSet<usize> = path.into_iter().collect();
        self.seen.insert(members.into_iter().collect())
    }

    /// Number of distinct cycles recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Distinct cycles, shortest first; equal lengths ordered by members.
    #[must_use]
    pub fn into_sorted(self) -> Vec<Cycle> {
        let mut cycles: Vec<Cycle> = self
            .seen
            .into_iter()
            .map(|members| Cycle { members })
            .collect();
        cycles.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.members.cmp(&b.members)));
        cycles
    }
}

/// Follow predecessor links from `current` until `root`.
///
/// The returned path starts at `current` and ends at `root`. A broken chain
/// (which a well-formed BFS never produces) ends the walk early.
fn walk_to_root(predecessor: &[Option<usize>], current: usize, root: usize) -> Vec<usize> {
    let mut path = vec![current];
    let mut cursor = current;

    while cursor != root {
        match predecessor.get(cursor).copied().flatten() {
            Some(parent) => {
                path.push(parent);
                cursor = parent;
            }
            None => break,
        }
    }

    path
}
