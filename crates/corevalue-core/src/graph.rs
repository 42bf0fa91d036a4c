//! Preference graph: a dense, edge-weighted multigraph over item indices.
//!
//! # Edge Direction
//!
//! An edge `u → v` means "`u` was preferred over `v`". The weight of the
//! edge is the number of times that happened directly. Items are the dense
//! indices `0..n` fixed by the value set; `n` never changes after
//! construction.
//!
//! ## Derived degrees
//!
//! `out_degree[u]` and `in_degree[v]` are maintained incrementally by
//! [`PreferenceGraph::add_edge`] and recomputed from the matrix whenever a
//! graph is restored. A persisted degree array is never trusted.

#![allow(clippy::module_name_repetitions)]

use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::GraphError;

// ---------------------------------------------------------------------------
// PreferenceGraph
// ---------------------------------------------------------------------------

/// Accumulated pairwise preferences between `n` items.
///
/// The adjacency matrix is stored row-major in a single `n * n` buffer.
/// Self-loops never occur: [`add_edge`](Self::add_edge) rejects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceGraph {
    len: usize,
    cells: Vec<u32>,
    out_degree: Vec<u64>,
    in_degree: Vec<u64>,
}

impl PreferenceGraph {
    /// Create an empty graph over `len` items (all counts zero).
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            len,
            cells: vec![0; len * len],
            out_degree: vec![0; len],
            in_degree: vec![0; len],
        }
    }

    /// Rebuild a graph from a square adjacency matrix.
    ///
    /// Degrees are recomputed from the matrix.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MalformedGraph`] if the matrix is not square or
    /// has a non-zero diagonal entry.
    pub fn from_adjacency(rows: &[Vec<u32>]) -> Result<Self, GraphError> {
        let len = rows.len();
        let mut cells = Vec::with_capacity(len * len);

        for (r, row) in rows.iter().enumerate() {
            if row.len() != len {
                return Err(GraphError::malformed(format!(
                    "row {r} has {} entries, expected {len}",
                    row.len()
                )));
            }
            if row[r] != 0 {
                return Err(GraphError::malformed(format!(
                    "self-preference count {} at ({r}, {r})",
                    row[r]
                )));
            }
            cells.extend_from_slice(row);
        }

        Ok(Self::from_cells(len, cells))
    }

    /// Rebuild a graph from the JSON form of a persisted adjacency matrix.
    ///
    /// Accepts a JSON array of `n` arrays of `n` non-negative integers.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MalformedGraph`] naming the first offending row
    /// or cell when the value has the wrong shape, or contains a negative,
    /// fractional, non-numeric or out-of-range entry.
    #[instrument(skip(value))]
    pub fn from_json(value: &Value) -> Result<Self, GraphError> {
        let Value::Array(rows) = value else {
            return Err(GraphError::malformed("graph is not an array of rows"));
        };

        let parsed = rows
            .iter()
            .enumerate()
            .map(|(r, row)| parse_row(r, row))
            .collect::<Result<Vec<_>, _>>()?;

        let graph = Self::from_adjacency(&parsed)?;
        debug!(
            items = graph.len(),
            comparisons = graph.total_comparisons(),
            "restored preference graph"
        );
        Ok(graph)
    }

    fn from_cells(len: usize, cells: Vec<u32>) -> Self {
        let mut out_degree = vec![0_u64; len];
        let mut in_degree = vec![0_u64; len];

        for u in 0..len {
            for v in 0..len {
                let count = u64::from(cells[u * len + v]);
                out_degree[u] += count;
                in_degree[v] += count;
            }
        }

        Self {
            len,
            cells,
            out_degree,
            in_degree,
        }
    }

    /// Record one direct preference of `winner` over `loser`.
    ///
    /// Increments `adjacency[winner][loser]`, `out_degree[winner]` and
    /// `in_degree[loser]` by one.
    ///
    /// # Errors
    ///
    /// - [`GraphError::InvalidIndex`] if either endpoint is `>= len`.
    /// - [`GraphError::SelfEdge`] if `winner == loser`.
    /// - [`GraphError::CountOverflow`] if the pair's count is already
    ///   `u32::MAX` (only reachable from a restored session).
    ///
    /// The graph is left untouched on error.
    pub fn add_edge(&mut self, winner: usize, loser: usize) -> Result<(), GraphError> {
        self.check_index(winner)?;
        self.check_index(loser)?;
        if winner == loser {
            return Err(GraphError::SelfEdge { index: winner });
        }

        let cell = winner * self.len + loser;
        let count = self.cells[cell]
            .checked_add(1)
            .ok_or(GraphError::CountOverflow { winner, loser })?;

        self.cells[cell] = count;
        self.out_degree[winner] += 1;
        self.in_degree[loser] += 1;
        debug!(winner, loser, "recorded preference edge");
        Ok(())
    }

    /// Verify that this graph was built for exactly `expected` items.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidSize`] on mismatch.
    pub const fn ensure_len(&self, expected: usize) -> Result<(), GraphError> {
        if self.len == expected {
            Ok(())
        } else {
            Err(GraphError::InvalidSize {
                expected,
                actual: self.len,
            })
        }
    }

    const fn check_index(&self, index: usize) -> Result<(), GraphError> {
        if index < self.len {
            Ok(())
        } else {
            Err(GraphError::InvalidIndex {
                index,
                len: self.len,
            })
        }
    }

    /// Number of items.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the graph has no items.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Direct preference count of `u` over `v` (0 for out-of-range indices).
    #[must_use]
    pub fn weight(&self, u: usize, v: usize) -> u32 {
        self.row(u).get(v).copied().unwrap_or(0)
    }

    /// Row `u` of the adjacency matrix (empty for an out-of-range index).
    #[must_use]
    pub fn row(&self, u: usize) -> &[u32] {
        if u < self.len {
            &self.cells[u * self.len..(u + 1) * self.len]
        } else {
            &[]
        }
    }

    /// Items `w` with `adjacency[v][w] > 0`, in increasing index order.
    ///
    /// Multiplicity is not reported; traversal only needs presence. Yields
    /// nothing for an out-of-range `v`.
    pub fn neighbours(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.row(v)
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(w, _)| w)
    }

    /// Total number of times each item was preferred, indexed by item.
    #[must_use]
    pub fn out_degrees(&self) -> &[u64] {
        &self.out_degree
    }

    /// Total number of times each item lost, indexed by item.
    #[must_use]
    pub fn in_degrees(&self) -> &[u64] {
        &self.in_degree
    }

    /// Sum of all edge weights (equal to both degree sums).
    #[must_use]
    pub fn total_comparisons(&self) -> u64 {
        self.out_degree.iter().sum()
    }

    /// Copy of the adjacency matrix as nested rows, ready for persistence.
    #[must_use]
    pub fn adjacency(&self) -> Vec<Vec<u32>> {
        (0..self.len).map(|u| self.row(u).to_vec()).collect()
    }
}

fn parse_row(r: usize, row: &Value) -> Result<Vec<u32>, GraphError> {
    let Value::Array(entries) = row else {
        return Err(GraphError::malformed(format!("row {r} is not an array")));
    };

    entries
        .iter()
        .enumerate()
        .map(|(c, entry)| parse_cell(r, c, entry))
        .collect()
}

fn parse_cell(r: usize, c: usize, entry: &Value) -> Result<u32, GraphError> {
    let Value::Number(number) = entry else {
        return Err(GraphError::malformed(format!(
            "entry ({r}, {c}) is not a number: {entry}"
        )));
    };

    if let Some(count) = number.as_u64() {
        return u32::try_from(count)
            .map_err(|_| GraphError::malformed(format!("entry ({r}, {c}) is too large: {count}")));
    }
    if number.as_i64().is_some() {
        return Err(GraphError::malformed(format!(
            "entry ({r}, {c}) is negative: {number}"
        )));
    }
    Err(GraphError::malformed(format!(
        "entry ({r}, {c}) is not an integer: {number}"
    )))
}
