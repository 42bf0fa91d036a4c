//! Ranking strategies over a [`PreferenceGraph`].
//!
//! # Overview
//!
//! - **Degree** — score is the out-degree: how often the item was picked.
//! - **Transitive** — one breadth-first traversal per root item. Every item
//!   reachable at unweighted distance `d >= 1` adds `alpha^(d - 1)` to the
//!   root's score. The same traversals feed cycle detection
//!   ([`crate::cycles`]), so each root is visited exactly once.
//!
//! Both strategies order items by descending score. Sorting is stable, so
//! equal scores keep the value-set order.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::cycles::{Cycle, CycleSet};
use crate::graph::PreferenceGraph;

/// Default decay applied per extra hop in transitive mode.
pub const DEFAULT_ALPHA: f64 = 0.5;

/// Which ranking strategy to apply.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RankingMode {
    /// Raw out-degree.
    #[default]
    Degree,
    /// Distance-decayed reachability with decay `alpha` in `(0, 1]`.
    Transitive { alpha: f64 },
}

/// One item's position in a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedItem {
    pub index: usize,
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Degree ranking
// ---------------------------------------------------------------------------

/// Per-item degree scores, in item order.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn degree_scores(graph: &PreferenceGraph) -> Vec<f64> {
    graph.out_degrees().iter().map(|&d| d as f64).collect()
}

/// Rank items by out-degree.
#[must_use]
pub fn degree_ranking(graph: &PreferenceGraph) -> Vec<RankedItem> {
    order_by_score(&degree_scores(graph))
}

// ---------------------------------------------------------------------------
// Transitive ranking
// ---------------------------------------------------------------------------

/// Scores and cycles produced by one transitive analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitiveAnalysis {
    /// Per-item transitive score, in item order.
    pub scores: Vec<f64>,
    /// Distinct preference loops, shortest first.
    pub cycles: Vec<Cycle>,
}

impl TransitiveAnalysis {
    /// Run one traversal per root and collect scores and cycles.
    ///
    /// `alpha` must lie in `(0, 1]`; [`crate::config`] validates user input.
    #[must_use]
    #[instrument(skip(graph), fields(items = graph.len()))]
    pub fn compute(graph: &PreferenceGraph, alpha: f64) -> Self {
        debug_assert!(alpha > 0.0 && alpha <= 1.0, "alpha out of range: {alpha}");

        let mut cycles = CycleSet::new();
        let scores: Vec<f64> = (0..graph.len())
            .map(|root| traverse_from(graph, root, alpha, &mut cycles))
            .collect();

        debug!(cycles = cycles.len(), "transitive analysis complete");
        Self {
            scores,
            cycles: cycles.into_sorted(),
        }
    }

    /// Items ordered by descending transitive score.
    #[must_use]
    pub fn ranking(&self) -> Vec<RankedItem> {
        order_by_score(&self.scores)
    }
}

/// Breadth-first traversal from `root`; returns the root's score.
///
/// Each discovered item's contribution is the discovering item's
/// contribution times `alpha`, with direct neighbours of the root at `1.0`.
/// That equals `alpha^(d - 1)` for shortest distance `d`.
fn traverse_from(graph: &PreferenceGraph, root: usize, alpha: f64, cycles: &mut CycleSet) -> f64 {
    let len = graph.len();
    let mut visited = vec![false; len];
    let mut predecessor: Vec<Option<usize>> = vec![None; len];
    let mut contribution = vec![0.0_f64; len];
    let mut queue: VecDeque<usize> = VecDeque::from([root]);
    visited[root] = true;

    while let Some(current) = queue.pop_front() {
        for next in graph.neighbours(current) {
            if !visited[next] {
                visited[next] = true;
                predecessor[next] = Some(current);
                contribution[next] = if current == root {
                    1.0
                } else {
                    contribution[current] * alpha
                };
                queue.push_back(next);
            } else if next == root {
                cycles.record_closing_edge(&predecessor, current, root);
            }
        }
    }

    contribution.iter().sum()
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Rank items by score, highest first, keeping item order among ties.
#[must_use]
pub fn order_by_score(scores: &[f64]) -> Vec<RankedItem> {
    let mut ranked: Vec<RankedItem> = scores
        .iter()
        .enumerate()
        .map(|(index, &score)| RankedItem { index, score })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn graph_with_edges(len: usize, edges: &[(usize, usize)]) -> PreferenceGraph {
        let mut graph = PreferenceGraph::new(len);
        for &(u, v) in edges {
            graph.add_edge(u, v).expect("edge in range");
        }
        graph
    }

    fn indices(ranked: &[RankedItem]) -> Vec<usize> {
        ranked.iter().map(|r| r.index).collect()
    }

    #[test]
    fn degree_ranking_orders_by_wins() {
        let graph = graph_with_edges(3, &[(2, 0), (2, 1), (1, 0)]);
        let ranked = degree_ranking(&graph);
        assert_eq!(indices(&ranked), vec![2, 1, 0]);
        assert!((ranked[0].score - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn degree_ranking_keeps_item_order_on_ties() {
        let graph = graph_with_edges(4, &[(3, 0), (1, 2)]);
        assert_eq!(indices(&degree_ranking(&graph)), vec![1, 3, 0, 2]);
    }

    #[test]
    fn degree_ranking_counts_multiplicity() {
        let graph = graph_with_edges(2, &[(1, 0), (1, 0), (0, 1)]);
        assert_eq!(degree_scores(&graph), vec![1.0, 2.0]);
    }

    #[test]
    fn transitive_chain_scores() {
        // A → B → C
        let graph = graph_with_edges(3, &[(0, 1), (1, 2)]);
        let analysis = TransitiveAnalysis::compute(&graph, 0.5);
        assert_eq!(analysis.scores, vec![1.5, 1.0, 0.0]);
        assert!(analysis.cycles.is_empty());
    }

    #[test]
    fn transitive_ignores_multiplicity() {
        let single = graph_with_edges(3, &[(0, 1), (1, 2)]);
        let repeated = graph_with_edges(3, &[(0, 1), (0, 1), (0, 1), (1, 2)]);
        assert_eq!(
            TransitiveAnalysis::compute(&single, 0.5).scores,
            TransitiveAnalysis::compute(&repeated, 0.5).scores
        );
    }

    #[test]
    fn transitive_uses_shortest_distance() {
        // A → B → C and A → C directly: C counts once at distance 1.
        let graph = graph_with_edges(3, &[(0, 1), (1, 2), (0, 2)]);
        let analysis = TransitiveAnalysis::compute(&graph, 0.5);
        assert!((analysis.scores[0] - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn transitive_alpha_one_counts_reachable_items() {
        let graph = graph_with_edges(4, &[(0, 1), (1, 2), (2, 3)]);
        let analysis = TransitiveAnalysis::compute(&graph, 1.0);
        assert_eq!(analysis.scores, vec![3.0, 2.0, 1.0, 0.0]);
    }

    #[test]
    fn three_cycle_reported_once() {
        let graph = graph_with_edges(3, &[(0, 1), (1, 2), (2, 0)]);
        let analysis = TransitiveAnalysis::compute(&graph, 0.5);
        assert_eq!(analysis.cycles.len(), 1);
        assert_eq!(analysis.cycles[0].members, vec![0, 1, 2]);
        assert_eq!(analysis.cycles[0].len(), 3);
        // Every item reaches the other two: 1 + 0.5.
        assert_eq!(analysis.scores, vec![1.5, 1.5, 1.5]);
    }

    #[test]
    fn nested_cycles_are_distinct() {
        // 0 ⇄ 1 and 0 → 1 → 2 → 0
        let graph = graph_with_edges(3, &[(0, 1), (1, 0), (1, 2), (2, 0)]);
        let analysis = TransitiveAnalysis::compute(&graph, 0.5);
        let members: Vec<Vec<usize>> = analysis.cycles.iter().map(|c| c.members.clone()).collect();
        assert_eq!(members, vec![vec![0, 1], vec![0, 1, 2]]);
    }

    #[test]
    fn empty_graph_has_no_scores() {
        let graph = PreferenceGraph::new(0);
        let analysis = TransitiveAnalysis::compute(&graph, 0.5);
        assert!(analysis.scores.is_empty());
        assert!(analysis.cycles.is_empty());
        assert!(degree_ranking(&graph).is_empty());
    }

    #[test]
    fn analysis_does_not_mutate_graph() {
        let graph = graph_with_edges(3, &[(0, 1), (1, 2), (2, 0)]);
        let before = graph.clone();
        let first = TransitiveAnalysis::compute(&graph, 0.5);
        let second = TransitiveAnalysis::compute(&graph, 0.5);
        assert_eq!(graph, before);
        assert_eq!(first, second);
    }
}
