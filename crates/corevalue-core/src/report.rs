//! Final ranking report: a read-only snapshot of one ranking run.

use serde::Serialize;
use tracing::instrument;

use crate::error::GraphError;
use crate::graph::PreferenceGraph;
use crate::ranking::{RankedItem, RankingMode, TransitiveAnalysis, degree_ranking};

/// One ranked value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub index: usize,
    pub name: String,
    pub score: f64,
    /// Direct wins (out-degree).
    pub wins: u64,
    /// Direct losses (in-degree).
    pub losses: u64,
}

/// A preference loop, with member names in item order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportCycle {
    pub length: usize,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    #[serde(flatten)]
    pub mode: RankingMode,
    pub items: usize,
    pub total_comparisons: u64,
    pub entries: Vec<ReportEntry>,
    /// Present only in transitive mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycles: Option<Vec<ReportCycle>>,
}

impl Report {
    /// Rank `graph` with `mode`, labelling items with `names`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidSize`] if `names` does not have one entry
    /// per graph item.
    #[instrument(skip(graph, names))]
    pub fn build(
        graph: &PreferenceGraph,
        names: &[String],
        mode: RankingMode,
    ) -> Result<Self, GraphError> {
        graph.ensure_len(names.len())?;

        let (ranking, cycles) = match mode {
            RankingMode::Degree => (degree_ranking(graph), None),
            RankingMode::Transitive { alpha } => {
                let analysis = TransitiveAnalysis::compute(graph, alpha);
                let cycles = analysis
                    .cycles
                    .iter()
                    .map(|cycle| ReportCycle {
                        length: cycle.len(),
                        members: cycle.members.iter().map(|&i| names[i].clone()).collect(),
                    })
                    .collect();
                (analysis.ranking(), Some(cycles))
            }
        };

        let entries = ranking
            .iter()
            .enumerate()
            .map(|(position, &RankedItem { index, score })| ReportEntry {
                rank: position + 1,
                index,
                name: names[index].clone(),
                score,
                wins: graph.out_degrees()[index],
                losses: graph.in_degrees()[index],
            })
            .collect();

        Ok(Self {
            mode,
            items: graph.len(),
            total_comparisons: graph.total_comparisons(),
            entries,
            cycles,
        })
    }

    /// Entry names from best to worst.
    #[must_use]
    pub fn ordered_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }
}
