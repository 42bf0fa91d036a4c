//! `cv report` — rank a stored session without asking anything.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use corevalue_core::config::Config;
use corevalue_core::report::ReportEntry;
use corevalue_core::{RankingMode, Report, session};

use super::{RankingArgs, absolute, labels_for};
use crate::output::{OutputMode, pretty_section, render_mode};

/// Arguments for `cv report`.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Session file to rank.
    #[arg(long)]
    pub session: PathBuf,

    /// Value set naming the session's items.
    #[arg(long)]
    pub values: Option<PathBuf>,

    #[command(flatten)]
    pub ranking: RankingArgs,
}

/// Execute `cv report`.
///
/// # Errors
///
/// Returns an error if the session or value set cannot be loaded, or the
/// ranking flags are invalid.
pub fn run_report(
    args: &ReportArgs,
    config: &Config,
    output: OutputMode,
    workdir: &Path,
) -> Result<()> {
    let mode = args.ranking.resolve(config)?;
    let path = absolute(workdir, &args.session);
    let loaded = session::load(&path, None)?;
    let values = args.values.as_deref().map(|v| absolute(workdir, v));
    let labels = labels_for(loaded.graph.len(), values.as_deref(), workdir)?;

    let report = Report::build(&loaded.graph, labels.names(), mode)?;
    render_report(output, &report)
}

/// Print a finished report in the requested format.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn render_report(output: OutputMode, report: &Report) -> Result<()> {
    render_mode(output, report, write_text, write_pretty)
}

/// One `rank<TAB>score<TAB>name` row per value, then one
/// `cycle<TAB>length<TAB>members` row per preference cycle.
fn write_text(report: &Report, w: &mut dyn Write) -> io::Result<()> {
    for entry in &report.entries {
        writeln!(
            w,
            "{}\t{}\t{}",
            entry.rank,
            score_text(report.mode, entry),
            entry.name
        )?;
    }
    for cycle in report.cycles.iter().flatten() {
        writeln!(w, "cycle\t{}\t{}", cycle.length, cycle.members.join(", "))?;
    }
    Ok(())
}

fn write_pretty(report: &Report, w: &mut dyn Write) -> io::Result<()> {
    match report.mode {
        RankingMode::Degree => {
            writeln!(w, "Values sorted by number of times they 'outcompeted' others.")?;
        }
        RankingMode::Transitive { alpha } => {
            writeln!(
                w,
                "Values sorted by transitive preference (alpha = {alpha:.2})."
            )?;
        }
    }
    writeln!(
        w,
        "A total of {} comparisons has been done.",
        report.total_comparisons
    )?;
    writeln!(w)?;
    writeln!(w, "----- ---------------")?;

    for entry in &report.entries {
        writeln!(w, "{:>4}: {}", score_text(report.mode, entry), entry.name)?;
    }

    if let Some(cycles) = &report.cycles {
        writeln!(w)?;
        if cycles.is_empty() {
            writeln!(w, "No preference cycles found.")?;
        } else {
            pretty_section(w, &format!("Preference cycles ({})", cycles.len()))?;
            for cycle in cycles {
                writeln!(w, "  ({}) {}", cycle.length, cycle.members.join(", "))?;
            }
        }
    }

    Ok(())
}

fn score_text(mode: RankingMode, entry: &ReportEntry) -> String {
    match mode {
        RankingMode::Degree => entry.wins.to_string(),
        RankingMode::Transitive { .. } => format!("{:.2}", entry.score),
    }
}

#[cfg(test)]
mod tests {
    use corevalue_core::PreferenceGraph;

    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn report(mode: RankingMode, edges: &[(usize, usize)]) -> Report {
        let mut graph = PreferenceGraph::new(4);
        for &(u, v) in edges {
            graph.add_edge(u, v).expect("edge");
        }
        Report::build(&graph, &names(&["Calm", "Grit", "Joy", "Zeal"]), mode).expect("build")
    }

    fn rendered(
        report: &Report,
        write: fn(&Report, &mut dyn Write) -> io::Result<()>,
    ) -> String {
        let mut out = Vec::new();
        write(report, &mut out).expect("write");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn degree_pretty_matches_classic_layout() {
        let report = report(RankingMode::Degree, &[(1, 0), (1, 2), (2, 3)]);
        let text = rendered(&report, write_pretty);
        let expected = "\
Values sorted by number of times they 'outcompeted' others.
A total of 3 comparisons has been done.

----- ---------------
   2: Grit
   1: Joy
   0: Calm
   0: Zeal
";
        assert_eq!(text, expected);
    }

    #[test]
    fn transitive_pretty_lists_cycles() {
        let report = report(
            RankingMode::Transitive { alpha: 0.5 },
            &[(0, 1), (1, 2), (2, 0)],
        );
        let text = rendered(&report, write_pretty);
        assert!(text.starts_with("Values sorted by transitive preference (alpha = 0.50)."));
        assert!(text.contains("1.50: Calm"));
        assert!(text.contains("Preference cycles (1)"));
        assert!(text.contains("  (3) Calm, Grit, Joy\n"));
    }

    #[test]
    fn transitive_pretty_without_cycles() {
        let report = report(RankingMode::Transitive { alpha: 0.5 }, &[(0, 1)]);
        assert!(rendered(&report, write_pretty).contains("No preference cycles found."));
    }

    #[test]
    fn text_rows_are_tab_separated() {
        let report = report(RankingMode::Degree, &[(3, 0)]);
        let text = rendered(&report, write_text);
        let first = text.lines().next().expect("row");
        assert_eq!(first, "1\t1\tZeal");
        assert_eq!(text.lines().count(), 4);
        assert!(!text.contains("cycle"));
    }

    #[test]
    fn text_rows_include_cycles_in_transitive_mode() {
        let report = report(
            RankingMode::Transitive { alpha: 0.5 },
            &[(0, 1), (1, 2), (2, 0), (1, 3), (3, 1)],
        );
        let text = rendered(&report, write_text);
        let cycle_rows: Vec<&str> = text.lines().filter(|l| l.starts_with("cycle\t")).collect();
        assert_eq!(
            cycle_rows,
            vec!["cycle\t2\tGrit, Zeal", "cycle\t3\tCalm, Grit, Joy"]
        );
        assert_eq!(text.lines().count(), 6);
    }
}
