//! `cv rank` — run an interactive comparison session and print the ranking.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use chrono::Local;
use clap::Args;
use corevalue_core::config::Config;
use corevalue_core::{PreferenceGraph, Report, ValueSet, session, values};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use super::{RankingArgs, absolute};
use crate::cmd::report::render_report;
use crate::output::OutputMode;
use crate::presenter::Presenter;

/// Arguments for `cv rank`.
#[derive(Args, Debug, Default)]
pub struct RankArgs {
    /// Value set to rank (asks when several exist in the directory).
    #[arg(long)]
    pub values: Option<PathBuf>,

    /// Session file to resume; created if it does not exist.
    #[arg(long, conflicts_with = "new")]
    pub session: Option<PathBuf>,

    /// Always start a new session.
    #[arg(long)]
    pub new: bool,

    /// Show names only, without descriptions.
    #[arg(long)]
    pub no_descr: bool,

    /// Number of comparisons to ask for (default: n * n).
    #[arg(long)]
    pub rounds: Option<usize>,

    /// Seed for the comparison order, for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub ranking: RankingArgs,
}

/// Execute `cv rank`.
///
/// Prompts go to stdout, or to stderr when the report is JSON so stdout
/// stays machine-readable.
///
/// # Errors
///
/// Returns an error if no value set can be loaded, the session cannot be
/// saved, or the ranking flags are invalid.
pub fn run_rank(args: &RankArgs, config: &Config, output: OutputMode, workdir: &Path) -> Result<()> {
    let mode = args.ranking.resolve(config)?;

    let stdin = io::stdin();
    let (sink, sink_is_tty): (Box<dyn Write>, bool) = if output.is_json() {
        (Box::new(io::stderr()), io::stderr().is_terminal())
    } else {
        (Box::new(io::stdout()), io::stdout().is_terminal())
    };
    let interactive = stdin.is_terminal() && sink_is_tty;
    let rng = args
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let show_descriptions = !args.no_descr && config.session.show_descriptions;

    let mut presenter = Presenter::new(stdin.lock(), sink, rng)
        .max_retries(config.session.max_retries)
        .clear_screen(interactive)
        .show_descriptions(show_descriptions);

    presenter.say("welcome to the core value finder")?;

    let Some(values_path) = select_values(args.values.as_deref(), &mut presenter, workdir)? else {
        info!("no value set selected");
        return Ok(());
    };
    let values = ValueSet::load(&values_path)?;
    let (path, mut graph) = open_session(args, &mut presenter, workdir, values.len())?;
    // Checkpoint before the first prompt so an interrupt never leaves a
    // started session without a file.
    session::save(&path, &graph, &session::timestamp(&Local::now()))?;

    let rounds = args
        .rounds
        .unwrap_or_else(|| config.session.rounds_for(values.len()));
    let outcome = presenter.run_comparisons(&mut graph, &values, rounds, |graph| {
        session::save(&path, graph, &session::timestamp(&Local::now()))?;
        Ok(())
    })?;
    info!(
        decided = outcome.decided,
        skipped = outcome.skipped,
        end = ?outcome.end,
        "comparisons finished"
    );

    presenter.say(&format!("Saving Session: {}", path.display()))?;
    session::save(&path, &graph, &session::timestamp(&Local::now()))?;

    let report = Report::build(&graph, values.names(), mode)?;
    render_report(output, &report)
}

/// Pick the value set: the explicit one, the only one present, or ask.
fn select_values<R: BufRead, W: Write, G: Rng>(
    explicit: Option<&Path>,
    presenter: &mut Presenter<R, W, G>,
    workdir: &Path,
) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        return Ok(Some(absolute(workdir, path)));
    }

    let found = values::discover(workdir)?;
    match found.as_slice() {
        [] => Err(anyhow!(
            "no *.{} file found in {}",
            values::VALUES_EXTENSION,
            workdir.display()
        )),
        [only] => Ok(Some(only.clone())),
        _ => Ok(presenter.select_value_set(&found)?),
    }
}

/// Resolve the session to continue, falling back to a fresh one.
///
/// A session that cannot be restored (corrupt, or sized for a different
/// value set) is left untouched on disk and a new file is started instead.
fn open_session<R: BufRead, W: Write, G: Rng>(
    args: &RankArgs,
    presenter: &mut Presenter<R, W, G>,
    workdir: &Path,
    len: usize,
) -> Result<(PathBuf, PreferenceGraph)> {
    let chosen = if args.new {
        None
    } else if let Some(path) = &args.session {
        Some(absolute(workdir, path))
    } else {
        let found = session::discover(workdir)?;
        if found.is_empty() {
            None
        } else {
            presenter.select_session(&found)?
        }
    };

    if let Some(path) = chosen {
        if !path.exists() {
            presenter.say(&format!("New Session: {}", path.display()))?;
            return Ok((path, PreferenceGraph::new(len)));
        }
        match session::load(&path, Some(len)) {
            Ok(loaded) => {
                presenter.say(&format!(
                    "Resuming Session: {} ({} comparisons)",
                    path.display(),
                    loaded.graph.total_comparisons()
                ))?;
                return Ok((path, loaded.graph));
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot restore session");
                presenter.say(&format!("Failed loading Session: {err}"))?;
                presenter.say("Fallback to new Session")?;
            }
        }
    }

    let path = session::new_session_path(workdir, &Local::now());
    presenter.say(&format!("New Session: {}", path.display()))?;
    Ok((path, PreferenceGraph::new(len)))
}
