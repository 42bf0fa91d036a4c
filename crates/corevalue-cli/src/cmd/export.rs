//! `cv export` — dump a session's preference graph as Graphviz DOT.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use corevalue_core::{dot, session};

use super::{absolute, labels_for};

/// Arguments for `cv export`.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Session file to export.
    #[arg(long)]
    pub session: PathBuf,

    /// Value set naming the session's items.
    #[arg(long)]
    pub values: Option<PathBuf>,
}

/// Execute `cv export`, writing DOT to stdout.
///
/// # Errors
///
/// Returns an error if the session or value set cannot be loaded, or stdout
/// cannot be written.
pub fn run_export(args: &ExportArgs, workdir: &Path) -> Result<()> {
    let loaded = session::load(&absolute(workdir, &args.session), None)?;
    let values = args.values.as_deref().map(|v| absolute(workdir, v));
    let labels = labels_for(loaded.graph.len(), values.as_deref(), workdir)?;

    let rendered = dot::render_dot(&loaded.graph, labels.names())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    out.write_all(rendered.as_bytes())?;
    out.flush()?;
    Ok(())
}
