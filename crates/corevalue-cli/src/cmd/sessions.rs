//! `cv sessions` — list stored sessions in the working directory.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use corevalue_core::session;
use serde::Serialize;
use tracing::warn;

use crate::output::{OutputMode, pretty_section, render};

/// Arguments for `cv sessions`.
#[derive(Args, Debug, Default)]
pub struct SessionsArgs {}

#[derive(Debug, Serialize)]
struct SessionsOutput {
    sessions: Vec<SessionRow>,
}

#[derive(Debug, Serialize)]
struct SessionRow {
    path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparisons: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Execute `cv sessions`.
///
/// Unreadable session files are listed with their error instead of
/// aborting the listing.
///
/// # Errors
///
/// Returns an error if the working directory cannot be read.
pub fn run_sessions(_args: &SessionsArgs, output: OutputMode, workdir: &Path) -> Result<()> {
    let sessions = session::discover(workdir)?
        .into_iter()
        .map(|path| match session::summarize(&path) {
            Ok(summary) => SessionRow {
                path: file_name(&summary.path),
                timestamp: Some(summary.timestamp),
                items: Some(summary.items),
                comparisons: Some(summary.comparisons),
                error: None,
            },
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable session");
                SessionRow {
                    path: file_name(&path),
                    timestamp: None,
                    items: None,
                    comparisons: None,
                    error: Some(err.to_string()),
                }
            }
        })
        .collect();

    let payload = SessionsOutput { sessions };
    render(output, &payload, |payload, w| match output {
        OutputMode::Pretty => write_pretty(payload, w),
        _ => write_text(payload, w),
    })
}

fn file_name(path: &Path) -> PathBuf {
    path.file_name().map_or_else(|| path.to_path_buf(), PathBuf::from)
}

fn write_text(payload: &SessionsOutput, w: &mut dyn Write) -> io::Result<()> {
    for row in &payload.sessions {
        match &row.error {
            None => writeln!(
                w,
                "{}\t{}\t{}\t{}",
                row.path.display(),
                row.timestamp.as_deref().unwrap_or(""),
                row.items.unwrap_or_default(),
                row.comparisons.unwrap_or_default()
            )?,
            Some(error) => writeln!(w, "{}\terror\t{error}", row.path.display())?,
        }
    }
    Ok(())
}

fn write_pretty(payload: &SessionsOutput, w: &mut dyn Write) -> io::Result<()> {
    if payload.sessions.is_empty() {
        return writeln!(w, "No sessions found.");
    }

    pretty_section(w, &format!("Sessions ({})", payload.sessions.len()))?;
    for row in &payload.sessions {
        match &row.error {
            None => writeln!(
                w,
                "{:<32} {:>5} values {:>6} comparisons  saved {}",
                row.path.display(),
                row.items.unwrap_or_default(),
                row.comparisons.unwrap_or_default(),
                row.timestamp.as_deref().filter(|t| !t.is_empty()).unwrap_or("-")
            )?,
            Some(error) => writeln!(w, "{:<32} unreadable: {error}", row.path.display())?,
        }
    }
    Ok(())
}
