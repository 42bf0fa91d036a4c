//! Session persistence for preference graphs.
//!
//! # Format
//!
//! A session file is pretty-printed JSON:
//!
//! ```json
//! {
//!   "graph": [[0, 2], [1, 0]],
//!   "timestamp": "20240102-130405"
//! }
//! ```
//!
//! Only `graph` is needed to restore a session; degrees and scores are
//! always recomputed from it. The timestamp is supplied by the caller.
//!
//! # Discovery
//!
//! Sessions live next to the value sets as hidden `.*.session` files.
//! New sessions are named after the minute they were started.
//!
//! # Writes
//!
//! [`save`] writes a sibling temp file and renames it over the target while
//! holding an exclusive `fs2` lock on `<session>.lock`, so a reader never
//! sees a half-written file and two `cv` processes cannot interleave saves.
//! The lock file is left in place; unlinking it would let a waiter and a
//! newcomer lock different inodes at the same time.

#![allow(clippy::module_name_repetitions)]

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::{ErrorCode, GraphError};
use crate::graph::PreferenceGraph;

/// Suffix shared by all session files.
pub const SESSION_SUFFIX: &str = ".session";

/// `strftime` pattern for the stored timestamp field.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// `strftime` pattern for new session file names.
pub const FILE_STEM_FORMAT: &str = "%Y-%m-%d-%H:%M";

/// Errors raised while reading or writing a session file.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to read session {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse session {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("session {path} holds an unusable graph: {source}")]
    Graph {
        path: PathBuf,
        #[source]
        source: GraphError,
    },

    #[error("failed to write session {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session {path} is locked by another process")]
    Locked { path: PathBuf },
}

impl SessionError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } | Self::Parse { .. } => ErrorCode::SessionReadFailed,
            Self::Graph { source, .. } => source.code(),
            Self::Write { .. } => ErrorCode::SessionWriteFailed,
            Self::Locked { .. } => ErrorCode::LockContention,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionRecord {
    graph: Value,
    #[serde(default)]
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct SessionSnapshot<'a> {
    graph: &'a [Vec<u32>],
    timestamp: &'a str,
}

/// A session restored from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSession {
    pub graph: PreferenceGraph,
    /// Timestamp of the last save (empty if the file had none).
    pub timestamp: String,
}

/// Summary line for session listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub path: PathBuf,
    pub timestamp: String,
    pub items: usize,
    pub comparisons: u64,
}

/// Load a session file, optionally checking it against the item count.
///
/// # Errors
///
/// - [`SessionError::Read`] / [`SessionError::Parse`] for unreadable files.
/// - [`SessionError::Graph`] wrapping [`GraphError::MalformedGraph`] for a
///   corrupt matrix, or [`GraphError::InvalidSize`] when `expected_len` is
///   given and does not match.
#[instrument]
pub fn load(path: &Path, expected_len: Option<usize>) -> Result<LoadedSession, SessionError> {
    let content = fs::read_to_string(path).map_err(|source| SessionError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let record: SessionRecord =
        serde_json::from_str(&content).map_err(|source| SessionError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let graph_error = |source| SessionError::Graph {
        path: path.to_path_buf(),
        source,
    };
    let graph = PreferenceGraph::from_json(&record.graph).map_err(graph_error)?;
    if let Some(expected) = expected_len {
        graph.ensure_len(expected).map_err(graph_error)?;
    }

    info!(
        items = graph.len(),
        comparisons = graph.total_comparisons(),
        "loaded session"
    );
    Ok(LoadedSession {
        graph,
        timestamp: record.timestamp,
    })
}

/// Persist `graph` to `path` with the given timestamp.
///
/// # Errors
///
/// Returns [`SessionError::Locked`] if another process holds the session
/// lock, or [`SessionError::Write`] on any I/O failure.
#[instrument(skip(graph), fields(items = graph.len()))]
pub fn save(path: &Path, graph: &PreferenceGraph, timestamp: &str) -> Result<(), SessionError> {
    let write_error = |source| SessionError::Write {
        path: path.to_path_buf(),
        source,
    };

    let lock_path = sibling(path, ".lock");
    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(write_error)?;
    if lock.try_lock_exclusive().is_err() {
        return Err(SessionError::Locked {
            path: path.to_path_buf(),
        });
    }

    let adjacency = graph.adjacency();
    let snapshot = SessionSnapshot {
        graph: &adjacency,
        timestamp,
    };
    let result = write_atomically(path, &snapshot);

    if let Err(err) = fs2::FileExt::unlock(&lock) {
        warn!(error = %err, "failed to release session lock");
    }
    drop(lock);

    result.map_err(write_error)?;
    info!(path = %path.display(), comparisons = graph.total_comparisons(), "saved session");
    Ok(())
}

fn write_atomically(path: &Path, snapshot: &SessionSnapshot<'_>) -> std::io::Result<()> {
    let tmp_path = sibling(path, ".tmp");
    let mut json = serde_json::to_string_pretty(snapshot)?;
    json.push('\n');

    let mut file = File::create(&tmp_path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Read the header data of a session for listings.
///
/// # Errors
///
/// Same as [`load`].
pub fn summarize(path: &Path) -> Result<SessionSummary, SessionError> {
    let loaded = load(path, None)?;
    Ok(SessionSummary {
        path: path.to_path_buf(),
        timestamp: loaded.timestamp,
        items: loaded.graph.len(),
        comparisons: loaded.graph.total_comparisons(),
    })
}

/// List hidden `.*.session` files directly inside `dir`, sorted by path.
///
/// # Errors
///
/// Returns an error if `dir` cannot be read.
pub fn discover(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut found: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_session_file(path))
        .collect();
    found.sort();
    Ok(found)
}

fn is_session_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            name.len() > 1 + SESSION_SUFFIX.len()
                && name.starts_with('.')
                && name.ends_with(SESSION_SUFFIX)
        })
}

/// Format the stored timestamp for `now`.
#[must_use]
pub fn timestamp<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Pick a path for a new session started at `now`.
///
/// Uses `.<YYYY-MM-DD-HH:MM>.session`, adding `-2`, `-3`, … when a session
/// from the same minute already exists.
#[must_use]
pub fn new_session_path<Tz: TimeZone>(dir: &Path, now: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    let stem = now.format(FILE_STEM_FORMAT).to_string();
    let mut candidate = dir.join(format!(".{stem}{SESSION_SUFFIX}"));
    let mut counter = 2_u32;
    while candidate.exists() {
        candidate = dir.join(format!(".{stem}-{counter}{SESSION_SUFFIX}"));
        counter += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;

    use super::*;

    fn sample_graph() -> PreferenceGraph {
        let mut graph = PreferenceGraph::new(3);
        graph.add_edge(0, 1).expect("edge");
        graph.add_edge(0, 2).expect("edge");
        graph.add_edge(2, 1).expect("edge");
        graph
    }

    #[test]
    fn save_then_load_restores_graph() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(".s.session");
        let graph = sample_graph();

        save(&path, &graph, "20240102-030405").expect("save");
        let loaded = load(&path, Some(3)).expect("load");

        assert_eq!(loaded.graph, graph);
        assert_eq!(loaded.timestamp, "20240102-030405");
        assert!(!sibling(&path, ".tmp").exists(), "temp file renamed");
    }

    #[test]
    fn lock_file_persists_and_is_reusable() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(".s.session");

        save(&path, &sample_graph(), "first").expect("first save");
        let lock_path = sibling(&path, ".lock");
        assert!(lock_path.exists(), "lock file kept between saves");

        save(&path, &sample_graph(), "second").expect("lock released after save");
        let held = File::open(&lock_path).expect("open lock");
        held.try_lock_exclusive().expect("nobody holds the lock");
        assert_eq!(load(&path, None).expect("load").timestamp, "second");
        assert!(!sibling(&path, ".tmp").exists(), "temp file renamed");
    }

    #[test]
    fn saved_file_has_expected_shape() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(".s.session");
        save(&path, &sample_graph(), "ts").expect("save");

        let raw: Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(raw["graph"], serde_json::json!([[0, 1, 1], [0, 0, 0], [0, 1, 0]]));
        assert_eq!(raw["timestamp"], "ts");
    }

    #[test]
    fn load_ignores_stored_degrees_and_extra_fields() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(".s.session");
        fs::write(
            &path,
            r#"{"graph": [[0, 3], [1, 0]], "outdegs": [99, 99], "timestamp": "t"}"#,
        )
        .expect("write");

        let loaded = load(&path, None).expect("load");
        assert_eq!(loaded.graph.out_degrees(), &[3, 1]);
    }

    #[test]
    fn load_rejects_size_mismatch() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(".s.session");
        save(&path, &sample_graph(), "ts").expect("save");

        let err = load(&path, Some(5)).expect_err("mismatch");
        assert_eq!(err.code(), ErrorCode::InvalidSize);
    }

    #[test]
    fn load_rejects_malformed_matrix() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(".s.session");
        fs::write(&path, r#"{"graph": [[0, -2], [0, 0]], "timestamp": "t"}"#).expect("write");

        let err = load(&path, None).expect_err("negative entry");
        assert_eq!(err.code(), ErrorCode::MalformedGraph);
    }

    #[test]
    fn load_rejects_missing_graph_field() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(".s.session");
        fs::write(&path, r#"{"timestamp": "t"}"#).expect("write");

        assert!(matches!(load(&path, None), Err(SessionError::Parse { .. })));
    }

    #[test]
    fn save_fails_while_locked() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(".s.session");
        let lock = File::create(sibling(&path, ".lock")).expect("lock file");
        lock.try_lock_exclusive().expect("take lock");

        let err = save(&path, &sample_graph(), "ts").expect_err("locked");
        assert_eq!(err.code(), ErrorCode::LockContention);
        assert!(!path.exists());
    }

    #[test]
    fn discover_lists_hidden_session_files() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join(".b.session"), "{}").expect("write");
        fs::write(dir.path().join(".a.session"), "{}").expect("write");
        fs::write(dir.path().join("visible.session"), "{}").expect("write");
        fs::write(dir.path().join(".a.session.lock"), "").expect("write");

        let found = discover(dir.path()).expect("discover");
        let names: Vec<String> = found
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, vec![".a.session", ".b.session"]);
    }

    #[test]
    fn new_session_path_avoids_collisions() {
        let dir = TempDir::new().expect("tempdir");
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 59).single().expect("valid date");

        let first = new_session_path(dir.path(), &now);
        assert_eq!(
            first.file_name().and_then(|n| n.to_str()),
            Some(".2024-03-09-14:05.session")
        );
        fs::write(&first, "{}").expect("write");

        let second = new_session_path(dir.path(), &now);
        assert_eq!(
            second.file_name().and_then(|n| n.to_str()),
            Some(".2024-03-09-14:05-2.session")
        );
        assert_eq!(timestamp(&now), "20240309-140559");
    }

    #[test]
    fn summarize_reports_counts() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(".s.session");
        save(&path, &sample_graph(), "ts").expect("save");

        let summary = summarize(&path).expect("summary");
        assert_eq!(summary.items, 3);
        assert_eq!(summary.comparisons, 3);
        assert_eq!(summary.timestamp, "ts");
    }
}
