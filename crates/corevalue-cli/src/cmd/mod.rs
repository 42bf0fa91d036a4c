pub mod completions;
pub mod export;
pub mod rank;
pub mod report;
pub mod sessions;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use corevalue_core::config::{Config, ModeName};
use corevalue_core::session::SessionError;
use corevalue_core::values::{self, ValueSetError};
use corevalue_core::{ErrorCode, GraphError, RankingMode, ValueSet};
use tracing::debug;

/// Ranking strategy as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Rank by direct wins.
    Degree,
    /// Rank by decayed reachability and report preference cycles.
    Transitive,
}

impl From<ModeArg> for ModeName {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Degree => Self::Degree,
            ModeArg::Transitive => Self::Transitive,
        }
    }
}

/// Ranking flags shared by `cv rank` and `cv report`.
#[derive(Args, Debug, Default, Clone)]
pub struct RankingArgs {
    /// Ranking strategy (default from config, else `degree`).
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Per-hop decay for transitive ranking, in (0, 1].
    #[arg(long)]
    pub alpha: Option<f64>,
}

impl RankingArgs {
    /// Merge the flags over the configured ranking strategy.
    ///
    /// # Errors
    ///
    /// Returns an error if the effective alpha lies outside `(0, 1]`.
    pub fn resolve(&self, config: &Config) -> Result<RankingMode> {
        config
            .ranking
            .resolve(self.mode.map(ModeName::from), self.alpha)
    }
}

/// Labels for a graph of `len` items.
///
/// An explicit values file must match `len`. Without one, the only value set
/// in `workdir` is used when its size matches; otherwise items are labelled
/// `#0`, `#1`, ….
///
/// # Errors
///
/// Returns an error if the explicit file cannot be loaded or has the wrong
/// number of values.
pub fn labels_for(len: usize, explicit: Option<&Path>, workdir: &Path) -> Result<ValueSet> {
    if let Some(path) = explicit {
        let set = ValueSet::load(path)?;
        if set.len() != len {
            return Err(GraphError::InvalidSize {
                expected: set.len(),
                actual: len,
            })
            .with_context(|| format!("{} does not match the session", path.display()));
        }
        return Ok(set);
    }

    if let [only] = values::discover(workdir)?.as_slice() {
        match ValueSet::load(only) {
            Ok(set) if set.len() == len => return Ok(set),
            Ok(set) => debug!(
                path = %only.display(),
                values = set.len(),
                items = len,
                "value set size differs from session"
            ),
            Err(err) => debug!(error = %err, "ignoring unreadable value set"),
        }
    }

    Ok(ValueSet::from_names((0..len).map(|i| format!("#{i}"))))
}

/// Resolve a user-supplied path against the working directory.
pub fn absolute(workdir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workdir.join(path)
    }
}

/// Stable error code for the first typed error in the chain, if any.
pub fn error_code(err: &anyhow::Error) -> Option<ErrorCode> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<GraphError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<SessionError>() {
            Some(e.code())
        } else {
            cause.downcast_ref::<ValueSetError>().map(ValueSetError::code)
        }
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn labels_fall_back_to_indices() {
        let dir = TempDir::new().expect("tempdir");
        let labels = labels_for(3, None, dir.path()).expect("labels");
        assert_eq!(labels.names(), ["#0", "#1", "#2"]);
    }

    #[test]
    fn labels_use_single_matching_value_set() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(
            dir.path().join("core.values"),
            r#"{"Calm": {"descr": "at ease"}, "Grit": {"descr": ""}}"#,
        )
        .expect("write");

        let labels = labels_for(2, None, dir.path()).expect("labels");
        assert_eq!(labels.names(), ["Calm", "Grit"]);

        let mismatched = labels_for(3, None, dir.path()).expect("labels");
        assert_eq!(mismatched.name(0), Some("#0"));
    }

    #[test]
    fn explicit_labels_must_match() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("core.values");
        fs::write(&path, r#"{"Calm": {}}"#).expect("write");

        let err = labels_for(2, Some(&path), dir.path()).expect_err("size mismatch");
        assert_eq!(error_code(&err), Some(ErrorCode::InvalidSize));
    }

    #[test]
    fn ranking_flags_override_config() {
        let config = Config::default();
        let args = RankingArgs {
            mode: Some(ModeArg::Transitive),
            alpha: Some(0.25),
        };
        assert_eq!(
            args.resolve(&config).expect("resolve"),
            RankingMode::Transitive { alpha: 0.25 }
        );
        assert_eq!(
            RankingArgs::default().resolve(&config).expect("resolve"),
            RankingMode::Degree
        );

        let bad = RankingArgs {
            mode: Some(ModeArg::Transitive),
            alpha: Some(1.5),
        };
        assert!(bad.resolve(&config).is_err());
    }

    #[test]
    fn relative_paths_join_workdir() {
        let workdir = Path::new("/tmp/work");
        assert_eq!(
            absolute(workdir, Path::new("a.values")),
            PathBuf::from("/tmp/work/a.values")
        );
        assert_eq!(absolute(workdir, Path::new("/x")), PathBuf::from("/x"));
    }
}
