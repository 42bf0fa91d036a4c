//! Value sets: the named items being ranked.
//!
//! A value set file (`*.values`) is a JSON object mapping each value name
//! to an entry with an optional description:
//!
//! ```json
//! {
//!   "Honesty": { "descr": "Being truthful and sincere" },
//!   "Curiosity": {}
//! }
//! ```
//!
//! Key order in the file fixes the item index of each value, so a session
//! recorded against a value set stays meaningful as long as the file keeps
//! its order.

#![allow(clippy::module_name_repetitions)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::error::ErrorCode;

/// File extension of value set files.
pub const VALUES_EXTENSION: &str = "values";

/// Errors raised while loading a value set.
#[derive(Debug, thiserror::Error)]
pub enum ValueSetError {
    #[error("failed to read value set {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse value set {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("value set {path} is not a JSON object of named values")]
    NotAnObject { path: PathBuf },

    #[error("value set {path} contains no values")]
    Empty { path: PathBuf },
}

impl ValueSetError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } | Self::Parse { .. } | Self::NotAnObject { .. } => {
                ErrorCode::ValueSetUnreadable
            }
            Self::Empty { .. } => ErrorCode::ValueSetEmpty,
        }
    }
}

/// An ordered list of named values with optional descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValueSet {
    names: Vec<String>,
    descriptions: Vec<Option<String>>,
}

impl ValueSet {
    /// Build a value set from names without descriptions.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let descriptions = vec![None; names.len()];
        Self {
            names,
            descriptions,
        }
    }

    /// Build a value set from a parsed JSON object, keeping key order.
    ///
    /// Entries that are objects contribute their `descr` string (if any);
    /// a bare string entry is taken as the description itself.
    #[must_use]
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let mut names = Vec::with_capacity(map.len());
        let mut descriptions = Vec::with_capacity(map.len());

        for (name, entry) in map {
            let descr = match entry {
                Value::Object(fields) => fields
                    .get("descr")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                Value::String(text) => Some(text.clone()),
                _ => None,
            };
            names.push(name.clone());
            descriptions.push(descr.filter(|d| !d.is_empty()));
        }

        Self {
            names,
            descriptions,
        }
    }

    /// Load and parse a value set file.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueSetError`] if the file cannot be read, is not a JSON
    /// object, or defines no values.
    #[instrument]
    pub fn load(path: &Path) -> Result<Self, ValueSetError> {
        let content = fs::read_to_string(path).map_err(|source| ValueSetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|source| ValueSetError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let Value::Object(map) = value else {
            return Err(ValueSetError::NotAnObject {
                path: path.to_path_buf(),
            });
        };
        if map.is_empty() {
            return Err(ValueSetError::Empty {
                path: path.to_path_buf(),
            });
        }

        let set = Self::from_map(&map);
        debug!(values = set.len(), "loaded value set");
        Ok(set)
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Value names in item-index order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Name of item `index`, if it exists.
    #[must_use]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Description of item `index`, if it has one.
    #[must_use]
    pub fn description(&self, index: usize) -> Option<&str> {
        self.descriptions.get(index).and_then(Option::as_deref)
    }
}

/// List `*.values` files directly inside `dir`, sorted by path.
///
/// # Errors
///
/// Returns an error if `dir` cannot be read.
pub fn discover(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut found: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == VALUES_EXTENSION)
        })
        .collect();
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn from_map_keeps_file_order_and_descriptions() {
        let value = json!({
            "Zeal": { "descr": "Energy" },
            "Autonomy": {},
            "Balance": "Keeping things even",
        });
        let Value::Object(map) = value else {
            panic!("object literal");
        };

        let set = ValueSet::from_map(&map);
        assert_eq!(set.names(), &["Zeal", "Autonomy", "Balance"]);
        assert_eq!(set.description(0), Some("Energy"));
        assert_eq!(set.description(1), None);
        assert_eq!(set.description(2), Some("Keeping things even"));
        assert_eq!(set.description(9), None);
    }

    #[test]
    fn load_reads_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("core.values");
        fs::write(&path, r#"{"B": {"descr": "bee"}, "A": {"descr": ""}}"#).expect("write");

        let set = ValueSet::load(&path).expect("load");
        assert_eq!(set.names(), &["B", "A"]);
        assert_eq!(set.description(0), Some("bee"));
        assert_eq!(set.description(1), None, "empty descriptions are dropped");
    }

    #[test]
    fn load_rejects_empty_and_non_object() {
        let dir = TempDir::new().expect("tempdir");
        let empty = dir.path().join("empty.values");
        fs::write(&empty, "{}").expect("write");
        assert!(matches!(
            ValueSet::load(&empty),
            Err(ValueSetError::Empty { .. })
        ));

        let list = dir.path().join("list.values");
        fs::write(&list, "[1, 2]").expect("write");
        let err = ValueSet::load(&list).expect_err("array is not a value set");
        assert_eq!(err.code(), ErrorCode::ValueSetUnreadable);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = TempDir::new().expect("tempdir");
        let err = ValueSet::load(&dir.path().join("nope.values")).expect_err("missing");
        assert!(matches!(err, ValueSetError::Io { .. }));
    }

    #[test]
    fn discover_finds_only_values_files() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("b.values"), "{}").expect("write");
        fs::write(dir.path().join("a.values"), "{}").expect("write");
        fs::write(dir.path().join("notes.txt"), "").expect("write");
        fs::write(dir.path().join(".x.session"), "{}").expect("write");

        let found = discover(dir.path()).expect("discover");
        let names: Vec<String> = found
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, vec!["a.values", "b.values"]);
    }
}
