use std::fmt;

/// Machine-readable error codes surfaced by the CLI in JSON mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    ValueSetUnreadable,
    ValueSetEmpty,
    InvalidSize,
    MalformedGraph,
    InvalidIndex,
    SelfEdge,
    CountOverflow,
    SessionReadFailed,
    SessionWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::ValueSetUnreadable => "E1101",
            Self::ValueSetEmpty => "E1102",
            Self::InvalidSize => "E2001",
            Self::MalformedGraph => "E2002",
            Self::InvalidIndex => "E2003",
            Self::SelfEdge => "E2004",
            Self::CountOverflow => "E2005",
            Self::SessionReadFailed => "E3001",
            Self::SessionWriteFailed => "E3002",
            Self::LockContention => "E3003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::ValueSetUnreadable => "Value set could not be read",
            Self::ValueSetEmpty => "Value set has no values",
            Self::InvalidSize => "Item count does not match",
            Self::MalformedGraph => "Malformed preference graph",
            Self::InvalidIndex => "Item index out of range",
            Self::SelfEdge => "Item compared against itself",
            Self::CountOverflow => "Preference count overflow",
            Self::SessionReadFailed => "Session file could not be read",
            Self::SessionWriteFailed => "Session file could not be written",
            Self::LockContention => "Session file is locked",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to the user.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in corevalue.toml and retry."),
            Self::ValueSetUnreadable => {
                Some("Value sets are JSON objects mapping names to {\"descr\": \"...\"}.")
            }
            Self::ValueSetEmpty => Some("Add at least two values to the value set."),
            Self::InvalidSize => {
                Some("Load the session together with the value set it was recorded for.")
            }
            Self::MalformedGraph => Some("Start a new session; the stored matrix is corrupt."),
            Self::InvalidIndex | Self::SelfEdge => None,
            Self::CountOverflow => Some("The stored count is at its maximum; start a new session."),
            Self::SessionReadFailed => Some("Check the session path and file permissions."),
            Self::SessionWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Another `cv` process is saving this session; retry."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised by [`crate::graph::PreferenceGraph`] construction and mutation.
///
/// A failed operation never leaves a partially updated graph behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The matrix dimension does not match the number of items it is used with.
    #[error("expected {expected} items, matrix has {actual}")]
    InvalidSize { expected: usize, actual: usize },

    /// A persisted adjacency matrix is not a square grid of non-negative integers.
    #[error("malformed adjacency matrix: {reason}")]
    MalformedGraph { reason: String },

    /// An edge endpoint lies outside `0..len`.
    #[error("item index {index} out of range for {len} items")]
    InvalidIndex { index: usize, len: usize },

    /// Both edge endpoints are the same item.
    #[error("item {index} cannot be preferred over itself")]
    SelfEdge { index: usize },

    /// The stored count for this pair cannot grow any further.
    #[error("preference count for {winner} over {loser} is at its maximum")]
    CountOverflow { winner: usize, loser: usize },
}

impl GraphError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedGraph {
            reason: reason.into(),
        }
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidSize { .. } => ErrorCode::InvalidSize,
            Self::MalformedGraph { .. } => ErrorCode::MalformedGraph,
            Self::InvalidIndex { .. } => ErrorCode::InvalidIndex,
            Self::SelfEdge { .. } => ErrorCode::SelfEdge,
            Self::CountOverflow { .. } => ErrorCode::CountOverflow,
        }
    }
}
