//! Error types for permission resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Why a resolution could not produce effective rights.
///
/// Carried as data inside [`crate::ResolutionResult`]; never returned as `Err`
/// from [`crate::resolve`].
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The target does not exist. No rule query was attempted.
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Reading the target's access rules failed.
    #[error("failed to query access rules for {}: {source}", .path.display())]
    QueryFailure {
        path: PathBuf,
        #[source]
        source: QueryError,
    },
}

impl ResolveError {
    /// Short machine-readable kind, used in JSON reports and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::QueryFailure { .. } => "query_failure",
        }
    }
}

/// Errors raised by a [`crate::DescriptorSource`] while reading access rules.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The caller may not read the security information of the target.
    #[error("access denied reading security information of {}", .0.display())]
    AccessDenied(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The host returned rules that could not be interpreted.
    #[error("malformed access rules: {0}")]
    Malformed(String),

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
}

impl QueryError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Map an I/O error, turning `PermissionDenied` into [`Self::AccessDenied`].
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            Self::AccessDenied(path.into())
        } else {
            Self::Io(err)
        }
    }
}

/// Errors parsing textual rights or identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RightsParseError {
    #[error("unknown right: {0}")]
    UnknownRight(String),

    #[error("unknown rule kind: {0} (expected allow or deny)")]
    UnknownKind(String),
}
