//! Host error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for host operations.
pub type Result<T> = std::result::Result<T, HostError>;

/// Errors raised by the host layer (configuration, account lookup, rule
/// overlays, report output).
///
/// Per-target resolution failures are not here; they travel inside
/// [`ep_core::ResolutionResult`].
#[derive(Error, Debug)]
pub enum HostError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read account database {}: {source}", .path.display())]
    AccountDatabase {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("cannot determine current identity: {0}")]
    Identity(String),

    #[error("failed to parse rule file {}: {source}", .path.display())]
    OverlayParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid rule in {}: {message}", .path.display())]
    OverlayRule { path: PathBuf, message: String },

    #[error("cannot write report {}: {source}", .path.display())]
    ReportFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("resolution task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
}

impl HostError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn identity(msg: impl Into<String>) -> Self {
        Self::Identity(msg.into())
    }
}
