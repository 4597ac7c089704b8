//! Where access rules come from.
//!
//! The host owns the security-descriptor query. The resolver only needs an
//! existence check and the already-flattened (explicit + inherited) rule list.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::entry::AccessRule;
use crate::error::QueryError;

/// Host-provided security-descriptor query.
pub trait DescriptorSource: Send + Sync {
    /// Whether `path` names an existing file or directory.
    ///
    /// Symlinks count as existing even when dangling; the default does not
    /// follow them.
    fn exists(&self, path: &Path) -> bool {
        path.symlink_metadata().is_ok()
    }

    /// Flattened access rules for `path`, explicit rules first.
    fn access_rules(&self, path: &Path) -> Result<Vec<AccessRule>, QueryError>;
}

impl<S: DescriptorSource + ?Sized> DescriptorSource for &S {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn access_rules(&self, path: &Path) -> Result<Vec<AccessRule>, QueryError> {
        (**self).access_rules(path)
    }
}

impl<S: DescriptorSource + ?Sized> DescriptorSource for Arc<S> {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn access_rules(&self, path: &Path) -> Result<Vec<AccessRule>, QueryError> {
        (**self).access_rules(path)
    }
}

#[derive(Debug, Clone)]
enum StaticEntry {
    Rules(Vec<AccessRule>),
    Denied,
    Malformed(String),
}

/// In-memory descriptor source.
///
/// Paths exist only if registered. Useful for embedding fixed policies and
/// for exercising the resolver without touching the file system.
#[derive(Debug, Default)]
pub struct StaticSource {
    entries: HashMap<PathBuf, StaticEntry>,
    queries: AtomicUsize,
}

impl StaticSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` with the given rules.
    #[must_use]
    pub fn with_rules(mut self, path: impl Into<PathBuf>, rules: Vec<AccessRule>) -> Self {
        self.entries.insert(path.into(), StaticEntry::Rules(rules));
        self
    }

    /// Register `path` as existing but unreadable.
    #[must_use]
    pub fn with_access_denied(mut self, path: impl Into<PathBuf>) -> Self {
        self.entries.insert(path.into(), StaticEntry::Denied);
        self
    }

    /// Register `path` as existing with a descriptor that cannot be parsed.
    #[must_use]
    pub fn with_malformed(mut self, path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        self.entries
            .insert(path.into(), StaticEntry::Malformed(reason.into()));
        self
    }

    /// Number of [`DescriptorSource::access_rules`] calls served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }
}

impl DescriptorSource for StaticSource {
    fn exists(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    fn access_rules(&self, path: &Path) -> Result<Vec<AccessRule>, QueryError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        match self.entries.get(path) {
            Some(StaticEntry::Rules(rules)) => Ok(rules.clone()),
            Some(StaticEntry::Denied) => Err(QueryError::AccessDenied(path.to_path_buf())),
            Some(StaticEntry::Malformed(reason)) => Err(QueryError::malformed(reason.clone())),
            None => Err(QueryError::Io(std::io::Error::from(
                std::io::ErrorKind::NotFound,
            ))),
        }
    }
}
