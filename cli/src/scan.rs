//! Directory walk and concurrent resolution.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ep_core::{resolve, DescriptorSource, Principal, ResolutionResult};
use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::error::{HostError, Result};

/// What the walk collects below the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Report subdirectories as well as files.
    pub include_dirs: bool,
    /// Descend below the root.
    pub recurse: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_dirs: false,
            recurse: true,
        }
    }
}

/// Counts for one finished scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub targets: usize,
    pub failures: usize,
}

/// Children of `dir`, sorted by name; `None` when the directory cannot be
/// listed.
fn sorted_children(dir: &Path) -> Option<Vec<(PathBuf, bool)>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Cannot list directory, skipping");
            return None;
        }
    };

    let mut children: Vec<(PathBuf, bool)> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => {
                // DirEntry::file_type does not follow symlinks.
                let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
                Some((entry.path(), is_dir))
            }
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Cannot read directory entry");
                None
            }
        })
        .collect();
    children.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));
    Some(children)
}

/// Paths to resolve, in report order.
///
/// The root comes first, then everything below it depth-first with siblings
/// sorted by name. Symlinks are reported but never followed.
#[must_use]
pub fn collect_targets(root: &Path, options: ScanOptions) -> Vec<PathBuf> {
    let mut targets = vec![root.to_path_buf()];

    let root_is_dir = root.symlink_metadata().is_ok_and(|m| m.is_dir());
    if !options.recurse || !root_is_dir {
        return targets;
    }

    let mut pending: Vec<(PathBuf, bool)> = sorted_children(root).unwrap_or_default();
    pending.reverse();

    while let Some((path, is_dir)) = pending.pop() {
        if !is_dir {
            targets.push(path);
            continue;
        }
        if options.include_dirs {
            targets.push(path.clone());
        }
        if let Some(children) = sorted_children(&path) {
            pending.extend(children.into_iter().rev());
        }
    }

    debug!(root = %root.display(), targets = targets.len(), "Collected scan targets");
    targets
}

/// Resolve `targets` on the blocking pool, at most `concurrency` at a time.
///
/// Results come out in the order of `targets`.
pub fn resolve_all<P, S>(
    targets: Vec<PathBuf>,
    principal: Arc<P>,
    source: Arc<S>,
    concurrency: usize,
) -> impl Stream<Item = Result<ResolutionResult>>
where
    P: Principal + 'static,
    S: DescriptorSource + 'static,
{
    stream::iter(targets)
        .map(move |target| {
            let principal = Arc::clone(&principal);
            let source = Arc::clone(&source);
            async move {
                tokio::task::spawn_blocking(move || resolve(&target, &*principal, &*source))
                    .await
                    .map_err(HostError::from)
            }
        })
        .buffered(concurrency.max(1))
}

/// Walk `root`, resolve every target and hand each result to `on_result` in
/// report order.
pub async fn scan<P, S, F>(
    root: &Path,
    options: ScanOptions,
    principal: Arc<P>,
    source: Arc<S>,
    concurrency: usize,
    mut on_result: F,
) -> Result<ScanSummary>
where
    P: Principal + 'static,
    S: DescriptorSource + 'static,
    F: FnMut(&ResolutionResult) -> Result<()>,
{
    let targets = collect_targets(root, options);
    let mut summary = ScanSummary::default();

    let mut results = std::pin::pin!(resolve_all(targets, principal, source, concurrency));
    while let Some(result) = results.next().await {
        let result = result?;
        summary.targets += 1;
        if !result.is_ok() {
            summary.failures += 1;
        }
        on_result(&result)?;
    }

    info!(
        root = %root.display(),
        targets = summary.targets,
        failures = summary.failures,
        "Scan complete"
    );
    Ok(summary)
}
