//! Effperm
//!
//! Reports the effective file-system rights of a user on every file below a
//! directory, together with the rules that granted or denied them.

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod output;
pub mod scan;

use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use ep_core::{DescriptorSource, Principal};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{HostError, Result};
use crate::output::{confirm_overwrite, Report, ReportHeader};
use crate::scan::{scan, ScanOptions, ScanSummary};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The report was written.
    Written(ScanSummary),
    /// The user declined to overwrite an existing report.
    Declined,
}

/// Scan root as an absolute, canonical path when it exists.
fn scan_root(config: &Config) -> PathBuf {
    std::fs::canonicalize(&config.root).unwrap_or_else(|_| config.root.clone())
}

/// Run a scan for `principal` against `source`.
///
/// The overwrite question is read from `input`; header, records and the
/// closing line go to `console`.
pub async fn execute<P, S, R, W>(
    config: &Config,
    principal: Arc<P>,
    source: Arc<S>,
    input: R,
    mut console: W,
) -> Result<Outcome>
where
    P: Principal + 'static,
    S: DescriptorSource + 'static,
    R: BufRead,
    W: Write,
{
    let root = scan_root(config);
    let header = ReportHeader::new(principal.name(), &root, &config.log_file);
    header.write_to(&mut console)?;

    if config.log_file.exists() && !config.assume_yes && !confirm_overwrite(input, &mut console)? {
        info!(file = %config.log_file.display(), "Existing report kept, nothing written");
        return Ok(Outcome::Declined);
    }

    if config.report_inside_root() {
        warn!(file = %config.log_file.display(), "Report file is inside the scanned tree");
    }

    let file = File::create(&config.log_file).map_err(|source| HostError::ReportFile {
        path: config.log_file.clone(),
        source,
    })?;
    let mut report = Report::new(console, BufWriter::new(file), config.format);
    report.begin(&header)?;

    let options = ScanOptions {
        include_dirs: config.include_dirs,
        recurse: config.recurse,
    };
    let summary = scan(
        &root,
        options,
        principal,
        source,
        config.concurrency,
        |result| report.record(result),
    )
    .await?;

    report.finish(&config.log_file)?;
    Ok(Outcome::Written(summary))
}

/// Run a scan for the configured user against the local file system.
#[cfg(unix)]
pub async fn run(config: &Config) -> Result<Outcome> {
    use crate::host::{AccountDb, ModeDescriptorSource, OverlaySource, UnixPrincipal};

    let accounts = Arc::new(AccountDb::load()?);
    let principal = match &config.as_user {
        Some(name) => UnixPrincipal::for_user(name, &accounts)?,
        None => UnixPrincipal::current(&accounts)?,
    };

    let mode = ModeDescriptorSource::new(Arc::clone(&accounts));
    let source = match &config.acl_file {
        Some(path) => OverlaySource::load(mode, path)?,
        None => OverlaySource::new(mode, Vec::new()),
    };

    let stdin = std::io::stdin();
    execute(
        config,
        Arc::new(principal),
        Arc::new(source),
        stdin.lock(),
        std::io::stdout(),
    )
    .await
}

/// Run a scan for the configured user against the local file system.
#[cfg(not(unix))]
pub async fn run(_config: &Config) -> Result<Outcome> {
    Err(HostError::UnsupportedPlatform(
        "reading access rules requires a Unix host".to_string(),
    ))
}
