//! Scan configuration.
//!
//! Loaded from `EFFPERM_*` environment variables, then overridden by
//! command-line flags.

use std::env;
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::cli::Args;
use crate::error::{HostError, Result};

/// File name of the report when none is configured.
pub const DEFAULT_LOG_FILE_NAME: &str = "Effective Permissions.log";

/// Parallel resolutions when none is configured.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// How each resolution is written to the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable blocks.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self> {
        <Self as ValueEnum>::from_str(s, true)
            .map_err(|_| HostError::config(format!("unknown format: {s}")))
    }
}

/// Scan configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory (or file) to scan
    pub root: PathBuf,

    /// Report file
    pub log_file: PathBuf,

    /// Parallel resolutions (at least 1)
    pub concurrency: usize,

    /// Report subdirectories as well as files
    pub include_dirs: bool,

    /// Descend below the root
    pub recurse: bool,

    /// Optional TOML rule overlay
    pub acl_file: Option<PathBuf>,

    /// Account to evaluate; `None` means the current process
    pub as_user: Option<String>,

    pub format: OutputFormat,

    /// JSON diagnostics on stderr
    pub log_json: bool,

    /// Overwrite an existing report without asking
    pub assume_yes: bool,
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(HostError::config(format!("{key}: expected a boolean, got {other:?}"))),
    }
}

fn parse_concurrency(key: &str, value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err(HostError::config(format!("{key} must be at least 1"))),
        Ok(n) => Ok(n),
        Err(e) => Err(HostError::config(format!("{key}: {e}"))),
    }
}

/// `$HOME/Desktop` when it exists, else `$HOME`, else the working directory.
fn default_report_dir(home: Option<PathBuf>) -> PathBuf {
    match home {
        Some(home) => {
            let desktop = home.join("Desktop");
            if desktop.is_dir() {
                desktop
            } else {
                home
            }
        }
        None => PathBuf::from("."),
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let root = match lookup("EFFPERM_ROOT") {
            Some(root) => PathBuf::from(root),
            None => env::current_dir()?,
        };

        let log_file = lookup("EFFPERM_LOG_FILE").map_or_else(
            || default_report_dir(lookup("HOME").map(PathBuf::from)).join(DEFAULT_LOG_FILE_NAME),
            PathBuf::from,
        );

        let concurrency = lookup("EFFPERM_CONCURRENCY")
            .map(|v| parse_concurrency("EFFPERM_CONCURRENCY", &v))
            .transpose()?
            .unwrap_or(DEFAULT_CONCURRENCY);

        let flag = |key: &str| -> Result<bool> {
            lookup(key).map_or(Ok(false), |v| parse_bool(key, &v))
        };

        Ok(Self {
            root,
            log_file,
            concurrency,
            include_dirs: flag("EFFPERM_INCLUDE_DIRS")?,
            recurse: true,
            acl_file: lookup("EFFPERM_ACL_FILE").map(PathBuf::from),
            as_user: lookup("EFFPERM_AS_USER").filter(|u| !u.trim().is_empty()),
            format: lookup("EFFPERM_FORMAT")
                .map(|v| v.parse::<OutputFormat>())
                .transpose()?
                .unwrap_or_default(),
            log_json: flag("EFFPERM_LOG_JSON")?,
            assume_yes: false,
        })
    }

    /// Apply command-line overrides.
    ///
    /// Boolean flags take effect only when present on the command line.
    pub fn with_args(mut self, args: &Args) -> Result<Self> {
        if let Some(path) = &args.path {
            self.root.clone_from(path);
        }
        if let Some(output) = &args.output {
            self.log_file.clone_from(output);
        }
        if let Some(jobs) = args.jobs {
            if jobs == 0 {
                return Err(HostError::config("--jobs must be at least 1"));
            }
            self.concurrency = jobs;
        }
        if args.acl_file.is_some() {
            self.acl_file.clone_from(&args.acl_file);
        }
        if args.as_user.is_some() {
            self.as_user.clone_from(&args.as_user);
        }
        if let Some(format) = args.format {
            self.format = format;
        }
        self.include_dirs |= args.include_dirs;
        self.recurse &= !args.no_recurse;
        self.log_json |= args.log_json;
        self.assume_yes |= args.yes;
        Ok(self)
    }

    /// Whether the report file is inside the scanned tree.
    #[must_use]
    pub fn report_inside_root(&self) -> bool {
        let canon = |p: &Path| std::fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
        // A bare file name lives in the working directory.
        let log_dir = self
            .log_file
            .parent()
            .map(|dir| if dir.as_os_str().is_empty() { Path::new(".") } else { dir })
            .map(canon);
        log_dir.is_some_and(|dir| dir.starts_with(canon(&self.root)))
    }

    /// Create a default configuration for testing.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            root: PathBuf::from("."),
            log_file: PathBuf::from(DEFAULT_LOG_FILE_NAME),
            concurrency: DEFAULT_CONCURRENCY,
            include_dirs: false,
            recurse: true,
            acl_file: None,
            as_user: None,
            format: OutputFormat::Text,
            log_json: false,
            assume_yes: true,
        }
    }
}
