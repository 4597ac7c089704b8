//! Command-line interface definitions.

use std::path::PathBuf;

use clap::Parser;

use crate::config::OutputFormat;

/// Effperm - report the effective file-system rights of a user
#[derive(Parser, Debug, Default)]
#[command(name = "effperm")]
#[command(author, version, about)]
#[command(after_help = "EXAMPLES:
    # Report rights of the current user below the working directory
    effperm

    # Evaluate another account, writing the report to a chosen file
    effperm /srv/share --as-user alice -o share.log

    # Layer deny rules from a TOML file on top of the mode bits
    effperm /srv/share --acl-file rules.toml --yes

Every flag may also be set through an EFFPERM_* environment variable or a
.env file; flags win.")]
pub struct Args {
    /// Directory (or file) to scan (also: EFFPERM_ROOT, default: current directory)
    pub path: Option<PathBuf>,

    /// Report file (also: EFFPERM_LOG_FILE)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Number of targets resolved in parallel (also: EFFPERM_CONCURRENCY)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Also report subdirectories, not only files (also: EFFPERM_INCLUDE_DIRS)
    #[arg(long)]
    pub include_dirs: bool,

    /// Resolve only the root itself
    #[arg(long)]
    pub no_recurse: bool,

    /// TOML file with extra allow/deny rules (also: EFFPERM_ACL_FILE)
    #[arg(long, value_name = "FILE")]
    pub acl_file: Option<PathBuf>,

    /// Evaluate rights for this account instead of the current process (also: EFFPERM_AS_USER)
    #[arg(long, value_name = "NAME")]
    pub as_user: Option<String>,

    /// Record format (also: EFFPERM_FORMAT)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Emit diagnostics as JSON (also: EFFPERM_LOG_JSON)
    #[arg(long)]
    pub log_json: bool,

    /// Overwrite an existing report without asking
    #[arg(short, long)]
    pub yes: bool,
}
