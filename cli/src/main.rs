//! Effperm - Main Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ep_cli::cli::Args;
use ep_cli::config::Config;
use ep_cli::Outcome;

const DEFAULT_LOG_FILTER: &str = "effperm=info,ep_cli=info,ep_core=info";

/// Diagnostics go to stderr so stdout carries only the report.
fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()
        .and_then(|config| config.with_args(&args))
        .context("Invalid configuration")?;

    init_tracing(config.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        root = %config.root.display(),
        "Starting effperm"
    );

    match ep_cli::run(&config).await.context("Scan failed")? {
        Outcome::Written(summary) => info!(
            targets = summary.targets,
            failures = summary.failures,
            "Report written"
        ),
        Outcome::Declined => info!("Nothing written"),
    }

    Ok(())
}
