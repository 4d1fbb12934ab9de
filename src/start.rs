//! Startup helpers for the `ragdesk` binary.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::ClientConfig;
use crate::console::{self, Cli};

/// Filter used when `RUST_LOG` is unset or empty.
const DEFAULT_LOG_FILTER: &str = "info";

/// Parse arguments, install logging and run the selected command.
///
/// # Returns
/// `ExitCode::SUCCESS` when the command completes, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with chat output.
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(
            std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
        ))
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting ragdesk v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(console::dispatch(cli, config)) {
        tracing::error!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Filter from the raw `RUST_LOG` value, or `info` when it is unset, empty or invalid.
#[must_use]
pub fn log_filter(raw: Option<&str>) -> EnvFilter {
    raw.filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Environment configuration with the command-line overrides applied.
#[must_use]
pub fn load_config(cli: &Cli) -> ClientConfig {
    let config = ClientConfig::from_env();
    match &cli.base_url {
        Some(url) => config.with_base_url(url.clone()),
        None => config,
    }
}
