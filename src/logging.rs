// src/logging.rs

//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `ASSETFLOW_LOG` environment variable (a level such as "debug", or a
//!    full filter such as "assetflow::engine=trace,info")
//! 3. default to `info`
//!
//! Logs go to STDERR.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "ASSETFLOW_LOG";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    fmt()
        .with_env_filter(build_filter(cli_level))
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))
}

pub fn build_filter(cli_level: Option<LogLevel>) -> EnvFilter {
    match cli_level {
        Some(level) => EnvFilter::new(level.as_str()),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
    }
}
