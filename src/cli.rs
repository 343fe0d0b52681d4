// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `assetflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetflow",
    version,
    about = "Build front-end assets: bundles for development, minified copies for distribution.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run, e.g. `dev`, `dev:build` or `dist`.
    #[arg(value_name = "TASK", required_unless_present = "list")]
    pub task: Option<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Assetflow.toml` in the current directory; built-in defaults
    /// are used if it does not exist.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Project root. Default: the config file's directory, or the current
    /// directory.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate and print the task graph without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the task names and exit.
    #[arg(long)]
    pub list: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
