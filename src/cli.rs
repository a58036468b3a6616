// src/cli.rs

//! CLI argument parsing using `clap`.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::parse_duration;

/// Command-line arguments for `lockstep`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "lockstep",
    version,
    about = "Run a batch of tasks on a worker pool with enforced lock ordering.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the batch file (TOML).
    ///
    /// Default: `Lockstep.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Lockstep.toml")]
    pub config: String,

    /// Worker pool size; overrides `[config].workers`.
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// How long to wait for the batch (e.g. `500ms`, `10s`); overrides
    /// `[config].timeout`.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LOCKSTEP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate, print resources, tasks and the lock-order analysis, but
    /// don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
