// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::demo::Demo;
use crate::types::{ConcurrencyLimit, parse_duration};

/// Command-line arguments for `nodeflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "nodeflow",
    version,
    about = "Run a built-in dataflow graph on the async execution engine.",
    long_about = None
)]
pub struct CliArgs {
    /// Demo graph to run.
    #[arg(value_enum, default_value_t = Demo::Chain)]
    pub demo: Demo,

    /// Path to the config file (TOML).
    ///
    /// Default: `Nodeflow.toml` in the current working directory, skipped if
    /// it does not exist. An explicitly given path must exist.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum simultaneously running nodes (a number or `unbounded`).
    ///
    /// Overrides `[engine].concurrency`.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<ConcurrencyLimit>,

    /// Per-node deadline such as `500ms` or `5s`.
    ///
    /// Overrides `[engine].node_timeout`.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub node_timeout: Option<Duration>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `NODEFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Build the graph and print it with its derived data, without running.
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
