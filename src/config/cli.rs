//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::webhook::RetryOn;

/// Webhook Hub: signed webhook delivery and ingestion
///
/// Delivers record-change events to subscribed HTTP endpoints with retry,
/// and accepts signed pushes from external systems.
#[derive(Debug, Parser)]
#[command(name = "webhook-hub")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Address for the inbound HTTP server (e.g. 0.0.0.0:8090)
    #[arg(long)]
    pub listen: Option<String>,

    /// Append delivery log entries to this JSON-lines file
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Maximum concurrent outbound HTTP attempts
    #[arg(long = "max-in-flight")]
    pub max_in_flight: Option<usize>,

    /// Which failed deliveries are retried
    #[arg(long = "retry-on", value_enum)]
    pub retry_on: Option<RetryOnArg>,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

/// Subcommands for webhook-hub
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "webhook-hub.toml")]
        output: PathBuf,
    },
}

/// Retry classification argument for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RetryOnArg {
    /// Retry every failure
    #[value(name = "any")]
    Any,
    /// Retry only transport failures, timeouts, 5xx, 408 and 429
    #[value(name = "transient")]
    Transient,
}

impl From<RetryOnArg> for RetryOn {
    fn from(arg: RetryOnArg) -> Self {
        match arg {
            RetryOnArg::Any => Self::Any,
            RetryOnArg::Transient => Self::Transient,
        }
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }
}
