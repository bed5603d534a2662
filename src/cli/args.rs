//! Command line argument parsing for the weft CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// weft - inspect filter, search and batch payloads offline
#[derive(Parser, Debug, Clone)]
#[command(name = "weft")]
#[command(about = "Serialize filters and batch objects for the vector database protocols")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct WeftArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl WeftArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }

    /// Default log filter for the effective verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbosity() {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serialize a JSON filter expression
    Filter(FilterArgs),

    /// Show the capabilities negotiated for a server version
    Capabilities(CapabilitiesArgs),

    /// Classify a JSON property value
    Classify(ClassifyArgs),

    /// Encode a JSON Lines file of objects as a batch
    Batch(BatchArgs),
}

/// Arguments for filter serialization
#[derive(Parser, Debug, Clone)]
pub struct FilterArgs {
    /// Filter file (JSON), or `-` for stdin
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    pub input: String,

    /// Protocol to serialize for
    #[arg(short, long, default_value = "textual")]
    pub target: FilterTarget,
}

/// Filter serialization targets
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterTarget {
    /// Textual protocol, as JSON
    Textual,
    /// Textual protocol, as a GraphQL argument
    Graphql,
    /// Binary protocol
    Binary,
}

#[derive(Parser, Debug, Clone)]
pub struct CapabilitiesArgs {
    /// Server version, e.g. 1.27.3
    #[arg(short, long, value_name = "VERSION", env = "WEFT_SERVER_VERSION")]
    pub server_version: String,
}

#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    /// JSON value to classify
    #[arg(value_name = "JSON")]
    pub value: String,
}

/// Arguments for batch encoding
#[derive(Parser, Debug, Clone)]
pub struct BatchArgs {
    /// JSON Lines file, one object of properties per line
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Target collection
    #[arg(short, long)]
    pub collection: String,

    /// Tenant to write to
    #[arg(long)]
    pub tenant: Option<String>,

    /// Objects encoded between cooperative yields
    #[arg(long, default_value = "1")]
    pub yield_every: usize,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
