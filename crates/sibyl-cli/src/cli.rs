//! Command-line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the sibyl CLI.
#[derive(Debug, Parser)]
#[command(name = "sibyl", version, about = "Intent registry and classification engine")]
pub struct Cli {
    /// Registry file to operate on (defaults to `~/.sibyl/intents.toml`)
    #[arg(short = 'f', long, global = true)]
    pub registry: Option<PathBuf>,

    /// Operation to perform
    #[command(subcommand)]
    pub command: Command,
}

/// Supported operations.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a starter registry file to get going
    Init,
    /// Validate a candidate registry file, or the active one, without
    /// publishing anything
    Validate {
        /// Candidate file to check; the active registry when omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// List configured intents with per-category counts
    List,
    /// Classify one utterance and print the decision
    Classify {
        /// Text to classify
        utterance: String,
    },
    /// Apply record add/updates from a file, one merge at a time
    Apply {
        /// File holding the records to apply
        #[arg(long)]
        file: PathBuf,
    },
    /// Replace the whole registry with a validated candidate file
    Reload {
        /// File holding the replacement record set
        #[arg(long)]
        file: PathBuf,
    },
    /// Print registry statistics
    Stats,
}
