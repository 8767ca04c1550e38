//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: analyze a batch of targets from a CSV file
//! - list: list persisted runs
//! - show: print one run in full

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Argus - batch satellite imagery analysis orchestrator
#[derive(Parser, Debug)]
#[command(name = "argus")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze every new target in a CSV file
    Run {
        /// CSV file with latitude, longitude, country columns
        csv: PathBuf,

        /// Process at most this many rows
        #[arg(short, long)]
        limit: Option<usize>,

        /// Override the configured step budget per target
        #[arg(short, long)]
        max_steps: Option<u32>,
    },

    /// List persisted runs
    List {
        /// Filter by status (in_progress, finished, max_steps_reached, failed)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Print one run in full
    Show {
        /// Target key, e.g. 48.85_2.35_France
        key: String,
    },
}
