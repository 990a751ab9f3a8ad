//! Command-line interface definition

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Mirror source folders into destination folders, once or continuously
#[derive(Debug, Parser)]
#[command(name = "frep", version, about)]
pub struct Cli {
    /// Store file holding replications and settings
    #[arg(long, global = true, env = "FREP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a replication and sync it immediately
    Add {
        source: PathBuf,
        destination: PathBuf,
        /// Literal substrings to exclude (not globs)
        #[arg(short, long, num_args = 1..)]
        exclude: Vec<String>,
    },

    /// Unregister the replication rooted at SOURCE
    Remove { source: PathBuf },

    /// List configured replications
    List,

    /// Sync one replication (by source) or all of them
    Sync {
        source: Option<PathBuf>,
        /// Show the plan without changing anything
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Show file counts and last sync time for each replication
    Status {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Watch sources for changes and sync periodically until interrupted
    Watch {
        /// Minutes between full syncs (defaults to the store setting)
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

impl Cli {
    /// Log filter directive derived from the verbosity flags
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
