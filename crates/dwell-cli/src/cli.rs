//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Browser dwell-time tracker.
///
/// Turns tab activation, navigation and idle events into per-site visits and
/// hands each finished visit to a collector.
#[derive(Debug, Parser)]
#[command(name = "dwell", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Provision the user identifier attached to every visit.
    Init,

    /// Read browser events from stdin and deliver visits to the collector.
    Track {
        /// Use this user identifier instead of the provisioned one.
        #[arg(long)]
        user_id: Option<String>,
    },

    /// Replay recorded browser events and print finished visits as JSONL.
    Replay {
        /// Events file (JSONL). Reads stdin when omitted.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Use this user identifier instead of the provisioned one.
        #[arg(long)]
        user_id: Option<String>,
    },

    /// Show effective configuration and identity.
    Status,
}
