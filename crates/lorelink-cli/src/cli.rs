//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Data directory for snapshot persistence
    #[arg(short, long)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an in-process mesh demo: one host plus N joiners converging on
    /// a shared session
    Demo {
        /// Host display name (defaults to the configured identity)
        #[arg(short, long)]
        name: Option<String>,

        /// Number of joining peers (defaults to the configured count)
        #[arg(short, long)]
        peers: Option<usize>,
    },
    /// Print the saved snapshot for an account, if any
    Snapshot {
        /// Account key to inspect
        #[arg(short, long)]
        account: String,
    },
}
