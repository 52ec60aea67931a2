//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Datafeed kit CLI
#[derive(Parser, Debug)]
#[command(name = "datafeed-kit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Feed definition file (YAML)
    #[arg(short, long, global = true)]
    pub feed: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a feed and write the document
    Run {
        /// Inline parameters JSON
        #[arg(long)]
        params_json: Option<String>,

        /// Parameters file (JSON)
        #[arg(short, long)]
        params: Option<PathBuf>,

        /// Inline scheduler tokens JSON
        #[arg(long)]
        tokens_json: Option<String>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a feed definition
    Validate,

    /// Show a feed's required parameters
    Params,
}
