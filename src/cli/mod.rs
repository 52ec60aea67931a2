//! CLI module
//!
//! Command-line interface for running feeds.
//!
//! # Commands
//!
//! - `run` - Run a feed and write the document
//! - `validate` - Validate a feed definition
//! - `params` - Show a feed's required parameters

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
