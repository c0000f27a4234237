//! # S3 Replication CLI
//!
//! Binary entry point for the `s3-replication` command-line tool. It parses
//! arguments with `clap`, sets up logging, and dispatches to the command
//! implementations, which are thin wrappers around the `s3_replication`
//! library.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
