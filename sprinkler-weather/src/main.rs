//! Binary crate for the `sprinkler-weather` service and command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Running the HTTP service

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sprinkler_weather::init_tracing();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
