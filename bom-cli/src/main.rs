//! Binary crate for the `bom-geojson` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and layering them over the config file
//! - Logging setup
//! - Human-friendly run summaries

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
