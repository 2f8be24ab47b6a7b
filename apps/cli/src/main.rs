//! stackpost CLI: turn a trending Stack Overflow question into a blog post.
//!
//! Meant to be run once per day by an external scheduler. Each run writes a
//! single markdown post into the configured posts directory.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
