//! SIA DB Secrets CLI
//!
//! This is the main entry point for the CLI application.

mod cli;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr, command output to stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    use clap::Parser;
    let cli = cli::Cli::parse();

    cli::execute(cli).await
}
