//! local-setup - install a project's tools into a local directory

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use localtools_cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout is for progress and hints.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    localtools_cli::run(Cli::parse()).await
}
