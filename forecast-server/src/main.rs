//! Binary crate for the `forecaster` service.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and interactive configuration
//! - Serving `/forecast` over HTTP
//! - Logging setup

use clap::Parser;

mod cli;
mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}

const DEFAULT_LOG_FILTER: &str = "info,forecast_core=debug,forecaster=debug";
