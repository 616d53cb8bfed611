use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use forecast_core::{Config, Coordinates, ForecastError, forecast_for, provider_from_config};
use inquire::{CustomType, Text};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecaster", version, about = "Weather forecast summaries from the NWS API")]
pub struct Cli {
    /// Path to a config file; defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve `/forecast` over HTTP.
    Serve {
        /// Listen address, overrides `server.listen` from the config file.
        #[arg(long)]
        listen: Option<String>,
    },

    /// Print the forecast summary for one location.
    Show {
        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,

        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,
    },

    /// Interactively write the config file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { listen } => serve(self.config.as_deref(), listen).await,
            Command::Show { latitude, longitude } => {
                show(self.config.as_deref(), latitude, longitude).await
            }
            Command::Configure => configure(self.config.as_deref()),
        }
    }
}

async fn serve(config_path: Option<&Path>, listen: Option<String>) -> anyhow::Result<()> {
    let mut config = Config::resolve(config_path)?;
    if let Some(listen) = listen {
        config.server.listen = listen;
    }

    let addr = config.server.listen_addr()?;
    let provider = provider_from_config(&config.upstream)?;

    server::run(addr, provider).await
}

async fn show(config_path: Option<&Path>, latitude: f64, longitude: f64) -> anyhow::Result<()> {
    let coordinates =
        Coordinates::new(latitude, longitude).ok_or(ForecastError::InvalidCoordinates)?;

    let config = Config::resolve(config_path)?;
    let provider = provider_from_config(&config.upstream)?;
    let summary = forecast_for(provider.as_ref(), coordinates)
        .await
        .with_context(|| format!("Failed to fetch forecast for {latitude},{longitude}"))?;

    print!("{}", summary.render());
    Ok(())
}

fn configure(config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = Config::resolve(config_path)?;

    config.server.listen = Text::new("Listen address:")
        .with_default(&config.server.listen)
        .prompt()
        .context("Failed to read listen address")?;

    config.upstream.user_agent = Text::new("User agent sent to api.weather.gov:")
        .with_default(&config.upstream.user_agent)
        .with_help_message("NWS asks for an app name and a contact, e.g. `myapp (me@example.com)`")
        .prompt()
        .context("Failed to read user agent")?;

    config.upstream.timeout_secs = CustomType::<u64>::new("Upstream timeout (seconds):")
        .with_default(config.upstream.timeout_secs)
        .with_error_message("Please type a whole number of seconds")
        .prompt()
        .context("Failed to read timeout")?;

    if let Err(e) = config.validate() {
        bail!("Configuration not saved: {e:#}");
    }

    let path = match config_path {
        Some(path) => {
            config.save_to(path)?;
            path.to_path_buf()
        }
        None => config.save()?,
    };

    println!("Configuration saved to {}", path.display());
    Ok(())
}
