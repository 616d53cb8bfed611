//! Core library for the `forecaster` service.
//!
//! This crate defines:
//! - Coordinates, forecast summaries and temperature classes
//! - Abstraction over the forecast provider and the NWS implementation
//! - The decode/validate/lookup/render pipeline
//! - Configuration handling
//!
//! It is used by `forecast-server`, but can also be reused by other binaries or services.

pub mod config;
pub mod forecast;
pub mod model;
pub mod provider;

pub use config::{Config, ServerConfig, UpstreamConfig};
pub use forecast::{ForecastError, decode_coordinates, forecast_for, summarize};
pub use model::{Coordinates, ForecastSummary, TemperatureClass};
pub use provider::{GridForecastProvider, ProviderError, nws::NwsClient, provider_from_config};
