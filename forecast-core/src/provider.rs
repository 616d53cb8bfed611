use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;

use crate::{config::UpstreamConfig, model::ForecastSummary, provider::nws::NwsClient};

pub mod nws;

/// Failure modes of a forecast provider, closed so the caller can map each one
/// to a response status.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider has no grid for these coordinates (upstream 404).
    #[error("forecastGridData not available for given coordinates")]
    GridDataNotFound,

    #[error("forecastGridData is missing in result")]
    GridDataMissing,

    #[error("periods field is missing in properties")]
    ForecastPeriodsMissing,

    #[error("first forecast period is malformed: {0}")]
    ForecastFieldMissing(String),

    /// Network failure, timeout, non-success status or undecodable body.
    #[error("request to {url} failed")]
    UpstreamUnavailable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ProviderError {
    /// Coverage errors are a property of the caller's coordinates; everything
    /// else is an upstream fault.
    pub fn is_coverage(&self) -> bool {
        matches!(self, ProviderError::GridDataNotFound)
    }
}

/// Two-step forecast lookup: coordinates to grid URL, grid URL to forecast.
#[async_trait]
pub trait GridForecastProvider: Send + Sync + Debug {
    async fn resolve_grid_url(&self, latitude: f64, longitude: f64)
    -> Result<String, ProviderError>;

    /// Returns the first (nearest) forecast period only.
    async fn fetch_forecast(&self, grid_url: &str) -> Result<ForecastSummary, ProviderError>;
}

/// Construct the production provider from the `[upstream]` config section.
pub fn provider_from_config(
    config: &UpstreamConfig,
) -> anyhow::Result<Arc<dyn GridForecastProvider>> {
    let client = NwsClient::new(config)?;
    Ok(Arc::new(client))
}
