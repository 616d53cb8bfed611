//! Client for the US National Weather Service API.
//!
//! Forecasts are reached through an indirection: `/points/{lat},{lon}` names the
//! forecast grid covering a location, and `{grid}/forecast` holds the periods.
//! The API is documented [here](https://www.weather.gov/documentation/services-web-api).

use async_trait::async_trait;
use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{config::UpstreamConfig, model::ForecastSummary};

use super::{GridForecastProvider, ProviderError};

#[derive(Debug, Clone)]
pub struct NwsClient {
    base_url: String,
    http: Client,
}

impl NwsClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/geo+json"));

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self { base_url: config.base_url.trim_end_matches('/').to_string(), http })
    }

    async fn get(&self, url: &str) -> Result<Response, ProviderError> {
        debug!(%url, "requesting weather service");

        self.http.get(url).send().await.map_err(|source| unavailable(url, source))
    }

    /// Turns a non-success status into `UpstreamUnavailable`, logging a
    /// prefix of the body for diagnostics.
    async fn ensure_success(url: &str, res: Response) -> Result<Response, ProviderError> {
        let failure = res.error_for_status_ref().err();

        match failure {
            None => Ok(res),
            Some(source) => {
                let status = res.status();
                let body = body_for_log(res.text().await);
                warn!(%url, %status, %body, "weather service returned an error");
                Err(unavailable(url, source))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiPoints {
    properties: Option<ApiPointsProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPointsProperties {
    forecast_grid_data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiForecastResponse {
    properties: Option<ApiForecastProperties>,
}

#[derive(Debug, Deserialize)]
struct ApiForecastProperties {
    // Periods stay untyped until the first one is picked, so a malformed
    // period maps to `ForecastFieldMissing` instead of a decode failure.
    periods: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPeriod {
    short_forecast: String,
    temperature: f64,
}

#[async_trait]
impl GridForecastProvider for NwsClient {
    async fn resolve_grid_url(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/points/{latitude},{longitude}", self.base_url);

        let res = self.get(&url).await?;

        if res.status() == StatusCode::NOT_FOUND {
            debug!(%url, "no forecast grid for coordinates");
            return Err(ProviderError::GridDataNotFound);
        }

        let res = Self::ensure_success(&url, res).await?;
        let points: ApiPoints = res.json().await.map_err(|source| unavailable(&url, source))?;

        points
            .properties
            .and_then(|p| p.forecast_grid_data)
            .filter(|grid_url| !grid_url.is_empty())
            .ok_or_else(|| {
                warn!(%url, "points response is missing forecastGridData");
                ProviderError::GridDataMissing
            })
    }

    async fn fetch_forecast(&self, grid_url: &str) -> Result<ForecastSummary, ProviderError> {
        let url = format!("{grid_url}/forecast");

        let res = self.get(&url).await?;
        let res = Self::ensure_success(&url, res).await?;
        let forecast: ApiForecastResponse =
            res.json().await.map_err(|source| unavailable(&url, source))?;

        let first = forecast
            .properties
            .and_then(|p| p.periods)
            .and_then(|periods| periods.into_iter().next())
            .ok_or_else(|| {
                warn!(%url, "forecast response has no periods");
                ProviderError::ForecastPeriodsMissing
            })?;

        let period: ApiPeriod = serde_json::from_value(first).map_err(|e| {
            warn!(%url, error = %e, "first forecast period is malformed");
            ProviderError::ForecastFieldMissing(e.to_string())
        })?;

        Ok(ForecastSummary {
            short_forecast: period.short_forecast,
            temperature: period.temperature,
        })
    }
}

fn unavailable(url: &str, source: reqwest::Error) -> ProviderError {
    ProviderError::UpstreamUnavailable { url: url.to_string(), source }
}

fn body_for_log(read: reqwest::Result<String>) -> String {
    match read {
        Ok(body) => truncate_body(&body).to_string(),
        Err(e) => format!("<unreadable body: {e}>"),
    }
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body;
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
