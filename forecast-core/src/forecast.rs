//! The request pipeline shared by the HTTP handler and the `show` command:
//! decode, validate, resolve grid, fetch forecast, render.

use tracing::debug;

use crate::{
    model::{Coordinates, CoordinatesPayload, ForecastSummary},
    provider::{GridForecastProvider, ProviderError},
};

#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("Cannot decode json payload")]
    Decode(#[source] serde_json::Error),

    #[error("Latitude must be between -90 and 90, and longitude must be between -180 and 180")]
    InvalidCoordinates,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ForecastError {
    /// Whether the failure is attributable to the caller's input.
    pub fn is_client_error(&self) -> bool {
        match self {
            ForecastError::Decode(_) | ForecastError::InvalidCoordinates => true,
            ForecastError::Provider(e) => e.is_coverage(),
        }
    }
}

/// Only a JSON object is accepted; the sequence form serde would otherwise
/// allow for a struct (`[lat, lon]`) is a decode error.
pub fn decode_coordinates(body: &[u8]) -> Result<Coordinates, ForecastError> {
    let value: serde_json::Value = serde_json::from_slice(body).map_err(ForecastError::Decode)?;
    if !value.is_object() {
        return Err(ForecastError::Decode(serde::de::Error::invalid_type(
            serde::de::Unexpected::Other(json_kind(&value)),
            &"a JSON object with latitude and longitude",
        )));
    }

    let payload: CoordinatesPayload =
        serde_json::from_value(value).map_err(ForecastError::Decode)?;

    payload.validate().ok_or(ForecastError::InvalidCoordinates)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Looks up the current forecast for already validated coordinates. The two
/// provider calls run strictly in sequence and the first failure ends the lookup.
pub async fn forecast_for(
    provider: &dyn GridForecastProvider,
    coordinates: Coordinates,
) -> Result<ForecastSummary, ForecastError> {
    let grid_url =
        provider.resolve_grid_url(coordinates.latitude(), coordinates.longitude()).await?;
    debug!(%grid_url, "resolved forecast grid");

    let summary = provider.fetch_forecast(&grid_url).await?;
    debug!(
        short_forecast = %summary.short_forecast,
        temperature = summary.temperature,
        "fetched forecast"
    );

    Ok(summary)
}

/// Full pipeline from a raw JSON body to the response line.
pub async fn summarize(
    provider: &dyn GridForecastProvider,
    body: &[u8],
) -> Result<String, ForecastError> {
    let coordinates = decode_coordinates(body)?;
    let summary = forecast_for(provider, coordinates).await?;
    Ok(summary.render())
}
