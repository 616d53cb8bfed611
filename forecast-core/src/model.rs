use std::fmt;

use serde::Deserialize;

pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// Raw request body. Both fields are optional here so a missing field is
/// reported as a validation failure rather than a decode failure.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CoordinatesPayload {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Returns `None` when either value lies outside its range.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if is_latitude_valid(latitude) && is_longitude_valid(longitude) {
            Some(Self { latitude, longitude })
        } else {
            None
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl CoordinatesPayload {
    pub fn validate(self) -> Option<Coordinates> {
        Coordinates::new(self.latitude?, self.longitude?)
    }
}

pub fn is_latitude_valid(latitude: f64) -> bool {
    LATITUDE_RANGE.contains(&latitude)
}

pub fn is_longitude_valid(longitude: f64) -> bool {
    LONGITUDE_RANGE.contains(&longitude)
}

/// The fields of the first forecast period this service cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSummary {
    pub short_forecast: String,
    pub temperature: f64,
}

impl ForecastSummary {
    pub fn temperature_class(&self) -> TemperatureClass {
        TemperatureClass::from_temperature(self.temperature)
    }

    /// Response line, e.g. `"Sunny and cold temperature\n"`.
    pub fn render(&self) -> String {
        format!(
            "{} and {} temperature\n",
            self.short_forecast,
            self.temperature_class()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemperatureClass {
    Hot,
    Moderate,
    Cold,
}

impl TemperatureClass {
    pub const HOT_THRESHOLD: f64 = 90.0;
    pub const MODERATE_THRESHOLD: f64 = 70.0;

    /// Boundary values belong to the warmer band.
    pub fn from_temperature(temperature: f64) -> Self {
        if temperature >= Self::HOT_THRESHOLD {
            TemperatureClass::Hot
        } else if temperature >= Self::MODERATE_THRESHOLD {
            TemperatureClass::Moderate
        } else {
            TemperatureClass::Cold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureClass::Hot => "hot",
            TemperatureClass::Moderate => "moderate",
            TemperatureClass::Cold => "cold",
        }
    }
}

impl fmt::Display for TemperatureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
