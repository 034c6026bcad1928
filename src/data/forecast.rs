//! Open-Meteo hourly wind client
//!
//! This module fetches hourly wind series from the Open-Meteo forecast or
//! marine API and parses them into [`ForecastSeries`] values.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::ForecastSeries;

/// Base URL for the Open-Meteo atmospheric forecast API
const OPEN_METEO_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Base URL for the Open-Meteo marine API
const OPEN_METEO_MARINE_URL: &str = "https://marine-api.open-meteo.com/v1/marine";

/// Which upstream endpoint to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastFlavor {
    /// Wind speed and direction only
    #[default]
    Atmospheric,
    /// Wind plus wind-wave height
    Marine,
}

impl ForecastFlavor {
    /// Default endpoint for this flavor
    pub fn default_url(&self) -> &'static str {
        match self {
            ForecastFlavor::Atmospheric => OPEN_METEO_FORECAST_URL,
            ForecastFlavor::Marine => OPEN_METEO_MARINE_URL,
        }
    }

    /// Value of the `hourly` query parameter
    fn hourly_fields(&self) -> &'static str {
        match self {
            ForecastFlavor::Atmospheric => "wind_speed_10m,wind_direction_10m",
            ForecastFlavor::Marine => "wind_speed_10m,wind_direction_10m,wind_wave_height",
        }
    }
}

/// Errors that can occur when fetching a forecast series
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Upstream answered with a non-success status
    #[error("Upstream returned HTTP {status}")]
    Upstream { status: u16 },

    /// Required arrays are missing, misaligned, or null where needed
    #[error("Malformed forecast data: {0}")]
    Malformed(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Anything that can produce an hourly series for a coordinate
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<ForecastSeries, ForecastError>;
}

/// Client for fetching hourly wind from the Open-Meteo API
#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: Client,
    flavor: ForecastFlavor,
    base_url: String,
    timezone: String,
}

impl Default for ForecastClient {
    fn default() -> Self {
        Self::new(ForecastFlavor::default())
    }
}

impl ForecastClient {
    /// Create a new ForecastClient for the given endpoint flavor
    pub fn new(flavor: ForecastFlavor) -> Self {
        Self {
            client: Client::new(),
            flavor,
            base_url: flavor.default_url().to_string(),
            timezone: "auto".to_string(),
        }
    }

    /// Replace the HTTP client
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Build an HTTP client with a per-request timeout
    pub fn with_request_timeout(self, timeout: Duration) -> Result<Self, ForecastError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(self.with_client(client))
    }

    /// Point the client at a different endpoint (mirrors, self-hosted instances)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Create a new ForecastClient with a custom timezone
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn flavor(&self) -> ForecastFlavor {
        self.flavor
    }

    /// Full request URL for a coordinate
    fn build_url(&self, lat: f64, lon: f64) -> String {
        format!(
            "{}?latitude={}&longitude={}&hourly={}&wind_speed_unit=ms&timezone={}",
            self.base_url,
            lat,
            lon,
            self.flavor.hourly_fields(),
            self.timezone
        )
    }

    /// Fetch the hourly series for the given coordinates
    ///
    /// # Returns
    /// * `Ok(ForecastSeries)` - Aligned hourly arrays for the point
    /// * `Err(ForecastError)` - If the request, status, or payload is bad
    pub async fn fetch_series(&self, lat: f64, lon: f64) -> Result<ForecastSeries, ForecastError> {
        let url = self.build_url(lat, lon);
        debug!(%url, "fetching forecast");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ForecastError::Upstream {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        let api_response: OpenMeteoResponse = serde_json::from_str(&text)?;
        self.parse_response(api_response)
    }

    /// Validate the hourly block and convert it into a series
    fn parse_response(&self, response: OpenMeteoResponse) -> Result<ForecastSeries, ForecastError> {
        let hourly = response
            .hourly
            .ok_or_else(|| ForecastError::Malformed("missing hourly block".to_string()))?;

        let labels = hourly
            .time
            .ok_or_else(|| missing("time"))?;
        let speed = hourly.wind_speed_10m.ok_or_else(|| missing("wind_speed_10m"))?;
        let direction_from = hourly
            .wind_direction_10m
            .ok_or_else(|| missing("wind_direction_10m"))?;

        let len = labels.len();
        if len == 0 {
            return Err(ForecastError::Malformed("hourly series is empty".to_string()));
        }
        if speed.len() != len || direction_from.len() != len {
            return Err(ForecastError::Malformed(
                "hourly arrays have inconsistent lengths".to_string(),
            ));
        }

        // Wave height is optional; a misaligned array is dropped rather than fatal
        let wave_height = match hourly.wind_wave_height {
            Some(waves) if waves.len() == len => Some(waves),
            Some(waves) => {
                debug!(expected = len, got = waves.len(), "ignoring misaligned wave heights");
                None
            }
            None => None,
        };

        let offset = response.utc_offset_seconds;
        let times = labels
            .iter()
            .map(|label| parse_local_time(label, offset))
            .collect::<Result<Vec<_>, _>>()?;
        if times.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(ForecastError::Malformed(
                "hourly times are not strictly increasing".to_string(),
            ));
        }

        Ok(ForecastSeries {
            times,
            labels,
            speed,
            direction_from,
            wave_height,
        })
    }
}

#[async_trait]
impl ForecastSource for ForecastClient {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<ForecastSeries, ForecastError> {
        self.fetch_series(lat, lon).await
    }
}

fn missing(field: &str) -> ForecastError {
    ForecastError::Malformed(format!("missing hourly field: {}", field))
}

/// Parse an Open-Meteo local time (e.g. "2024-07-15T05:00") into UTC
fn parse_local_time(label: &str, utc_offset_seconds: i64) -> Result<DateTime<Utc>, ForecastError> {
    let local = NaiveDateTime::parse_from_str(label, "%Y-%m-%dT%H:%M")
        .map_err(|_| ForecastError::Malformed(format!("invalid time: {}", label)))?;
    let utc = local - chrono::Duration::seconds(utc_offset_seconds);
    Ok(utc.and_utc())
}

/// Open-Meteo API response structure
#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    #[serde(default)]
    utc_offset_seconds: i64,
    hourly: Option<HourlyWind>,
}

/// Hourly wind data from Open-Meteo
#[derive(Debug, Deserialize)]
struct HourlyWind {
    time: Option<Vec<String>>,
    wind_speed_10m: Option<Vec<Option<f64>>>,
    wind_direction_10m: Option<Vec<Option<f64>>>,
    wind_wave_height: Option<Vec<Option<f64>>>,
}
