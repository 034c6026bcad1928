//! Core data models for the wind field pipeline
//!
//! This module contains the site inputs, the raw hourly series fetched from
//! the forecast API, and the resolved per-site records handed to renderers.

pub mod forecast;
pub mod sites;

pub use forecast::{ForecastClient, ForecastError, ForecastFlavor, ForecastSource};
pub use sites::default_sites;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Knots per meter per second
pub const KNOTS_PER_MPS: f64 = 1.94384;

/// Converts a speed in m/s to knots
pub fn mps_to_knots(speed_mps: f64) -> f64 {
    speed_mps * KNOTS_PER_MPS
}

/// A named map location to resolve wind for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Identifier, unique within one resolution run
    pub name: String,
    /// Longitude in degrees (WGS84)
    pub lon: f64,
    /// Latitude in degrees (WGS84)
    pub lat: f64,
}

impl Site {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lon,
            lat,
        }
    }
}

/// Parallel hourly arrays for one forecast point
///
/// `times` is strictly increasing and every array has the same length.
/// Individual values may be null upstream; that only matters if the sample
/// is actually needed.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSeries {
    /// Sample instants in UTC
    pub times: Vec<DateTime<Utc>>,
    /// Sample times exactly as the API reported them (local time)
    pub labels: Vec<String>,
    /// Wind speed in m/s
    pub speed: Vec<Option<f64>>,
    /// Meteorological "from" bearing in degrees
    pub direction_from: Vec<Option<f64>>,
    /// Wave height in meters (marine endpoint only)
    pub wave_height: Option<Vec<Option<f64>>>,
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Speed and "from" bearing at index `k`
    pub fn wind_at(&self, k: usize) -> Result<(f64, f64), ForecastError> {
        let speed = self.speed.get(k).copied().flatten();
        let direction = self.direction_from.get(k).copied().flatten();
        match (speed, direction) {
            (Some(s), Some(d)) => Ok((s, d)),
            _ => Err(ForecastError::Malformed(format!(
                "missing wind sample at index {}",
                k
            ))),
        }
    }

    /// Wave height at index `k`, if reported
    pub fn wave_at(&self, k: usize) -> Option<f64> {
        self.wave_height.as_ref()?.get(k).copied().flatten()
    }
}

/// Resolved wind for one site in one cycle
///
/// Built once per cycle and replaced wholesale by the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteWindResult {
    /// The site this result belongs to
    pub site: Site,
    /// Wind speed in m/s
    pub speed_mps: f64,
    /// Bearing the wind blows from, degrees true
    pub direction_from: f64,
    /// Bearing the wind blows toward
    pub direction_to: f64,
    /// `direction_to` after the renderer calibration offset
    pub render_rotation: f64,
    /// Upstream time label of the sample
    pub time: String,
    /// Wave height in meters, if available
    pub wave_height: Option<f64>,
    /// Number of spatial samples averaged into this result
    pub samples: usize,
}

impl SiteWindResult {
    /// Wind speed in knots
    pub fn speed_kt(&self) -> f64 {
        mps_to_knots(self.speed_mps)
    }

    /// Display label, e.g. "19.4 kt"
    pub fn label(&self) -> String {
        speed_label(self.speed_mps)
    }
}

/// Formats a speed in m/s as knots with one decimal
pub fn speed_label(speed_mps: f64) -> String {
    format!("{:.1} kt", mps_to_knots(speed_mps))
}
