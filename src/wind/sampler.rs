//! Spatial averaging around a site
//!
//! Forecast models snap coordinates to grid cells, so a single point can
//! land on an unrepresentative cell. The sampler queries a small cluster of
//! points around the site and averages their wind vectors.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::convention::{apply_render_calibration, vector_to_speed_direction, WindVector};
use super::interpolate::{resolve_at, InterpolatedWind, InterpolationMode};
use crate::data::{ForecastError, ForecastSource, Site, SiteWindResult};

/// Errors from resolving a single site
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Every offset point failed to fetch or interpolate
    #[error("No usable samples for site {site} ({attempted} attempted)")]
    NoSamples { site: String, attempted: usize },

    /// The run deadline passed before the site finished
    #[error("Site {site} not resolved within {limit:?}")]
    TimedOut { site: String, limit: Duration },
}

/// Shape of the sampling cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetPattern {
    /// The site center only
    Center,
    /// Center plus one point north, south, east and west
    #[default]
    Plus,
}

impl OffsetPattern {
    /// Sampling coordinates as (lat, lon) for a site, center first
    ///
    /// Offsets that clamp onto an earlier point (at the poles) are dropped so
    /// no coordinate is weighted twice.
    pub fn points(&self, site: &Site, delta_deg: f64) -> Vec<(f64, f64)> {
        let center = (site.lat, site.lon);
        match self {
            OffsetPattern::Center => vec![center],
            OffsetPattern::Plus => {
                let candidates = [
                    center,
                    (clamp_lat(site.lat + delta_deg), site.lon),
                    (clamp_lat(site.lat - delta_deg), site.lon),
                    (site.lat, wrap_lon(site.lon + delta_deg)),
                    (site.lat, wrap_lon(site.lon - delta_deg)),
                ];
                let mut points = Vec::with_capacity(candidates.len());
                for point in candidates {
                    if !points.contains(&point) {
                        points.push(point);
                    }
                }
                points
            }
        }
    }
}

fn clamp_lat(lat: f64) -> f64 {
    lat.clamp(-90.0, 90.0)
}

fn wrap_lon(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Resolves one site by averaging a cluster of forecast points
pub struct SpatialSampler<S> {
    source: Arc<S>,
    pattern: OffsetPattern,
    delta_deg: f64,
    mode: InterpolationMode,
    render_offset_deg: f64,
}

impl<S: ForecastSource> SpatialSampler<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            pattern: OffsetPattern::default(),
            delta_deg: 0.1,
            mode: InterpolationMode::default(),
            render_offset_deg: 0.0,
        }
    }

    pub fn with_pattern(mut self, pattern: OffsetPattern, delta_deg: f64) -> Self {
        self.pattern = pattern;
        self.delta_deg = delta_deg;
        self
    }

    pub fn with_mode(mut self, mode: InterpolationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_render_offset(mut self, offset_deg: f64) -> Self {
        self.render_offset_deg = offset_deg;
        self
    }

    /// Fetch and interpolate one point
    async fn sample_point(
        &self,
        lat: f64,
        lon: f64,
        now: DateTime<Utc>,
    ) -> Result<InterpolatedWind, ForecastError> {
        let series = self.source.fetch(lat, lon).await?;
        resolve_at(&series, now, self.mode)
    }

    /// Resolves `site` at `now`
    ///
    /// Failed points are logged and skipped; only a site where every point
    /// failed is an error.
    pub async fn resolve_site(
        &self,
        site: &Site,
        now: DateTime<Utc>,
    ) -> Result<SiteWindResult, ResolveError> {
        let points = self.pattern.points(site, self.delta_deg);
        let attempted = points.len();

        let results = join_all(
            points
                .iter()
                .map(|&(lat, lon)| self.sample_point(lat, lon, now)),
        )
        .await;

        let mut samples = Vec::with_capacity(attempted);
        for ((lat, lon), result) in points.iter().zip(results) {
            match result {
                Ok(sample) => samples.push(sample),
                Err(error) => {
                    warn!(site = %site.name, lat, lon, %error, "dropping sample point");
                }
            }
        }

        let vectors: Vec<WindVector> = samples.iter().map(|s| s.vector).collect();
        let Some(mean) = WindVector::mean(&vectors) else {
            return Err(ResolveError::NoSamples {
                site: site.name.clone(),
                attempted,
            });
        };
        let resolved = vector_to_speed_direction(mean);

        let waves: Vec<f64> = samples.iter().filter_map(|s| s.wave_height).collect();
        let wave_height = if waves.is_empty() {
            None
        } else {
            Some(waves.iter().sum::<f64>() / waves.len() as f64)
        };

        debug!(
            site = %site.name,
            used = samples.len(),
            attempted,
            speed = resolved.speed,
            from = resolved.direction_from,
            "resolved site"
        );

        Ok(SiteWindResult {
            site: site.clone(),
            speed_mps: resolved.speed,
            direction_from: resolved.direction_from,
            direction_to: resolved.direction_to,
            render_rotation: apply_render_calibration(resolved.direction_to, self.render_offset_deg),
            time: samples[0].time_label.clone(),
            wave_height,
            samples: samples.len(),
        })
    }
}
