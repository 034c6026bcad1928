//! Rendering of resolved records for downstream consumers
//!
//! The map layer consumes a GeoJSON FeatureCollection with one point per
//! site; plain JSON and a short text summary are offered for scripts and
//! terminals.

use clap::ValueEnum;
use serde::Serialize;

use crate::data::SiteWindResult;

/// Output encodings supported by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// GeoJSON FeatureCollection for map sources
    #[default]
    Geojson,
    /// Array of resolved records
    Json,
    /// One human-readable line per site
    Text,
}

#[derive(Debug, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    kind: &'static str,
    pub features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    pub geometry: Geometry,
    pub properties: FeatureProperties,
}

#[derive(Debug, Serialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    kind: &'static str,
    /// `[lon, lat]`
    pub coordinates: [f64; 2],
}

/// Properties the map layer styles against
#[derive(Debug, Serialize)]
pub struct FeatureProperties {
    pub name: String,
    pub wind_from: f64,
    pub wind_to: f64,
    pub wind_rotation: f64,
    pub wind_speed_mps: f64,
    pub wind_speed_kt: f64,
    pub label: String,
    pub time: String,
    pub samples: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wave_height: Option<f64>,
}

impl From<&SiteWindResult> for Feature {
    fn from(result: &SiteWindResult) -> Self {
        Feature {
            kind: "Feature",
            geometry: Geometry {
                kind: "Point",
                coordinates: [result.site.lon, result.site.lat],
            },
            properties: FeatureProperties {
                name: result.site.name.clone(),
                wind_from: result.direction_from,
                wind_to: result.direction_to,
                wind_rotation: result.render_rotation,
                wind_speed_mps: result.speed_mps,
                wind_speed_kt: result.speed_kt(),
                label: result.label(),
                time: result.time.clone(),
                samples: result.samples,
                wave_height: result.wave_height,
            },
        }
    }
}

/// Builds the map source payload
pub fn feature_collection(results: &[SiteWindResult]) -> FeatureCollection {
    FeatureCollection {
        kind: "FeatureCollection",
        features: results.iter().map(Feature::from).collect(),
    }
}

/// Popup-style line, e.g. "NIY: 12.3 kt from 245° true (2024-07-15 14:00)"
pub fn summary_line(result: &SiteWindResult) -> String {
    let mut line = format!(
        "{}: {:.1} kt from {:.0}° true ({})",
        result.site.name,
        result.speed_kt(),
        result.direction_from,
        result.time.replace('T', " ")
    );
    if let Some(waves) = result.wave_height {
        line.push_str(&format!(", waves {:.1} m", waves));
    }
    line
}

/// Renders `results` in the requested format
pub fn render(results: &[SiteWindResult], format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Geojson => serde_json::to_string_pretty(&feature_collection(results)),
        OutputFormat::Json => serde_json::to_string_pretty(results),
        OutputFormat::Text => Ok(results
            .iter()
            .map(summary_line)
            .collect::<Vec<_>>()
            .join("\n")),
    }
}
