//! End-to-end tests of the resolution pipeline against a scripted forecast source

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use windfield::data::ForecastSeries;
use windfield::output::{render, OutputFormat};
use windfield::{
    ForecastError, ForecastSource, InterpolationMode, OffsetPattern, ResolverConfig, Site,
    WindFieldResolver,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap()
}

/// Serves one series per site, keyed by the integer part of the latitude
struct ScriptedSource;

#[async_trait]
impl ForecastSource for ScriptedSource {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<ForecastSeries, ForecastError> {
        let times = vec![t0(), t0() + Duration::hours(1)];
        let labels = vec!["2025-03-01T11:00".to_string(), "2025-03-01T12:00".to_string()];
        match lat.round() as i64 {
            // Steady easterly strengthening from 4 to 8 m/s
            2 => Ok(ForecastSeries {
                times,
                labels,
                speed: vec![Some(4.0), Some(8.0)],
                direction_from: vec![Some(90.0), Some(90.0)],
                wave_height: Some(vec![Some(0.6), Some(1.0)]),
            }),
            // Only the center point answers; the offsets see an outage
            20 if lon == 30.0 && (lat - 20.0).abs() < 1e-9 => Ok(ForecastSeries {
                times,
                labels,
                speed: vec![Some(5.0), Some(5.0)],
                direction_from: vec![Some(0.0), Some(0.0)],
                wave_height: None,
            }),
            20 => Err(ForecastError::Upstream { status: 502 }),
            // Upstream returned nulls for every hour
            40 => Ok(ForecastSeries {
                times,
                labels,
                speed: vec![None, None],
                direction_from: vec![None, None],
                wave_height: None,
            }),
            _ => Err(ForecastError::Malformed("no data".to_string())),
        }
    }
}

fn config() -> ResolverConfig {
    ResolverConfig {
        sites: vec![
            Site::new("NIY", 2.0, 72.9),
            Site::new("Patchy", 20.0, 30.0),
            Site::new("Nulls", 40.0, 10.0),
        ],
        render_offset_deg: -90.0,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_resolves_surviving_sites_in_order() {
    let config = config();
    let resolver = WindFieldResolver::new(Arc::new(ScriptedSource), &config);

    let report = resolver
        .resolve_report_at(&config.sites, t0() + Duration::seconds(1800))
        .await;

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.failures.len(), 1);

    let niy = &report.results[0];
    assert_eq!(niy.site.name, "NIY");
    assert_eq!(niy.samples, 5);
    assert!((niy.speed_mps - 6.0).abs() < 1e-9);
    assert!((niy.direction_from - 90.0).abs() < 1e-9);
    assert!((niy.direction_to - 270.0).abs() < 1e-9);
    assert!((niy.render_rotation - 180.0).abs() < 1e-9);
    assert!((niy.wave_height.unwrap() - 0.8).abs() < 1e-9);
    assert_eq!(niy.label(), "11.7 kt");

    let patchy = &report.results[1];
    assert_eq!(patchy.site.name, "Patchy");
    assert_eq!(patchy.samples, 1);
    assert!((patchy.speed_mps - 5.0).abs() < 1e-9);
    assert!(patchy.direction_from < 1e-9 || patchy.direction_from > 360.0 - 1e-9);
}

#[tokio::test]
async fn test_nearest_hour_mode() {
    let config = ResolverConfig {
        interpolation: InterpolationMode::NearestHour,
        pattern: OffsetPattern::Center,
        ..config()
    };
    let resolver = WindFieldResolver::new(Arc::new(ScriptedSource), &config);

    let results = resolver
        .resolve_all_at(&config.sites[..1], t0() + Duration::minutes(40))
        .await;

    assert_eq!(results.len(), 1);
    assert!((results[0].speed_mps - 8.0).abs() < 1e-9);
    assert_eq!(results[0].time, "2025-03-01T12:00");
    assert_eq!(results[0].samples, 1);
}

#[tokio::test]
async fn test_geojson_for_resolved_sites() {
    let config = config();
    let resolver = WindFieldResolver::new(Arc::new(ScriptedSource), &config);
    let results = resolver.resolve_all_at(&config.sites, t0()).await;

    let json = render(&results, OutputFormat::Geojson).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let names: Vec<_> = value["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["properties"]["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["NIY", "Patchy"]);
}

#[tokio::test]
async fn test_no_sites_is_empty_not_error() {
    let config = ResolverConfig {
        sites: Vec::new(),
        ..Default::default()
    };
    let resolver = WindFieldResolver::new(Arc::new(ScriptedSource), &config);
    let results = resolver
        .resolve_all_within(&config.sites, std::time::Duration::from_secs(1))
        .await;
    assert!(results.is_empty());
}
