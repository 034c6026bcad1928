//! Time selection within an hourly forecast series
//!
//! Two strategies exist: a linear blend between the bracketing hours, done
//! in vector space, and a degraded nearest-hour pick. A resolution path uses
//! exactly one of them, chosen by [`InterpolationMode`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::convention::{from_to_vector, vector_to_speed_direction, WindVector};
use crate::data::{ForecastError, ForecastSeries};

/// How the target instant is resolved against the hourly samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    /// Blend the two bracketing samples by their fractional distance
    #[default]
    Linear,
    /// Take the single sample closest in time
    NearestHour,
}

/// Two series indices straddling the target instant plus the blend weight
///
/// `weight == 0` selects `k1` exactly, `weight == 1` selects `k2` exactly.
/// Outside the series range, and for single-sample series, `k1 == k2` and
/// `weight == 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BracketedSample {
    pub k1: usize,
    pub k2: usize,
    pub weight: f64,
}

impl BracketedSample {
    fn exact(k: usize) -> Self {
        Self {
            k1: k,
            k2: k,
            weight: 0.0,
        }
    }
}

/// A single resolved sample from one series
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedWind {
    /// Wind as components, ready for spatial averaging
    pub vector: WindVector,
    /// Speed in m/s
    pub speed: f64,
    /// Meteorological "from" bearing in degrees
    pub direction_from: f64,
    /// Upstream time label of the sample the result is anchored to
    pub time_label: String,
    /// Wave height in meters, when the series carries one
    pub wave_height: Option<f64>,
}

/// Finds the tightest pair of samples with `times[k1] <= now <= times[k2]`
///
/// Returns `None` only for an empty slice.
pub fn bracket(times: &[DateTime<Utc>], now: DateTime<Utc>) -> Option<BracketedSample> {
    let last = times.len().checked_sub(1)?;
    if now < times[0] {
        return Some(BracketedSample::exact(0));
    }

    let mut k1 = 0;
    while k1 < last && times[k1 + 1] <= now {
        k1 += 1;
    }
    if k1 == last {
        return Some(BracketedSample::exact(last));
    }

    let k2 = k1 + 1;
    let span = seconds_between(times[k1], times[k2]).max(1.0);
    let weight = (seconds_between(times[k1], now) / span).clamp(0.0, 1.0);
    Some(BracketedSample { k1, k2, weight })
}

/// Index of the sample closest in time to `now`; ties go to the earlier one
pub fn nearest_index(times: &[DateTime<Utc>], now: DateTime<Utc>) -> Option<usize> {
    times
        .iter()
        .enumerate()
        .min_by_key(|(_, t)| (**t - now).num_milliseconds().unsigned_abs())
        .map(|(i, _)| i)
}

/// Blends the bracket endpoints in (u, v) space and converts back
pub fn interpolate(
    series: &ForecastSeries,
    bracket: &BracketedSample,
) -> Result<InterpolatedWind, ForecastError> {
    let (s1, d1) = series.wind_at(bracket.k1)?;
    let (s2, d2) = series.wind_at(bracket.k2)?;

    let vector = from_to_vector(s1, d1).lerp(&from_to_vector(s2, d2), bracket.weight);
    let resolved = vector_to_speed_direction(vector);

    let wave_height = match (series.wave_at(bracket.k1), series.wave_at(bracket.k2)) {
        (Some(h1), Some(h2)) => Some(h1 + (h2 - h1) * bracket.weight),
        _ => None,
    };

    // Label with whichever endpoint the blend leans toward
    let anchor = if bracket.weight > 0.5 {
        bracket.k2
    } else {
        bracket.k1
    };

    let time_label = series
        .labels
        .get(anchor)
        .cloned()
        .ok_or_else(|| ForecastError::Malformed(format!("missing time label at index {}", anchor)))?;

    Ok(InterpolatedWind {
        vector,
        speed: resolved.speed,
        direction_from: resolved.direction_from,
        time_label,
        wave_height,
    })
}

/// Resolves `series` at `now` with the chosen strategy
pub fn resolve_at(
    series: &ForecastSeries,
    now: DateTime<Utc>,
    mode: InterpolationMode,
) -> Result<InterpolatedWind, ForecastError> {
    match mode {
        InterpolationMode::Linear => {
            let b = bracket(&series.times, now)
                .ok_or_else(|| ForecastError::Malformed("empty hourly series".to_string()))?;
            interpolate(series, &b)
        }
        InterpolationMode::NearestHour => {
            let k = nearest_index(&series.times, now)
                .ok_or_else(|| ForecastError::Malformed("empty hourly series".to_string()))?;
            interpolate(series, &BracketedSample::exact(k))
        }
    }
}

fn seconds_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    (b - a).num_milliseconds() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap()
    }

    fn hourly(n: usize) -> Vec<DateTime<Utc>> {
        (0..n).map(|i| t0() + Duration::hours(i as i64)).collect()
    }

    fn series(speed: Vec<Option<f64>>, direction: Vec<Option<f64>>) -> ForecastSeries {
        let times = hourly(speed.len());
        let labels = times
            .iter()
            .map(|t| t.format("%Y-%m-%dT%H:%M").to_string())
            .collect();
        ForecastSeries {
            times,
            labels,
            speed,
            direction_from: direction,
            wave_height: None,
        }
    }

    #[test]
    fn test_bracket_midpoint() {
        let b = bracket(&hourly(3), t0() + Duration::seconds(1800)).unwrap();
        assert_eq!(b.k1, 0);
        assert_eq!(b.k2, 1);
        assert!((b.weight - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_bracket_exactly_on_sample() {
        let b = bracket(&hourly(3), t0() + Duration::hours(1)).unwrap();
        assert_eq!((b.k1, b.k2), (1, 2));
        assert_eq!(b.weight, 0.0);
    }

    #[test]
    fn test_bracket_before_first_clamps() {
        let b = bracket(&hourly(3), t0() - Duration::minutes(20)).unwrap();
        assert_eq!(b, BracketedSample { k1: 0, k2: 0, weight: 0.0 });
    }

    #[test]
    fn test_bracket_after_last_clamps() {
        let b = bracket(&hourly(3), t0() + Duration::hours(5)).unwrap();
        assert_eq!(b, BracketedSample { k1: 2, k2: 2, weight: 0.0 });

        let b = bracket(&hourly(3), t0() + Duration::hours(2)).unwrap();
        assert_eq!(b, BracketedSample { k1: 2, k2: 2, weight: 0.0 });
    }

    #[test]
    fn test_bracket_single_and_empty() {
        let b = bracket(&hourly(1), t0() + Duration::minutes(10)).unwrap();
        assert_eq!(b, BracketedSample { k1: 0, k2: 0, weight: 0.0 });
        assert!(bracket(&[], t0()).is_none());
    }

    #[test]
    fn test_bracket_zero_length_interval() {
        let times = vec![t0(), t0(), t0() + Duration::hours(1)];
        let b = bracket(&times, t0()).unwrap();
        assert_eq!((b.k1, b.k2), (1, 2));
        assert_eq!(b.weight, 0.0);
    }

    #[test]
    fn test_nearest_index() {
        let times = hourly(4);
        assert_eq!(nearest_index(&times, t0() + Duration::minutes(29)), Some(0));
        assert_eq!(nearest_index(&times, t0() + Duration::minutes(31)), Some(1));
        assert_eq!(nearest_index(&times, t0() + Duration::minutes(30)), Some(0));
        assert_eq!(nearest_index(&times, t0() + Duration::hours(9)), Some(3));
        assert_eq!(nearest_index(&[], t0()), None);
    }

    #[test]
    fn test_interpolate_in_vector_space() {
        let s = series(vec![Some(4.0), Some(8.0)], vec![Some(90.0), Some(90.0)]);
        let out = resolve_at(&s, t0() + Duration::seconds(1800), InterpolationMode::Linear).unwrap();
        assert!((out.speed - 6.0).abs() < 1e-9);
        assert!((out.direction_from - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolate_across_north_does_not_swing_south() {
        let s = series(vec![Some(10.0), Some(10.0)], vec![Some(350.0), Some(10.0)]);
        let out = resolve_at(&s, t0() + Duration::seconds(1800), InterpolationMode::Linear).unwrap();
        let d = out.direction_from;
        assert!(d < 1e-6 || d > 360.0 - 1e-6, "got {}", d);
    }

    #[test]
    fn test_nearest_hour_mode_uses_single_sample() {
        let s = series(vec![Some(4.0), Some(8.0)], vec![Some(90.0), Some(180.0)]);
        let out = resolve_at(&s, t0() + Duration::minutes(50), InterpolationMode::NearestHour).unwrap();
        assert!((out.speed - 8.0).abs() < 1e-9);
        assert!((out.direction_from - 180.0).abs() < 1e-9);
        assert_eq!(out.time_label, "2024-07-15T13:00");
    }

    #[test]
    fn test_null_at_needed_index_is_malformed() {
        let s = series(vec![Some(4.0), None, Some(5.0)], vec![Some(90.0), Some(90.0), Some(90.0)]);
        let err = resolve_at(&s, t0() + Duration::minutes(10), InterpolationMode::Linear).unwrap_err();
        assert!(matches!(err, ForecastError::Malformed(_)));

        // A null elsewhere in the series is irrelevant
        let ok = resolve_at(&s, t0() + Duration::hours(3), InterpolationMode::Linear);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_wave_height_interpolates_as_scalar() {
        let mut s = series(vec![Some(4.0), Some(8.0)], vec![Some(90.0), Some(90.0)]);
        s.wave_height = Some(vec![Some(1.0), Some(2.0)]);
        let out = resolve_at(&s, t0() + Duration::minutes(15), InterpolationMode::Linear).unwrap();
        assert!((out.wave_height.unwrap() - 1.25).abs() < 1e-9);
        assert_eq!(out.time_label, "2024-07-15T12:00");

        s.wave_height = Some(vec![Some(1.0), None]);
        let out = resolve_at(&s, t0() + Duration::minutes(15), InterpolationMode::Linear).unwrap();
        assert!(out.wave_height.is_none());
    }
}
