//! Bearing conventions and wind vector arithmetic
//!
//! Upstream forecasts report the meteorological "from" bearing, while map
//! arrows point where the wind is going. All arithmetic on directions goes
//! through (u, v) components so wrap-around at 0/360 never corrupts a result.
//!
//! Axis convention: 0° = north, 90° = east, `u` = east component,
//! `v` = north component.

use serde::{Deserialize, Serialize};

/// Wind as Cartesian components in m/s
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindVector {
    /// East component
    pub u: f64,
    /// North component
    pub v: f64,
}

/// Speed and both bearings recovered from a [`WindVector`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedDirection {
    /// Speed in m/s
    pub speed: f64,
    /// Bearing the wind blows toward
    pub direction_to: f64,
    /// Bearing the wind blows from
    pub direction_from: f64,
}

impl WindVector {
    pub fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }

    /// Magnitude of the vector
    pub fn speed(&self) -> f64 {
        self.u.hypot(self.v)
    }

    /// Linear blend between `self` (w = 0) and `other` (w = 1)
    pub fn lerp(&self, other: &WindVector, w: f64) -> WindVector {
        WindVector {
            u: self.u + (other.u - self.u) * w,
            v: self.v + (other.v - self.v) * w,
        }
    }

    /// Component-wise arithmetic mean, `None` for an empty slice
    pub fn mean(vectors: &[WindVector]) -> Option<WindVector> {
        if vectors.is_empty() {
            return None;
        }
        let n = vectors.len() as f64;
        let (su, sv) = vectors
            .iter()
            .fold((0.0, 0.0), |(su, sv), w| (su + w.u, sv + w.v));
        Some(WindVector::new(su / n, sv / n))
    }
}

/// Wraps any angle into `[0, 360)`
pub fn normalize_bearing(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Flips a bearing by 180°
pub fn opposite_bearing(deg: f64) -> f64 {
    normalize_bearing(deg + 180.0)
}

/// Converts a speed and meteorological "from" bearing into components
///
/// The bearing is flipped to "to" first, so the vector points downwind.
pub fn from_to_vector(speed_mps: f64, direction_from_deg: f64) -> WindVector {
    let to = opposite_bearing(direction_from_deg).to_radians();
    WindVector {
        u: speed_mps * to.sin(),
        v: speed_mps * to.cos(),
    }
}

/// Inverse of [`from_to_vector`]
///
/// A zero vector has no defined heading; it reports `direction_to = 0`.
pub fn vector_to_speed_direction(vector: WindVector) -> SpeedDirection {
    let speed = vector.speed();
    let direction_to = normalize_bearing(vector.u.atan2(vector.v).to_degrees() + 360.0);
    SpeedDirection {
        speed,
        direction_to,
        direction_from: opposite_bearing(direction_to),
    }
}

/// Applies the renderer's icon-rotation correction to a "to" bearing
///
/// Must be applied once, after all interpolation and averaging.
pub fn apply_render_calibration(direction_to: f64, offset_deg: f64) -> f64 {
    normalize_bearing(direction_to + offset_deg + 360.0)
}

/// Smallest absolute difference between two bearings, in degrees
pub fn bearing_difference(a: f64, b: f64) -> f64 {
    let d = normalize_bearing(a - b);
    d.min(360.0 - d)
}
