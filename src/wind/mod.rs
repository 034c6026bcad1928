//! Wind resolution: bearing arithmetic, time interpolation and spatial sampling

pub mod convention;
pub mod interpolate;
pub mod sampler;

pub use convention::{
    apply_render_calibration, from_to_vector, vector_to_speed_direction, SpeedDirection,
    WindVector,
};
pub use interpolate::{bracket, BracketedSample, InterpolationMode};
pub use sampler::{OffsetPattern, ResolveError, SpatialSampler};
