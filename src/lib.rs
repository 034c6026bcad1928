//! windfield library
//!
//! Resolves a rendering-ready wind vector for map sites from hourly
//! Open-Meteo forecasts: fetch, interpolate in time, average in space, and
//! convert between bearing conventions.

pub mod cli;
pub mod config;
pub mod data;
pub mod output;
pub mod refresh;
pub mod resolver;
pub mod wind;

pub use config::{ConfigError, ResolverConfig};
pub use data::{ForecastClient, ForecastError, ForecastFlavor, ForecastSource, Site, SiteWindResult};
pub use resolver::{CycleReport, WindFieldResolver};
pub use wind::{InterpolationMode, OffsetPattern, ResolveError};
