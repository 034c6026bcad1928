//! Resolver configuration
//!
//! All tunables of a resolution run live in [`ResolverConfig`], which is
//! passed explicitly to the resolver and the refresh scheduler. It is read
//! from a JSON file, with every field optional.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{default_sites, ForecastFlavor, Site};
use crate::wind::{InterpolationMode, OffsetPattern};

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for this schema
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// Values are out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for one resolver instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Sites to resolve each cycle
    pub sites: Vec<Site>,
    /// Atmospheric or marine endpoint
    pub flavor: ForecastFlavor,
    /// Endpoint override; the flavor's default when absent
    pub base_url: Option<String>,
    /// Timezone passed upstream
    pub timezone: String,
    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: u64,
    /// Sampling cluster shape
    pub pattern: OffsetPattern,
    /// Distance of offset points from the site, in degrees
    pub delta_deg: f64,
    /// Time selection strategy
    pub interpolation: InterpolationMode,
    /// Renderer icon-rotation correction in degrees, e.g. -90
    pub render_offset_deg: f64,
    /// Sites resolved concurrently
    pub max_concurrent_sites: usize,
    /// Minutes between scheduled cycles
    pub refresh_minutes: u64,
    /// Upper bound on one full cycle, in seconds
    pub run_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            sites: default_sites(),
            flavor: ForecastFlavor::Atmospheric,
            base_url: None,
            timezone: "auto".to_string(),
            request_timeout_secs: 15,
            pattern: OffsetPattern::Plus,
            delta_deg: 0.1,
            interpolation: InterpolationMode::Linear,
            render_offset_deg: 0.0,
            max_concurrent_sites: 4,
            refresh_minutes: 10,
            run_timeout_secs: 60,
        }
    }
}

impl ResolverConfig {
    /// Returns the default config file location
    ///
    /// Uses `~/.config/windfield/config.json` on Linux, or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "windfield")?;
        Some(project_dirs.config_dir().join("config.json"))
    }

    /// Reads a config file
    ///
    /// Values are not range-checked here; call [`validate`](Self::validate)
    /// once command-line overrides have been applied.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Loads from `path`, else the default location if it exists, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(default) if default.exists() => Self::from_file(&default),
            _ => Ok(Self::default()),
        }
    }

    /// Checks ranges and site uniqueness
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = std::collections::HashSet::new();
        for site in &self.sites {
            if site.name.trim().is_empty() {
                return Err(ConfigError::Invalid("site name must not be empty".to_string()));
            }
            if !names.insert(site.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate site: {}", site.name)));
            }
            if !(-90.0..=90.0).contains(&site.lat) {
                return Err(ConfigError::Invalid(format!(
                    "site {} latitude {} out of range",
                    site.name, site.lat
                )));
            }
            if !(-180.0..=180.0).contains(&site.lon) {
                return Err(ConfigError::Invalid(format!(
                    "site {} longitude {} out of range",
                    site.name, site.lon
                )));
            }
        }
        if !(self.delta_deg > 0.0 && self.delta_deg <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "delta_deg must be in (0, 1], got {}",
                self.delta_deg
            )));
        }
        if !self.render_offset_deg.is_finite() {
            return Err(ConfigError::Invalid("render_offset_deg must be finite".to_string()));
        }
        if self.max_concurrent_sites == 0 {
            return Err(ConfigError::Invalid("max_concurrent_sites must be at least 1".to_string()));
        }
        if self.refresh_minutes == 0 {
            return Err(ConfigError::Invalid("refresh_minutes must be at least 1".to_string()));
        }
        if self.request_timeout_secs == 0 || self.run_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be at least 1 second".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_minutes * 60)
    }
}
