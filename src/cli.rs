//! Command-line interface parsing for windfield
//!
//! This module handles parsing of CLI arguments using clap, and layers the
//! flags on top of the file-based [`ResolverConfig`].

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::config::ResolverConfig;
use crate::data::{ForecastFlavor, Site};
use crate::output::OutputFormat;
use crate::wind::{InterpolationMode, OffsetPattern};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// A --site value is not NAME,LAT,LON
    #[error("Invalid site: '{0}'. Expected NAME,LAT,LON, e.g. NIY,2.686,72.940")]
    InvalidSite(String),
}

/// Sampling cluster shape as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PatternArg {
    Center,
    Plus,
}

impl From<PatternArg> for OffsetPattern {
    fn from(arg: PatternArg) -> Self {
        match arg {
            PatternArg::Center => OffsetPattern::Center,
            PatternArg::Plus => OffsetPattern::Plus,
        }
    }
}

/// windfield - Resolve current wind for map sites
#[derive(Parser, Debug)]
#[command(name = "windfield")]
#[command(about = "Resolve current wind speed and direction for map sites")]
#[command(version)]
pub struct Cli {
    /// Path to a JSON config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Site to resolve, replacing configured sites (repeatable)
    ///
    /// Example: --site NIY,2.686,72.940
    #[arg(long = "site", value_name = "NAME,LAT,LON")]
    pub sites: Vec<String>,

    /// Use the marine endpoint, which adds wave height
    #[arg(long)]
    pub marine: bool,

    /// Pick the nearest hourly sample instead of interpolating
    #[arg(long)]
    pub nearest_hour: bool,

    /// Sampling cluster around each site
    #[arg(long, value_enum, value_name = "PATTERN")]
    pub pattern: Option<PatternArg>,

    /// Offset of the sampling points from the site, in degrees
    #[arg(long, value_name = "DEG")]
    pub delta: Option<f64>,

    /// Icon rotation correction applied to the "to" bearing, in degrees
    #[arg(long, value_name = "DEG", allow_hyphen_values = true)]
    pub render_offset: Option<f64>,

    /// Output encoding
    #[arg(long, value_enum, default_value_t = OutputFormat::Geojson)]
    pub format: OutputFormat,

    /// Keep running and re-resolve on an interval
    #[arg(long)]
    pub watch: bool,

    /// Minutes between refreshes in --watch mode
    #[arg(long, value_name = "MINUTES")]
    pub interval: Option<u64>,

    /// Log debug output to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parses a NAME,LAT,LON argument into a Site.
///
/// # Returns
/// * `Ok(Site)` if all three parts are present and the coordinates are numbers
/// * `Err(CliError::InvalidSite)` otherwise
pub fn parse_site_arg(s: &str) -> Result<Site, CliError> {
    let invalid = || CliError::InvalidSite(s.to_string());
    let mut parts = s.split(',').map(str::trim);
    let (Some(name), Some(lat), Some(lon), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    if name.is_empty() {
        return Err(invalid());
    }
    let lat: f64 = lat.parse().map_err(|_| invalid())?;
    let lon: f64 = lon.parse().map_err(|_| invalid())?;
    Ok(Site::new(name, lat, lon))
}

/// Builds the log filter from a RUST_LOG value and the `--verbose` flag.
///
/// Without RUST_LOG the crate logs at info. `--verbose` always adds a
/// `windfield=debug` directive on top of whatever RUST_LOG says.
pub fn log_filter(env: Option<&str>, verbose: bool) -> EnvFilter {
    let filter = match env {
        Some(directives) if !directives.trim().is_empty() => {
            EnvFilter::builder().parse_lossy(directives)
        }
        _ => EnvFilter::new("windfield=info"),
    };
    if !verbose {
        return filter;
    }
    match "windfield=debug".parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

impl Cli {
    /// Applies command-line overrides onto a loaded config.
    ///
    /// Only flags that were given change the config.
    pub fn apply_to(&self, config: &mut ResolverConfig) -> Result<(), CliError> {
        if !self.sites.is_empty() {
            config.sites = self
                .sites
                .iter()
                .map(|s| parse_site_arg(s))
                .collect::<Result<_, _>>()?;
        }
        if self.marine {
            config.flavor = ForecastFlavor::Marine;
        }
        if self.nearest_hour {
            config.interpolation = InterpolationMode::NearestHour;
        }
        if let Some(pattern) = self.pattern {
            config.pattern = pattern.into();
        }
        if let Some(delta) = self.delta {
            config.delta_deg = delta;
        }
        if let Some(offset) = self.render_offset {
            config.render_offset_deg = offset;
        }
        if let Some(minutes) = self.interval {
            config.refresh_minutes = minutes;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_parse_site_arg() {
        let site = parse_site_arg("NIY,2.686,72.940").unwrap();
        assert_eq!(site, Site::new("NIY", 2.686, 72.940));

        let site = parse_site_arg(" Harbour , -33.5 , 151.2 ").unwrap();
        assert_eq!(site.name, "Harbour");
        assert_eq!(site.lat, -33.5);
    }

    #[test]
    fn test_parse_site_arg_invalid() {
        for bad in ["NIY", "NIY,2.6", "NIY,abc,72.9", ",1,2", "A,1,2,3"] {
            let result = parse_site_arg(bad);
            assert!(result.is_err(), "{} should be rejected", bad);
        }
        let err = parse_site_arg("oops").unwrap_err();
        assert!(err.to_string().contains("Invalid site"));
        assert!(err.to_string().contains("oops"));
    }

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["windfield"]);
        assert!(cli.sites.is_empty());
        assert!(!cli.watch);
        assert_eq!(cli.format, OutputFormat::Geojson);
    }

    #[test]
    fn test_no_flags_leave_config_untouched() {
        let cli = Cli::parse_from(["windfield"]);
        let mut config = ResolverConfig::default();
        cli.apply_to(&mut config).unwrap();
        assert_eq!(config, ResolverConfig::default());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "windfield",
            "--site",
            "A,1,2",
            "--site",
            "B,3,4",
            "--marine",
            "--nearest-hour",
            "--pattern",
            "center",
            "--delta",
            "0.25",
            "--render-offset",
            "-90",
            "--interval",
            "5",
        ]);
        let mut config = ResolverConfig::default();
        cli.apply_to(&mut config).unwrap();

        assert_eq!(config.sites, vec![Site::new("A", 1.0, 2.0), Site::new("B", 3.0, 4.0)]);
        assert_eq!(config.flavor, ForecastFlavor::Marine);
        assert_eq!(config.interpolation, InterpolationMode::NearestHour);
        assert_eq!(config.pattern, OffsetPattern::Center);
        assert_eq!(config.delta_deg, 0.25);
        assert_eq!(config.render_offset_deg, -90.0);
        assert_eq!(config.refresh_minutes, 5);
    }

    #[test]
    fn test_log_filter_defaults_to_info() {
        let filter = log_filter(None, false);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_verbose_raises_level_even_with_rust_log() {
        assert_eq!(log_filter(None, true).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(
            log_filter(Some("warn"), true).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            log_filter(Some("warn"), false).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }

    #[test]
    fn test_invalid_site_flag_fails_apply() {
        let cli = Cli::parse_from(["windfield", "--site", "nowhere"]);
        let mut config = ResolverConfig::default();
        assert!(cli.apply_to(&mut config).is_err());
    }
}
