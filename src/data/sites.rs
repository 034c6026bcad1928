//! Built-in site list
//!
//! Used when neither the config file nor the command line names any sites.

use super::Site;

/// Sites resolved by default: (name, latitude, longitude)
pub static DEFAULT_SITES: [(&str, f64, f64); 1] = [("NIY", 2.686273100482876, 72.93960976474132)];

/// Returns the default site list as owned values
pub fn default_sites() -> Vec<Site> {
    DEFAULT_SITES
        .iter()
        .map(|(name, lat, lon)| Site::new(*name, *lat, *lon))
        .collect()
}
