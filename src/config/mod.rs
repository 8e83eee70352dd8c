//! Configuration module for the fare aggregator
//!
//! Handles loading and validating settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Load settings from the first file found, or use defaults.
///
/// `FARE_SETTINGS_PATH` takes precedence over the default locations.
/// Environment overrides are applied in every case. Install the tracing
/// subscriber first: validation warnings are only logged here.
pub fn load() -> Result<Settings> {
    let mut candidates = Vec::new();
    if let Ok(path) = std::env::var("FARE_SETTINGS_PATH") {
        candidates.push(PathBuf::from(path));
    }
    candidates.extend([
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
        PathBuf::from("/etc/fare-aggregator/settings.yml"),
    ]);
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("fare-aggregator/settings.yml"));
    }

    let mut settings = match candidates.iter().find(|p| p.exists()) {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            Settings::from_file(path)?
        }
        None => {
            info!("No settings file found, using defaults");
            Settings::default()
        }
    };

    settings.merge_env();
    settings.validate()?;
    Ok(settings)
}
