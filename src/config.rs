// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything that used to be a deployment-specific constant (the fallback
//! metro area, the calendar year that dates are anchored to) lives here so the
//! normalization passes can be pointed at any region and any year.

use chrono::Datelike;
use std::env;
use std::path::PathBuf;

/// Region used to complete locations that carry no postal code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultRegion {
    /// City appended when a location names no region at all (e.g. "Austin")
    pub locality: String,
    /// Region abbreviation, also used as a region indicator (e.g. "TX")
    pub region_code: String,
    /// Full region name, also used as a region indicator (e.g. "Texas")
    pub region_name: String,
    /// Postal code synthesized for incomplete locations (e.g. "78701")
    pub postal_code: String,
}

impl Default for DefaultRegion {
    fn default() -> Self {
        Self {
            locality: "Austin".to_string(),
            region_code: "TX".to_string(),
            region_name: "Texas".to_string(),
            postal_code: "78701".to_string(),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the store, renderings and recovery snapshots
    pub output_dir: PathBuf,
    /// File name of the persisted record store inside `output_dir`
    pub store_file: String,
    /// Fallback region for location completion
    pub default_region: DefaultRegion,
    /// Year that stale and yearless dates are anchored to
    pub current_year: i32,
    /// Yearless dates further than this many days in the past roll to next year
    pub rollover_days: i64,
    /// Extra marker category overlaid on the map feed (e.g. "library")
    pub overlay_category: Option<String>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            store_file: "activities.json".to_string(),
            default_region: DefaultRegion::default(),
            current_year: 2025,
            rollover_days: 180,
            overlay_category: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored. Every variable is
    /// optional; `ACTIVITY_CURRENT_YEAR` falls back to the local calendar year.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = DefaultRegion::default();
        let default_region = DefaultRegion {
            locality: env_or("ACTIVITY_DEFAULT_LOCALITY", &defaults.locality),
            region_code: env_or("ACTIVITY_DEFAULT_REGION_CODE", &defaults.region_code),
            region_name: env_or("ACTIVITY_DEFAULT_REGION_NAME", &defaults.region_name),
            postal_code: env_or("ACTIVITY_DEFAULT_POSTAL_CODE", &defaults.postal_code),
        };

        let current_year = match env::var("ACTIVITY_CURRENT_YEAR") {
            Ok(v) if !v.trim().is_empty() => v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("ACTIVITY_CURRENT_YEAR", v))?,
            _ => crate::time_utils::today_local().year(),
        };

        let rollover_days = match env::var("ACTIVITY_ROLLOVER_DAYS") {
            Ok(v) if !v.trim().is_empty() => v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("ACTIVITY_ROLLOVER_DAYS", v))?,
            _ => 180,
        };

        let overlay_category = env::var("ACTIVITY_OVERLAY_CATEGORY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let config = Self {
            output_dir: PathBuf::from(env_or("ACTIVITY_OUTPUT_DIR", "output")),
            store_file: env_or("ACTIVITY_STORE_FILE", "activities.json"),
            default_region,
            current_year,
            rollover_days,
            overlay_category,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the location and date passes cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let postal = &self.default_region.postal_code;
        let postal_ok = postal.len() == 5 && postal.chars().all(|c| c.is_ascii_digit());
        if !postal_ok {
            return Err(ConfigError::Invalid(
                "ACTIVITY_DEFAULT_POSTAL_CODE",
                postal.clone(),
            ));
        }
        if self.default_region.region_code.trim().is_empty() {
            return Err(ConfigError::Missing("ACTIVITY_DEFAULT_REGION_CODE"));
        }
        if !(1000..=9999).contains(&self.current_year) {
            return Err(ConfigError::Invalid(
                "ACTIVITY_CURRENT_YEAR",
                self.current_year.to_string(),
            ));
        }
        if self.rollover_days < 0 {
            return Err(ConfigError::Invalid(
                "ACTIVITY_ROLLOVER_DAYS",
                self.rollover_days.to_string(),
            ));
        }
        Ok(())
    }

    /// Path of the persisted record store.
    pub fn store_path(&self) -> PathBuf {
        self.output_dir.join(&self.store_file)
    }
}

fn env_or(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration value: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store_path(), PathBuf::from("output/activities.json"));
    }

    #[test]
    fn test_validate_rejects_bad_postal_code() {
        let mut config = Config::default();
        config.default_region.postal_code = "787".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid("ACTIVITY_DEFAULT_POSTAL_CODE", _))
        ));
    }

    #[test]
    fn test_validate_rejects_negative_rollover() {
        let config = Config {
            rollover_days: -1,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("ACTIVITY_DEFAULT_LOCALITY", "Portland");
        env::set_var("ACTIVITY_DEFAULT_REGION_CODE", "OR");
        env::set_var("ACTIVITY_DEFAULT_REGION_NAME", "Oregon");
        env::set_var("ACTIVITY_DEFAULT_POSTAL_CODE", "97201");
        env::set_var("ACTIVITY_CURRENT_YEAR", "2026");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.default_region.locality, "Portland");
        assert_eq!(config.default_region.region_code, "OR");
        assert_eq!(config.default_region.postal_code, "97201");
        assert_eq!(config.current_year, 2026);
        assert_eq!(config.rollover_days, 180);
    }
}
