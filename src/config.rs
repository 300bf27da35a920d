// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration management.
//!
//! Persistent configuration is stored in TOML through `confy`. Every field has
//! a serde default so older files keep loading after new settings are added.
//! Command-line flags override individual fields for a single run.

use std::time::Duration;

use log::warn;
use rotation_core::{CatalogError, KioskConfig, Package, StoreConfig};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "weatherscan-kiosk";
const CONFIG_NAME: &str = "config";

/// Environment variable that takes precedence over the configured API key.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

/// Background artwork sets shipped with the kiosk.
pub const LOCALES: [&str; 4] = ["neighborhood", "oceaneast", "urban", "southwest"];

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Background artwork set (neighborhood, oceaneast, urban, southwest)
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Station name shown on the affiliate slide
    #[serde(default = "default_affiliate_name")]
    pub affiliate_name: String,

    /// Enabled packages in rotation order
    #[serde(default = "default_packages")]
    pub enabled_packages: Vec<String>,

    /// weather.com API key (optional, env var takes precedence)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Explicit location search, replaces IP geolocation
    #[serde(default)]
    pub location_query: Option<String>,

    /// Override latitude (for kiosks behind a VPN or proxy)
    #[serde(default)]
    pub override_latitude: Option<f64>,

    /// Override longitude (for kiosks behind a VPN or proxy)
    #[serde(default)]
    pub override_longitude: Option<f64>,

    /// Seconds between weather data refreshes
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Seconds between alert checks
    #[serde(default = "default_alert_poll_interval")]
    pub alert_poll_interval_secs: u64,

    /// Upper bound on a single upstream fetch, in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Background music volume (0.0 - 1.0)
    #[serde(default = "default_music_volume")]
    pub music_volume: f32,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_locale() -> String {
    "neighborhood".to_string()
}

fn default_affiliate_name() -> String {
    "Comcast Digital Cable".to_string()
}

fn default_packages() -> Vec<String> {
    vec![Package::Core.name().to_string()]
}

fn default_refresh_interval() -> u64 {
    300
}

fn default_alert_poll_interval() -> u64 {
    60
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_music_volume() -> f32 {
    0.3
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            locale: default_locale(),
            affiliate_name: default_affiliate_name(),
            enabled_packages: default_packages(),
            api_key: None,
            location_query: None,
            override_latitude: None,
            override_longitude: None,
            refresh_interval_secs: default_refresh_interval(),
            alert_poll_interval_secs: default_alert_poll_interval(),
            fetch_timeout_secs: default_fetch_timeout(),
            music_volume: default_music_volume(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, writing defaults on first run
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Resolve API key from environment variable or config
    pub fn resolve_api_key(&self) -> Option<String> {
        Self::pick_api_key(std::env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }

    fn pick_api_key(env_key: Option<String>, config_key: Option<&str>) -> Option<String> {
        env_key
            .filter(|key| !key.is_empty())
            .or_else(|| config_key.map(str::to_string).filter(|key| !key.is_empty()))
    }

    /// Explicit coordinates, when both halves of the override are set
    pub fn override_coordinates(&self) -> Option<(f64, f64)> {
        self.override_latitude.zip(self.override_longitude)
    }

    /// Parse the enabled package names, failing on unknown names
    pub fn packages(&self) -> Result<Vec<Package>, CatalogError> {
        Package::parse_list(&self.enabled_packages)
    }

    /// Configured locale, or the default set when it is not recognised
    pub fn artwork_locale(&self) -> String {
        if LOCALES.contains(&self.locale.as_str()) {
            self.locale.clone()
        } else {
            warn!("Unknown locale '{}', using {}", self.locale, default_locale());
            default_locale()
        }
    }

    /// Build the kiosk configuration, validating package names
    pub fn kiosk_config(&self) -> Result<KioskConfig, CatalogError> {
        Ok(KioskConfig {
            locale: self.artwork_locale(),
            affiliate_name: self.affiliate_name.clone(),
            packages: self.packages()?,
            store: StoreConfig {
                fetch_timeout: Duration::from_secs(self.fetch_timeout_secs.max(1)),
                ..StoreConfig::default()
            },
            refresh_interval: Duration::from_secs(self.refresh_interval_secs.max(1)),
            alert_poll_interval: Duration::from_secs(self.alert_poll_interval_secs.max(1)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.locale, "neighborhood");
        assert_eq!(config.enabled_packages, vec!["Core".to_string()]);
        assert_eq!(config.refresh_interval_secs, 300);
        assert!((config.music_volume - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: AppConfig = from_json(r#"{"affiliate_name": "WXYZ"}"#);
        assert_eq!(config.affiliate_name, "WXYZ");
        assert_eq!(config.alert_poll_interval_secs, 60);
        assert_eq!(config.fetch_timeout_secs, 10);
        assert_eq!(config.config_version, 1);
    }

    #[test]
    fn test_env_key_takes_precedence() {
        assert_eq!(
            AppConfig::pick_api_key(Some("env".to_string()), Some("file")),
            Some("env".to_string())
        );
        assert_eq!(
            AppConfig::pick_api_key(Some(String::new()), Some("file")),
            Some("file".to_string())
        );
        assert_eq!(AppConfig::pick_api_key(None, Some("")), None);
    }

    #[test]
    fn test_packages_validated() {
        let mut config = AppConfig {
            enabled_packages: vec!["minicore".to_string(), " Spanish ".to_string()],
            ..AppConfig::default()
        };
        assert_eq!(
            config.packages().unwrap(),
            vec![Package::MiniCore, Package::Spanish]
        );

        config.enabled_packages.push("Travel".to_string());
        assert_eq!(
            config.kiosk_config().unwrap_err(),
            CatalogError::UnknownPackage("Travel".to_string())
        );
    }

    #[test]
    fn test_unknown_locale_falls_back() {
        let config = AppConfig {
            locale: "arctic".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.kiosk_config().unwrap().locale, "neighborhood");
    }

    #[test]
    fn test_zero_durations_clamped() {
        let config = AppConfig {
            fetch_timeout_secs: 0,
            refresh_interval_secs: 0,
            alert_poll_interval_secs: 0,
            ..AppConfig::default()
        };
        let kiosk = config.kiosk_config().unwrap();
        assert_eq!(kiosk.store.fetch_timeout, Duration::from_secs(1));
        assert_eq!(kiosk.refresh_interval, Duration::from_secs(1));
        assert_eq!(kiosk.alert_poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_override_needs_both_halves() {
        let mut config = AppConfig {
            override_latitude: Some(40.0),
            ..AppConfig::default()
        };
        assert_eq!(config.override_coordinates(), None);
        config.override_longitude = Some(-75.0);
        assert_eq!(config.override_coordinates(), Some((40.0, -75.0)));
    }

    fn from_json(json: &str) -> AppConfig {
        serde_json::from_str(json).unwrap()
    }
}
