use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::units::Units;

pub const APP_NAME: &str = "cityweather";

const WEATHER_KEY_ENV: &str = "OWM_API_KEY";
const CITIES_KEY_ENV: &str = "RAPIDAPI_KEY";

/// Settings read from `config.toml`. Every field has a default, so a partial
/// file (or none at all) is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub units: Units,

    pub weather_api_key: String,
    pub weather_base_url: String,

    pub cities_api_key: String,
    pub cities_api_host: String,
    pub cities_base_url: String,

    /// Quiet period before a suggestion search is sent
    pub debounce_ms: u64,

    /// 0 disables the periodic refresh
    pub refresh_minutes: u64,

    pub timeout_secs: u64,

    /// City shown on startup, updated after each successful lookup
    pub last_city: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            units: Units::Metric,
            weather_api_key: String::new(),
            weather_base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            cities_api_key: String::new(),
            cities_api_host: "city-and-state-search-api.p.rapidapi.com".to_string(),
            cities_base_url: "https://city-and-state-search-api.p.rapidapi.com".to_string(),
            debounce_ms: 300,
            refresh_minutes: 10,
            timeout_secs: 10,
            last_city: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_NAME).join("config.toml"))
            .ok_or(Error::NoConfigDir)
    }

    /// Load from `path`, falling back to defaults when the file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Let API keys from the environment win over the file.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(WEATHER_KEY_ENV).filter(|k| !k.is_empty()) {
            self.weather_api_key = key;
        }
        if let Some(key) = lookup(CITIES_KEY_ENV).filter(|k| !k.is_empty()) {
            self.cities_api_key = key;
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_minutes > 0).then(|| Duration::from_secs(self.refresh_minutes * 60))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
