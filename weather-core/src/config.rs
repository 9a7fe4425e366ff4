use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::model::Coordinates;

pub const DEFAULT_NAME: &str = "Yandex Weather";

/// Settings of the Yandex weather entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YandexConfig {
    #[serde(default = "default_name")]
    pub name: String,

    pub api_key: Option<String>,

    /// Overrides the home location when both are set.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

impl Default for YandexConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            api_key: None,
            latitude: None,
            longitude: None,
        }
    }
}

/// Host-wide default location.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HomeConfig {
    pub latitude: f64,
    pub longitude: f64,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [yandex]
/// name = "Yandex Weather"
/// api_key = "..."
///
/// [home]
/// latitude = 55.75
/// longitude = 37.62
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub yandex: YandexConfig,

    pub home: Option<HomeConfig>,
}

impl Config {
    pub fn name(&self) -> &str {
        &self.yandex.name
    }

    /// Returns the API key, or an error with a hint when it is missing.
    pub fn api_key(&self) -> Result<&str> {
        self.yandex
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured for Yandex.Weather.\n\
                     Hint: run `yandex-weather configure` and enter your API key."
                )
            })
    }

    /// Entity coordinates, falling back to the home location.
    pub fn resolve_coordinates(&self) -> Result<Coordinates> {
        let home = self.home;
        let latitude = self.yandex.latitude.or(home.map(|h| h.latitude));
        let longitude = self.yandex.longitude.or(home.map(|h| h.longitude));

        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            return Err(anyhow!(
                "No coordinates configured.\n\
                 Hint: set latitude/longitude under [yandex] or [home] in {}.",
                Self::config_file_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "the config file".to_string())
            ));
        };

        validate_coordinates(latitude, longitude)?;
        Ok(Coordinates::new(latitude, longitude))
    }

    /// Load config from the default location, or an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save config, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "yandex-weather", "yandex-weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(anyhow!("Latitude {latitude} is out of range [-90, 90]"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(anyhow!("Longitude {longitude} is out of range [-180, 180]"));
    }
    Ok(())
}
