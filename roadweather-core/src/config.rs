use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::client::{ClientOptions, DEFAULT_ENDPOINT};

/// Environment variable holding the Trafikinfo API key.
pub const API_KEY_ENV: &str = "TRAFIKINFO_API_KEY";

/// Device setting: refresh interval in minutes.
pub const SETTING_REFRESH_INTERVAL: &str = "refresh_status_cloud";
/// Device setting: timestamp and description of the last failed poll.
pub const SETTING_LAST_ERROR: &str = "last_error";
/// Device setting: pretty printed measure point of the last successful poll.
pub const SETTING_LAST_RESPONSE: &str = "last_response";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Used when a device has no valid `refresh_status_cloud` setting.
    pub refresh_interval_minutes: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            refresh_interval_minutes: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    pub search_radius_meters: u32,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            search_radius_meters: 20_000,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [api]
/// timeout_ms = 8000
///
/// [device]
/// refresh_interval_minutes = 10
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub device: DeviceConfig,
    pub pairing: PairingConfig,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("se", "roadweather", "roadweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// API key from the environment.
    pub fn api_token() -> Result<String> {
        token_from(std::env::var(API_KEY_ENV).ok())
    }

    pub fn client_options(&self, token: String) -> ClientOptions {
        ClientOptions {
            endpoint: self.api.endpoint.clone(),
            token,
            timeout: Duration::from_millis(self.api.timeout_ms),
        }
    }

    /// Interval for a device given its raw `refresh_status_cloud` setting.
    pub fn refresh_interval(&self, setting: Option<&str>) -> Duration {
        let minutes = setting
            .and_then(|s| s.trim().parse::<u32>().ok())
            .filter(|m| *m > 0)
            .unwrap_or(self.device.refresh_interval_minutes.max(1));

        Duration::from_secs(u64::from(minutes) * 60)
    }
}

fn token_from(value: Option<String>) -> Result<String> {
    match value {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(anyhow!(
            "No Trafikinfo API key configured.\n\
             Hint: export {API_KEY_ENV}=<your key> before starting the host."
        )),
    }
}
