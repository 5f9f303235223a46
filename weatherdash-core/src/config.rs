use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{provider::BackendId, units::UnitSystem};

pub const ENV_BACKEND: &str = "WEATHERDASH_BACKEND";
pub const ENV_API_KEY: &str = "WEATHERDASH_API_KEY";

/// Settings for the offline backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    /// Fixed artificial latency applied before every mock response.
    pub delay_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self { delay_ms: 500 }
    }
}

/// HTTP client settings for the remote backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// Remote endpoints. Overridable so tests can point at a local server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub base_url: String,
    pub geocode_url: String,
    pub history_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            geocode_url: "https://api.openweathermap.org/geo/1.0/direct".to_string(),
            history_url: "https://api.openweathermap.org/data/2.5/onecall/timemachine".to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// backend = "openweather"
/// api_key = "..."
/// units = "metric"
///
/// [mock]
/// delay_ms = 500
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// "mock" or "openweather"; mock when absent.
    pub backend: Option<String>,
    pub api_key: Option<String>,
    pub units: UnitSystem,
    /// City shown when nothing else was asked for.
    pub default_city: String,
    /// City used when device geolocation is unavailable.
    pub fallback_city: String,
    pub mock: MockConfig,
    pub http: HttpConfig,
    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: None,
            api_key: None,
            units: UnitSystem::Metric,
            default_city: "Kathmandu".to_string(),
            fallback_city: "London".to_string(),
            mock: MockConfig::default(),
            http: HttpConfig::default(),
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Return the configured backend as a strongly-typed BackendId.
    pub fn backend_id(&self) -> Result<BackendId> {
        match self.backend.as_deref() {
            None => Ok(BackendId::Mock),
            Some(s) => BackendId::try_from(s),
        }
    }

    pub fn set_backend(&mut self, id: BackendId) {
        self.backend = Some(id.as_str().to_string());
    }

    /// Returns the API key, if present and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn mock_delay(&self) -> Duration {
        Duration::from_millis(self.mock.delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
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
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherdash", "weatherdash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply `WEATHERDASH_BACKEND` / `WEATHERDASH_API_KEY` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup; blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(backend) = present(ENV_BACKEND) {
            self.backend = Some(backend);
        }
        if let Some(key) = present(ENV_API_KEY) {
            self.api_key = Some(key);
        }
    }
}
