use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, net::SocketAddr, path::PathBuf};

use crate::{geocode::DEFAULT_AUTOCOMPLETE_URL, provider::openweather::DEFAULT_FORECAST_URL};

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// OpenWeatherMap credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenWeatherConfig {
    pub api_key: Option<String>,
    pub forecast_url: String,
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub autocomplete_url: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            autocomplete_url: DEFAULT_AUTOCOMPLETE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP service listens on.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [openweather]
/// api_key = "..."
///
/// [server]
/// bind = "0.0.0.0:3000"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub openweather: OpenWeatherConfig,
    pub geocoder: GeocoderConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Load config from disk, then apply `OWM_API_KEY` and `PORT` from the environment.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_file()?;
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Load config from disk only, or return defaults if it doesn't exist yet.
    pub fn load_file() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply environment overrides through `lookup`, so tests need not touch the process env.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(key) = lookup("OWM_API_KEY").filter(|k| !k.is_empty()) {
            self.openweather.api_key = Some(key);
        }

        if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {port}"))?;
            let mut addr = self.bind_addr()?;
            addr.set_port(port);
            self.server.bind = addr.to_string();
        }

        Ok(())
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file; `SPRINKLER_CONFIG` wins over the platform default.
    pub fn config_file_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("SPRINKLER_CONFIG") {
            return Ok(PathBuf::from(path));
        }

        let dirs = ProjectDirs::from("dev", "sprinkler", "sprinkler-weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.server.bind))
    }

    pub fn set_openweather_api_key(&mut self, api_key: String) {
        self.openweather.api_key = Some(api_key);
    }

    /// Returns the API key, if present and non-empty.
    pub fn openweather_api_key(&self) -> Option<&str> {
        self.openweather.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_public_services() {
        let cfg = Config::default();

        assert_eq!(cfg.openweather_api_key(), None);
        assert_eq!(cfg.openweather.forecast_url, DEFAULT_FORECAST_URL);
        assert_eq!(cfg.geocoder.autocomplete_url, DEFAULT_AUTOCOMPLETE_URL);
        assert_eq!(cfg.bind_addr().unwrap().to_string(), DEFAULT_BIND);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = Config::from_toml("[openweather]\napi_key = \"ABC\"\n").unwrap();

        assert_eq!(cfg.openweather_api_key(), Some("ABC"));
        assert_eq!(cfg.openweather.forecast_url, DEFAULT_FORECAST_URL);
        assert_eq!(cfg.server.bind, DEFAULT_BIND);
    }

    #[test]
    fn toml_round_trip() {
        let mut cfg = Config::default();
        cfg.set_openweather_api_key("KEY".into());
        cfg.server.bind = "0.0.0.0:8080".into();

        let text = toml::to_string_pretty(&cfg).unwrap();
        let back = Config::from_toml(&text).unwrap();

        assert_eq!(back.openweather_api_key(), Some("KEY"));
        assert_eq!(back.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn env_overrides_key_and_port() {
        let mut cfg = Config::default();
        cfg.apply_env(env(&[("OWM_API_KEY", "FROM_ENV"), ("PORT", "8081")]))
            .unwrap();

        assert_eq!(cfg.openweather_api_key(), Some("FROM_ENV"));
        assert_eq!(cfg.server.bind, "127.0.0.1:8081");
    }

    #[test]
    fn empty_env_key_is_ignored() {
        let mut cfg = Config::default();
        cfg.set_openweather_api_key("FILE".into());
        cfg.apply_env(env(&[("OWM_API_KEY", "")])).unwrap();

        assert_eq!(cfg.openweather_api_key(), Some("FILE"));
    }

    #[test]
    fn bad_port_is_an_error() {
        let mut cfg = Config::default();
        let err = cfg.apply_env(env(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT is not a valid port number"));
    }
}
