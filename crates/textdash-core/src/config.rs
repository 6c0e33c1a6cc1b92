//! Application configuration management.
//!
//! Two layers:
//! - `ApiConfig`: where the service lives and how long to wait for it
//! - `Config`: user preferences persisted at `~/.config/textdash/config.json`
//!   (API URL override, last username, session storage backend)

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "textdash";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the service address
pub const API_URL_ENV: &str = "TEXTDASH_API_URL";

/// Service address used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:5001";

/// Per-request timeout in milliseconds
pub const REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(REQUEST_TIMEOUT_MS),
        }
    }

    /// Resolve the base URL: environment first, then the saved config,
    /// then the default.
    pub fn resolve(config: &Config) -> Self {
        let from_env = std::env::var(API_URL_ENV).ok();
        Self::resolve_from(from_env.as_deref(), config)
    }

    fn resolve_from(env_value: Option<&str>, config: &Config) -> Self {
        let base_url = env_value
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .or_else(|| config.api_url.as_deref().filter(|url| !url.is_empty()))
            .unwrap_or(DEFAULT_API_URL);
        Self::new(base_url)
    }
}

/// Where the session is kept between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub last_username: Option<String>,
    #[serde(default)]
    pub store: StoreBackend,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_api_config() {
        let api = ApiConfig::default();
        assert_eq!(api.base_url, "http://localhost:5001");
        assert_eq!(api.timeout, Duration::from_millis(10_000));
    }

    #[test]
    fn test_resolve_prefers_env_then_config() {
        let config = Config {
            api_url: Some("http://config:8000/".to_string()),
            ..Config::default()
        };

        assert_eq!(ApiConfig::resolve_from(Some("http://env:9000"), &config).base_url, "http://env:9000");
        assert_eq!(ApiConfig::resolve_from(Some("  "), &config).base_url, "http://config:8000");
        assert_eq!(ApiConfig::resolve_from(None, &config).base_url, "http://config:8000");
        assert_eq!(ApiConfig::resolve_from(None, &Config::default()).base_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_config_parses_partial_file() {
        let config: Config = serde_json::from_str(r#"{"store": "keyring"}"#).expect("parse config");
        assert_eq!(config.store, StoreBackend::Keyring);
        assert!(config.api_url.is_none());
    }
}
