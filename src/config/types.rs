//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Filter configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Where hidden-channel sets are persisted.
    #[serde(default)]
    pub store: StoreConfig,
    /// Filtering behaviour.
    #[serde(default)]
    pub filter: FilterConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Persistence backend selection.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Redb database file at `store.path`.
    #[default]
    Redb,
    /// Process memory only; state is lost on restart.
    Memory,
}

/// Visibility store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Path to the Redb file (ignored by the memory backend).
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_store_path(),
        }
    }
}

/// Filtering behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Grace period before a client-initiated PART hides the channel.
    /// Zero hides immediately.
    #[serde(default)]
    pub hide_delay_ms: u64,

    /// Service nicknames whose `[#channel]`-prefixed notices are attributed
    /// to that channel.
    #[serde(default = "default_services")]
    pub services: Vec<String>,

    /// Suppress QUIT/NICK from users who only share hidden channels.
    #[serde(default = "default_true")]
    pub filter_quit_nick: bool,
}

impl FilterConfig {
    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            hide_delay_ms: 0,
            services: default_services(),
            filter_quit_nick: true,
        }
    }
}

fn default_store_path() -> String {
    "chanfilter.redb".to_string()
}

fn default_services() -> Vec<String> {
    vec!["ChanServ".to_string()]
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.store.backend, StoreBackend::Redb);
        assert_eq!(config.store.path, "chanfilter.redb");
        assert_eq!(config.filter.hide_delay_ms, 0);
        assert_eq!(config.filter.services, vec!["ChanServ"]);
        assert!(config.filter.filter_quit_nick);
    }

    #[test]
    fn test_full_config() {
        let config: Config = toml::from_str(
            r#"
[store]
backend = "memory"

[filter]
hide_delay_ms = 3000
services = ["ChanServ", "Q"]
filter_quit_nick = false
"#,
        )
        .unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.filter.hide_delay(), Duration::from_secs(3));
        assert_eq!(config.filter.services, vec!["ChanServ", "Q"]);
        assert!(!config.filter.filter_quit_nick);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result: Result<Config, _> = toml::from_str("[store]\nbackend = \"sqlite\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/chanfilter.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
