//! Configuration loaded from `~/.tabpost/config.yaml`
//!
//! Every key is optional; a missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::constants::{DATA_DIR_NAME, DEFAULT_HTTP_URL, HISTORY_POLL_SECS};
use crate::network::client::ClientOptions;

/// Where history is persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackendKind {
    #[default]
    File,
    Http,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub backend: HistoryBackendKind,
    /// REST base URL, required for the `http` backend
    pub endpoint: Option<String>,
    pub poll_interval_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            backend: HistoryBackendKind::File,
            endpoint: None,
            poll_interval_secs: HISTORY_POLL_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub file: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".to_string(),
            file: "tabpost.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub url: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            url: DEFAULT_HTTP_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub history: HistoryConfig,
    pub http: HttpConfig,
    pub log: LogConfig,
    pub defaults: DefaultsConfig,
}

/// Directory holding config, logs, history and local state
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

impl Config {
    /// Loads `config.yaml` from the data directory
    pub fn load() -> Result<Config> {
        Self::load_from(&data_dir().join("config.yaml"))
    }

    pub fn load_from(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("loading {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Config> {
        // An empty document deserializes to unit, not to a map
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.history.backend == HistoryBackendKind::Http && self.history.endpoint.is_none() {
            bail!("history.endpoint is required when history.backend is http");
        }
        if self.history.poll_interval_secs == 0 {
            bail!("history.poll_interval_secs must be greater than zero");
        }
        if self.log.level.parse::<tracing::Level>().is_err() {
            bail!("unknown log level {:?}", self.log.level);
        }
        Ok(())
    }

    pub fn log_level(&self) -> tracing::Level {
        self.log.level.parse().unwrap_or(tracing::Level::INFO)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.history.poll_interval_secs)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: self.http.timeout_secs.map(Duration::from_secs),
            accept_invalid_certs: self.http.accept_invalid_certs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = Config::parse(
            "history:\n  backend: http\n  endpoint: http://localhost:3000/api/history\nlog:\n  level: debug\n",
        )
        .unwrap();
        assert_eq!(config.history.backend, HistoryBackendKind::Http);
        assert_eq!(config.history.poll_interval_secs, HISTORY_POLL_SECS);
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
        assert_eq!(config.log.file, "tabpost.log");
        assert_eq!(config.defaults.url, DEFAULT_HTTP_URL);
        assert!(config.client_options().timeout.is_none());
    }

    #[test]
    fn test_http_backend_requires_endpoint() {
        assert!(Config::parse("history:\n  backend: http\n").is_err());
    }

    #[test]
    fn test_rejects_zero_poll_interval_and_bad_level() {
        assert!(Config::parse("history:\n  poll_interval_secs: 0\n").is_err());
        assert!(Config::parse("log:\n  level: loud\n").is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_timeout_maps_to_client_options() {
        let config = Config::parse("http:\n  timeout_secs: 5\n  accept_invalid_certs: true\n").unwrap();
        let options = config.client_options();
        assert_eq!(options.timeout, Some(Duration::from_secs(5)));
        assert!(options.accept_invalid_certs);
    }
}
