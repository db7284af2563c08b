//! Configuration module for dockview.
//!
//! Handles loading and parsing the .dockviewrc configuration file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::explorer::DEFAULT_REFRESH_INTERVAL_MS;
use crate::hub::DEFAULT_HUB_URL;
use crate::logging::LogConfig;

/// Default HTTP request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default .dockviewrc file content with all settings documented.
const DEFAULT_RC: &str = r#"# dockview Configuration File
# ============================
# This file is read on application startup.
# Lines starting with '#' are comments.
#
# Explorer
# --------
# Milliseconds between automatic refreshes of images and containers.
# Zero or a negative value disables automatic refresh.
# explorer_refresh_interval = 1000
explorer_refresh_interval = 1000

# Registries
# ----------
# docker_hub_url = https://hub.docker.com
#
# Show Azure subscriptions (requires a signed-in Azure CLI)
# azure_enabled = true
#
# Seconds before an HTTP request is abandoned
# http_timeout = 30

# Credentials
# -----------
# Where the Docker Hub session token is kept (default ~/.dockview/credentials.toml)
# credentials_path = ~/.dockview/credentials.toml

# Logging Configuration
# ---------------------
# Logs are stored in ~/.dockview/logs/ with automatic cleanup.
#
# log_enabled = true       # Enable/disable file logging (true/false)
# log_level = info         # Log level: trace, debug, info, warn, error, off
# log_retention = 24       # Hours to keep log files (default: 24)
"#;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Auto-refresh interval in milliseconds (<= 0 disables).
    pub refresh_interval_ms: i64,
    /// Docker Hub API base URL.
    pub docker_hub_url: String,
    /// Whether Azure subscriptions are listed.
    pub azure_enabled: bool,
    /// HTTP request timeout in seconds.
    pub http_timeout_secs: u64,
    /// Credential store path override.
    pub credentials_path: Option<PathBuf>,
    /// Path to config file.
    pub config_path: PathBuf,
    /// Logging configuration.
    pub log_config: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            docker_hub_url: DEFAULT_HUB_URL.to_string(),
            azure_enabled: true,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            credentials_path: None,
            config_path: Self::default_config_path(),
            log_config: LogConfig::default(),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "yes" | "1" | "on")
}

/// Expands a leading `~` to the home directory.
fn expand_home(value: &str) -> PathBuf {
    match value.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(value),
    }
}

impl Config {
    /// Returns the default config file path (~/.dockviewrc).
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".dockviewrc")
    }

    /// Loads configuration from the default path, creating it if it doesn't exist.
    ///
    /// # Errors
    /// Returns error if config cannot be read.
    pub fn load() -> io::Result<Self> {
        let path = Self::default_config_path();
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    ///
    /// # Errors
    /// Returns error if config cannot be read.
    pub fn load_from(path: &Path) -> io::Result<Self> {
        if !path.exists() {
            Self::create_default_config(path)?;
        }

        let content = fs::read_to_string(path)?;
        let mut config = Self {
            config_path: path.to_path_buf(),
            ..Self::default()
        };
        config.parse(&content);
        Ok(config)
    }

    /// Parses configuration from a string without touching disk.
    #[must_use]
    pub fn from_str_content(content: &str) -> Self {
        let mut config = Self::default();
        config.parse(content);
        config
    }

    /// Creates the default config file.
    fn create_default_config(path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        file.write_all(DEFAULT_RC.as_bytes())?;
        Ok(())
    }

    /// Parses the config file content.
    fn parse(&mut self, content: &str) {
        for line in content.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                // Remove inline comments
                let value = value.split('#').next().unwrap_or(value).trim();

                self.apply_setting(key, value);
            }
        }
    }

    /// Applies a single setting. Unknown keys and bad values are ignored.
    fn apply_setting(&mut self, key: &str, value: &str) {
        match key {
            "explorer_refresh_interval" => match value.parse() {
                Ok(ms) => self.refresh_interval_ms = ms,
                Err(_) => tracing::warn!("Invalid explorer_refresh_interval: {}", value),
            },
            "docker_hub_url" => {
                if !value.is_empty() {
                    self.docker_hub_url = value.trim_end_matches('/').to_string();
                }
            }
            "azure_enabled" => {
                self.azure_enabled = parse_bool(value);
            }
            "http_timeout" => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => self.http_timeout_secs = secs,
                _ => tracing::warn!("Invalid http_timeout: {}", value),
            },
            "credentials_path" => {
                if !value.is_empty() {
                    self.credentials_path = Some(expand_home(value));
                }
            }
            "log_level" => {
                self.log_config.level = LogConfig::parse_level(value);
            }
            "log_retention" | "log_retention_hours" => {
                self.log_config.retention_hours = LogConfig::parse_retention(value);
            }
            "log_enabled" | "logging" => {
                self.log_config.enabled = parse_bool(value);
            }
            _ => {
                tracing::debug!("Ignoring unknown setting {}", key);
            }
        }
    }

    /// Returns the HTTP request timeout.
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::logging::{DEFAULT_LOG_LEVEL, DEFAULT_LOG_RETENTION_HOURS};
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::from_str_content("");
        assert_eq!(config.refresh_interval_ms, 1000);
        assert_eq!(config.docker_hub_url, "https://hub.docker.com");
        assert!(config.azure_enabled);
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
        assert!(config.credentials_path.is_none());
        assert_eq!(config.log_config.level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_parse_settings() {
        let config = Config::from_str_content(
            "explorer_refresh_interval = -1\n\
             docker_hub_url = http://localhost:8080/  # local mirror\n\
             azure_enabled = no\n\
             http_timeout = 5\n\
             credentials_path = /tmp/creds.toml\n\
             log_level = DEBUG\n\
             log_retention = 48\n",
        );

        assert_eq!(config.refresh_interval_ms, -1);
        assert_eq!(config.docker_hub_url, "http://localhost:8080");
        assert!(!config.azure_enabled);
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(
            config.credentials_path,
            Some(PathBuf::from("/tmp/creds.toml"))
        );
        assert_eq!(config.log_config.level, "debug");
        assert_eq!(config.log_config.retention_hours, 48);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = Config::from_str_content(
            "explorer_refresh_interval = soon\nhttp_timeout = 0\nlog_retention = forever\nunknown = 1\n",
        );
        assert_eq!(config.refresh_interval_ms, DEFAULT_REFRESH_INTERVAL_MS);
        assert_eq!(config.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
        assert_eq!(
            config.log_config.retention_hours,
            DEFAULT_LOG_RETENTION_HOURS
        );
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(".dockviewrc");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.config_path, path);
        assert_eq!(config.refresh_interval_ms, 1000);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("explorer_refresh_interval"));
    }

    #[test]
    fn test_expand_home() {
        let expanded = expand_home("~/x/creds.toml");
        assert!(expanded.ends_with("x/creds.toml"));
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
