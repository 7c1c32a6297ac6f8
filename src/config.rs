//! Configuration management for the LocalDrive server.
//!
//! This module provides TOML-based configuration file loading with
//! environment variable overrides. The default configuration path is
//! `~/.config/localdrive/config.toml`.

use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("port must be non-zero")]
    InvalidPort,

    #[error("host is not a valid IP address: {0}")]
    InvalidHost(String),

    #[error("max_upload_size must be greater than 0")]
    InvalidMaxUploadSize,

    #[error("log level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for the LocalDrive server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Storage root configuration.
    pub storage: StorageConfig,

    /// Logging configuration.
    pub log: LogConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,

    /// Address to bind to.
    pub host: String,
}

/// Storage root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// The directory served as the storage root. Created on startup if
    /// it does not exist.
    pub root: PathBuf,

    /// Maximum accepted upload body size in bytes (default: 100MB).
    pub max_upload_size: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./storage"),
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("localdrive")
        .join("config.toml")
}

impl Config {
    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Supported variables:
    /// - LOCALDRIVE_PORT: Override the server port
    /// - LOCALDRIVE_STORAGE_ROOT: Override the storage root directory
    /// - LOCALDRIVE_LOG_LEVEL: Override log level (trace, debug, info, warn, error)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var("LOCALDRIVE_PORT") {
            if !raw.is_empty() {
                match raw.parse::<u16>() {
                    Ok(port) => {
                        tracing::info!("Overriding server port from environment: {}", port);
                        self.server.port = port;
                    }
                    Err(_) => {
                        tracing::warn!("Ignoring invalid LOCALDRIVE_PORT value: {}", raw);
                    }
                }
            }
        }

        if let Ok(root) = std::env::var("LOCALDRIVE_STORAGE_ROOT") {
            if !root.is_empty() {
                tracing::info!("Overriding storage root from environment: {}", root);
                self.storage.root = PathBuf::from(root);
            }
        }

        if let Ok(level) = std::env::var("LOCALDRIVE_LOG_LEVEL") {
            if !level.is_empty() {
                tracing::info!("Overriding log level from environment: {}", level);
                self.log.level = level;
            }
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if self.server.host.parse::<IpAddr>().is_err() {
            return Err(ConfigError::InvalidHost(self.server.host.clone()));
        }

        if self.storage.max_upload_size == 0 {
            return Err(ConfigError::InvalidMaxUploadSize);
        }

        let level = self.log.level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log.level.clone()));
        }

        Ok(())
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", e.message()))
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.storage.root, PathBuf::from("./storage"));
        assert_eq!(config.storage.max_upload_size, 100 * 1024 * 1024);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_from_toml_empty() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_from_toml_partial() {
        let toml = r#"
[server]
port = 8080

[log]
level = "debug"
"#;
        let config = Config::from_toml(toml).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.log.level, "debug");
        // Other values should be defaults
        assert_eq!(config.storage.root, PathBuf::from("./storage"));
    }

    #[test]
    fn test_from_toml_full() {
        let toml = r#"
[server]
port = 9000
host = "127.0.0.1"

[storage]
root = "/srv/shared"
max_upload_size = 52428800

[log]
level = "trace"
"#;
        let config = Config::from_toml(toml).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.storage.root, PathBuf::from("/srv/shared"));
        assert_eq!(config.storage.max_upload_size, 52428800);
        assert_eq!(config.log.level, "trace");
    }

    #[test]
    fn test_from_toml_invalid_syntax() {
        let result = Config::from_toml("[server\nport = 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_roundtrip() {
        let mut original = Config::default();
        original.server.port = 4242;
        original.log.level = "warn".to_string();

        let toml = original.to_toml().unwrap();
        let loaded = Config::from_toml(&toml).unwrap();

        assert_eq!(original, loaded);
    }

    #[test]
    fn test_load_missing_file() {
        let config = Config::load("/nonexistent/path/config.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[server]\nport = 5555\n").unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.server.port, 5555);
    }

    #[test]
    fn test_load_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "invalid [ toml").unwrap();

        let result = Config::load(&config_path);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_default_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPort));
    }

    #[test]
    fn test_validate_bad_host() {
        let mut config = Config::default();
        config.server.host = "not-an-ip".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidHost("not-an-ip".to_string()))
        );
    }

    #[test]
    fn test_validate_zero_upload_size() {
        let mut config = Config::default();
        config.storage.max_upload_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidMaxUploadSize));
    }

    #[test]
    fn test_validate_log_levels() {
        let mut config = Config::default();

        for level in ["trace", "debug", "info", "warn", "error", "WARN", "Info"] {
            config.log.level = level.to_string();
            assert!(config.validate().is_ok(), "level {level} should be valid");
        }

        config.log.level = "verbose".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidLogLevel("verbose".to_string()))
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.to_string_lossy().contains("localdrive"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    #[serial]
    fn test_env_override_port() {
        std::env::set_var("LOCALDRIVE_PORT", "8123");

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.server.port, 8123);

        std::env::remove_var("LOCALDRIVE_PORT");
    }

    #[test]
    #[serial]
    fn test_env_override_invalid_port_ignored() {
        std::env::set_var("LOCALDRIVE_PORT", "not-a-port");

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.server.port, 3000);

        std::env::remove_var("LOCALDRIVE_PORT");
    }

    #[test]
    #[serial]
    fn test_env_override_storage_root() {
        std::env::set_var("LOCALDRIVE_STORAGE_ROOT", "/tmp/drive");

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.storage.root, PathBuf::from("/tmp/drive"));

        std::env::remove_var("LOCALDRIVE_STORAGE_ROOT");
    }

    #[test]
    #[serial]
    fn test_env_override_empty_does_not_override() {
        std::env::set_var("LOCALDRIVE_STORAGE_ROOT", "");
        std::env::set_var("LOCALDRIVE_LOG_LEVEL", "");

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.storage.root, PathBuf::from("./storage"));
        assert_eq!(config.log.level, "info");

        std::env::remove_var("LOCALDRIVE_STORAGE_ROOT");
        std::env::remove_var("LOCALDRIVE_LOG_LEVEL");
    }

    #[test]
    #[serial]
    fn test_env_override_log_level() {
        std::env::set_var("LOCALDRIVE_LOG_LEVEL", "debug");

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.log.level, "debug");

        std::env::remove_var("LOCALDRIVE_LOG_LEVEL");
    }
}
