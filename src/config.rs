//! Runtime configuration for the pipelines and the settings file location

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::logging::{LogPipelineConfig, DEFAULT_RETENTION_DAYS};
use crate::notify::DEFAULT_CHANNEL_BUFFER;
use crate::settings::DEFAULT_SETTINGS_FILE;

/// Default location of the application configuration file
pub const APP_CONFIG_FILE: &str = "courier.json";

/// Environment variable that overrides [`APP_CONFIG_FILE`]
pub const APP_CONFIG_ENV: &str = "COURIER_CONFIG";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path of the JSON settings file (default: ./config.json)
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,

    /// Log pipeline setup
    #[serde(default)]
    pub log: LogPipelineConfig,

    /// Capacity of the channel between the notification thread and the
    /// presentation layer (default: 64)
    #[serde(default = "default_notification_buffer")]
    pub notification_buffer: usize,

    /// Generated log files older than this are removed at startup (default: 30)
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u64,
}

fn default_settings_path() -> PathBuf {
    PathBuf::from(DEFAULT_SETTINGS_FILE)
}

fn default_notification_buffer() -> usize {
    DEFAULT_CHANNEL_BUFFER
}

fn default_log_retention_days() -> u64 {
    DEFAULT_RETENTION_DAYS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings_path: default_settings_path(),
            log: LogPipelineConfig::default(),
            notification_buffer: default_notification_buffer(),
            log_retention_days: default_log_retention_days(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or defaults if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Config file path: `$COURIER_CONFIG` if set, else `./courier.json`
    pub fn config_file_path() -> PathBuf {
        std::env::var_os(APP_CONFIG_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(APP_CONFIG_FILE))
    }

    /// Directory log files are written to
    pub fn logs_dir(&self) -> PathBuf {
        self.log
            .dir
            .clone()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{Severity, DEFAULT_MAX_FILE_SIZE};
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.settings_path, PathBuf::from("config.json"));
        assert_eq!(config.notification_buffer, 64);
        assert_eq!(config.log_retention_days, 30);
        assert_eq!(config.log.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert_eq!(config.log.threshold, Severity::Info);
        assert_eq!(config.logs_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"log":{"dir":"logs","max_file_size":1024}}"#).unwrap();
        assert_eq!(config.logs_dir(), PathBuf::from("logs"));
        assert_eq!(config.log.max_file_size, 1024);
        assert_eq!(config.log.threshold, Severity::Info);
        assert_eq!(config.settings_path, PathBuf::from("config.json"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::load(&temp_dir.path().join("courier.json")).unwrap();
        assert_eq!(config.settings_path, PathBuf::from("config.json"));
        assert_eq!(config.notification_buffer, 64);
    }

    #[test]
    fn test_load_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("courier.json");
        std::fs::write(
            &path,
            r#"{"settings_path":"prefs.json","notification_buffer":8,"log":{"threshold":"DEBUG"}}"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.settings_path, PathBuf::from("prefs.json"));
        assert_eq!(config.notification_buffer, 8);
        assert_eq!(config.log.threshold, Severity::Debug);
        assert_eq!(config.log_retention_days, 30);
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("courier.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }
}
