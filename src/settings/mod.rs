//! User settings persisted as JSON
//!
//! File layout:
//!
//! ```json
//! {
//!   "appSettings": { "fullScreen": false, "enableDebugMode": false },
//!   "logicSettings": { "logLvl": "INFO" }
//! }
//! ```

mod store;

pub use store::{SettingsStore, DEFAULT_SETTINGS_FILE};

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, LevelParseError};
use crate::logging::Severity;

/// Window and presentation preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Start the window full screen
    #[serde(default)]
    pub full_screen: bool,

    #[serde(default)]
    pub enable_debug_mode: bool,
}

/// Settings consumed by the application core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicSettings {
    /// Log threshold name: TRACE, DEBUG, INFO, WARNING, ERROR or FATAL
    #[serde(rename = "logLvl", default)]
    pub log_lvl: String,
}

impl LogicSettings {
    /// Parse `logLvl` into a severity
    pub fn threshold(&self) -> Result<Severity, LevelParseError> {
        self.log_lvl.parse()
    }
}

impl Default for LogicSettings {
    fn default() -> Self {
        Self {
            log_lvl: Severity::default().as_str().to_string(),
        }
    }
}

/// The whole settings document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub app_settings: AppSettings,
    pub logic_settings: LogicSettings,
}

impl Settings {
    /// Parse a settings document
    ///
    /// Both sections must be present and be objects. Fields missing inside a
    /// section take their defaults (`false`, empty string).
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let root: serde_json::Value = serde_json::from_str(content)?;
        let root = root.as_object().ok_or(ConfigError::NotAnObject)?;

        let section = |name: &'static str| {
            root.get(name)
                .filter(|value| value.is_object())
                .cloned()
                .ok_or(ConfigError::MissingSection(name))
        };

        let app_settings = serde_json::from_value(section("appSettings")?)?;
        let logic_settings = serde_json::from_value(section("logicSettings")?)?;

        Ok(Self {
            app_settings,
            logic_settings,
        })
    }

    /// Read and parse the settings file at `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json_str(&content)
    }

    /// Write the settings to `path` as pretty-printed JSON
    ///
    /// With `overwrite == false` an existing file is left alone and
    /// [`ConfigError::AlreadyExists`] is returned.
    pub fn save(&self, path: &Path, overwrite: bool) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;

        let mut options = OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let write_err = |source: std::io::Error| {
            if source.kind() == std::io::ErrorKind::AlreadyExists {
                ConfigError::AlreadyExists(path.to_path_buf())
            } else {
                ConfigError::Write {
                    path: path.to_path_buf(),
                    source,
                }
            }
        };

        let mut file = options.open(path).map_err(write_err)?;
        file.write_all(content.as_bytes()).map_err(write_err)?;
        file.write_all(b"\n").map_err(write_err)?;
        Ok(())
    }
}
