//! Thread-safe holder for the current settings and their file

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::{AppSettings, LogicSettings, Settings};
use crate::error::ConfigError;

/// File name used when no settings path is configured
pub const DEFAULT_SETTINGS_FILE: &str = "config.json";

/// Settings bound to a file path
///
/// Each operation takes the lock once and does its file I/O on a snapshot, so
/// nothing needs to re-enter the lock.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    current: RwLock<Settings>,
}

impl SettingsStore {
    /// Store for `path`, starting from default settings
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(Settings::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the file and make its content current
    ///
    /// On error the current settings are left unchanged.
    pub fn read(&self) -> Result<Settings, ConfigError> {
        let settings = Settings::load(&self.path)?;
        *self.write_lock() = settings.clone();
        debug!(path = %self.path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Persist the current settings
    pub fn save(&self, overwrite: bool) -> Result<(), ConfigError> {
        let snapshot = self.snapshot();
        snapshot.save(&self.path, overwrite)?;
        debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    pub fn snapshot(&self) -> Settings {
        self.read_lock().clone()
    }

    pub fn app_settings(&self) -> AppSettings {
        self.read_lock().app_settings.clone()
    }

    pub fn logic_settings(&self) -> LogicSettings {
        self.read_lock().logic_settings.clone()
    }

    pub fn set_app_settings(&self, app_settings: AppSettings) {
        self.write_lock().app_settings = app_settings;
    }

    pub fn set_logic_settings(&self, logic_settings: LogicSettings) {
        self.write_lock().logic_settings = logic_settings;
    }

    /// Modify the app settings in place under the lock
    pub fn update_app_settings(&self, update: impl FnOnce(&mut AppSettings)) {
        update(&mut self.write_lock().app_settings);
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, Settings> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, Settings> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(DEFAULT_SETTINGS_FILE)
    }
}
