//! Application core: owns the pipelines and the settings store
//!
//! Everything is constructed once and handed out by reference; there is no
//! global logger. Startup is two-phase: [`App::with_subscriber`] (or
//! [`App::new`]) starts the pipelines, then [`App::load_settings`] reads the
//! settings file. Anything reported in between reaches the subscriber.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{ConfigError, ErrorReporter};
use crate::logging::LogPipeline;
use crate::notify::{NotificationPipeline, NotificationSubscriber};
use crate::settings::SettingsStore;

const SETTINGS_UNAVAILABLE: &str = "Could not find config file or incorrect file structure";
const SETTINGS_SAVED: &str = "Config was saved";

/// Wiring of the log pipeline, notification pipeline and settings
pub struct App {
    config: AppConfig,
    settings: SettingsStore,
    notifications: Arc<NotificationPipeline>,
    log: Arc<LogPipeline>,
    full_screen: AtomicBool,
}

impl App {
    /// Start both pipelines without a notification subscriber
    ///
    /// Notifications sent before [`NotificationPipeline::subscribe`] is called
    /// are dropped. Settings are not read yet; see [`App::load_settings`].
    pub fn new(config: AppConfig) -> Result<Self> {
        Self::assemble(config, NotificationPipeline::new()?)
    }

    /// Start both pipelines with `subscriber` already registered, so errors
    /// raised while opening the first log file are delivered
    pub fn with_subscriber<S>(config: AppConfig, subscriber: S) -> Result<Self>
    where
        S: NotificationSubscriber + 'static,
    {
        let notifications = NotificationPipeline::new()?;
        notifications.subscribe(subscriber);
        Self::assemble(config, notifications)
    }

    fn assemble(config: AppConfig, notifications: NotificationPipeline) -> Result<Self> {
        let notifications = Arc::new(notifications);
        let reporter: Arc<dyn ErrorReporter> = notifications.clone();
        let log = Arc::new(LogPipeline::new(config.log.clone(), reporter)?);
        let settings = SettingsStore::new(&config.settings_path);

        Ok(Self {
            config,
            settings,
            notifications,
            log,
            full_screen: AtomicBool::new(false),
        })
    }

    /// Read the settings file and apply the log level and full-screen flag
    ///
    /// A missing or malformed settings file is not an error here: it is logged,
    /// an error notification is sent, and defaults stay in effect. Returns
    /// whether the file was loaded.
    pub fn load_settings(&self) -> bool {
        let loaded = match self.settings.read() {
            Ok(loaded) => {
                self.log.set_threshold_name(&loaded.logic_settings.log_lvl);
                self.set_full_screen(loaded.app_settings.full_screen);
                true
            }
            Err(e) => {
                warn!(error = %e, path = %self.config.settings_path.display(), "Settings not loaded");
                self.log.error(SETTINGS_UNAVAILABLE);
                self.notifications.send_error(SETTINGS_UNAVAILABLE);
                false
            }
        };

        info!(threshold = %self.log.threshold(), "Application core started");
        loaded
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn log(&self) -> &Arc<LogPipeline> {
        &self.log
    }

    pub fn notifications(&self) -> &Arc<NotificationPipeline> {
        &self.notifications
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn full_screen(&self) -> bool {
        self.full_screen.load(Ordering::Relaxed)
    }

    pub fn set_full_screen(&self, full_screen: bool) {
        self.full_screen.store(full_screen, Ordering::Relaxed);
    }

    /// Record a user action (e.g. a button press) in the log
    pub fn record_action(&self, id: u32) {
        self.log.info(format!("Button {} has been clicked.", id));
    }

    /// Store the current preferences in the settings file, overwriting it
    ///
    /// The outcome is also announced through a notification.
    pub fn save_settings(&self) -> Result<(), ConfigError> {
        let full_screen = self.full_screen();
        self.settings
            .update_app_settings(|app| app.full_screen = full_screen);

        match self.settings.save(true) {
            Ok(()) => {
                self.notifications.send_info(SETTINGS_SAVED);
                Ok(())
            }
            Err(e) => {
                self.notifications.send_error(e.to_string());
                Err(e)
            }
        }
    }

    /// Stop both pipelines. Safe to call from several exit paths.
    pub fn shutdown(&self) {
        self.log.stop();
        self.notifications.stop();
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogPipelineConfig, Severity};
    use crate::notify::{Notification, NotificationKind};
    use crate::pipeline::Lifecycle;
    use crate::test_support::{read_log_lines, wait_until};
    use std::sync::mpsc;
    use std::time::Duration;
    use tempfile::TempDir;

    const RECV_TIMEOUT: Duration = Duration::from_secs(5);

    fn test_config(temp_dir: &TempDir) -> AppConfig {
        AppConfig {
            settings_path: temp_dir.path().join("config.json"),
            log: LogPipelineConfig {
                dir: Some(temp_dir.path().join("logs")),
                ..LogPipelineConfig::default()
            },
            ..AppConfig::default()
        }
    }

    fn write_settings(temp_dir: &TempDir, json: &str) {
        std::fs::write(temp_dir.path().join("config.json"), json).unwrap();
    }

    fn channel_app(config: AppConfig) -> (App, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel();
        let app = App::with_subscriber(config, move |n: Notification| {
            let _ = tx.send(n);
        })
        .unwrap();
        (app, rx)
    }

    #[test]
    fn test_settings_seed_threshold_and_full_screen() {
        let temp_dir = TempDir::new().unwrap();
        write_settings(
            &temp_dir,
            r#"{"appSettings":{"fullScreen":true,"enableDebugMode":false},"logicSettings":{"logLvl":"ERROR"}}"#,
        );

        let app = App::new(test_config(&temp_dir)).unwrap();
        assert_eq!(app.log().threshold(), Severity::Info);
        assert!(!app.full_screen());

        assert!(app.load_settings());
        assert_eq!(app.log().threshold(), Severity::Error);
        assert!(app.full_screen());
    }

    #[test]
    fn test_missing_settings_logs_error_and_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let logs_dir = config.logs_dir();

        let app = App::new(config).unwrap();
        assert!(!app.load_settings());

        assert!(wait_until(|| !read_log_lines(&logs_dir).is_empty()));
        let lines = read_log_lines(&logs_dir);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(&format!("[ERROR] {}", SETTINGS_UNAVAILABLE)));
        assert_eq!(app.log().threshold(), Severity::Info);
        assert!(!app.full_screen());
    }

    #[test]
    fn test_missing_settings_error_reaches_early_subscriber() {
        let temp_dir = TempDir::new().unwrap();
        let (app, rx) = channel_app(test_config(&temp_dir));

        assert!(!app.load_settings());

        assert_eq!(
            rx.recv_timeout(RECV_TIMEOUT).unwrap(),
            Notification::error(SETTINGS_UNAVAILABLE)
        );
    }

    #[test]
    fn test_log_file_error_reaches_early_subscriber() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not_a_dir");
        std::fs::write(&blocker, "file").unwrap();
        let config = AppConfig {
            settings_path: temp_dir.path().join("config.json"),
            log: LogPipelineConfig {
                dir: Some(blocker),
                ..LogPipelineConfig::default()
            },
            ..AppConfig::default()
        };

        let (_app, rx) = channel_app(config);

        let notification = rx.recv_timeout(RECV_TIMEOUT).unwrap();
        assert_eq!(notification.kind, NotificationKind::Error);
        assert!(notification.text.contains("not_a_dir"));
    }

    #[test]
    fn test_level_errors_become_notifications() {
        let temp_dir = TempDir::new().unwrap();
        write_settings(
            &temp_dir,
            r#"{"appSettings":{},"logicSettings":{"logLvl":"WARNING"}}"#,
        );
        let (app, rx) = channel_app(test_config(&temp_dir));
        assert!(app.load_settings());

        app.log().set_threshold_name("LOUD");

        assert_eq!(
            rx.recv_timeout(RECV_TIMEOUT).unwrap(),
            Notification::error("Incorrect log level string: LOUD")
        );
    }

    #[test]
    fn test_invalid_log_level_keeps_default_and_notifies() {
        let temp_dir = TempDir::new().unwrap();
        write_settings(
            &temp_dir,
            r#"{"appSettings":{},"logicSettings":{"logLvl":"LOUD"}}"#,
        );

        let (app, rx) = channel_app(test_config(&temp_dir));
        assert!(app.load_settings());

        assert_eq!(app.log().threshold(), Severity::Info);
        assert_eq!(
            rx.recv_timeout(RECV_TIMEOUT).unwrap(),
            Notification::error("Incorrect log level string: LOUD")
        );
    }

    #[test]
    fn test_record_action() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let logs_dir = config.logs_dir();
        write_settings(
            &temp_dir,
            r#"{"appSettings":{},"logicSettings":{"logLvl":"INFO"}}"#,
        );

        let app = App::new(config).unwrap();
        assert!(app.load_settings());
        app.record_action(7);

        assert!(wait_until(|| !read_log_lines(&logs_dir).is_empty()));
        assert!(read_log_lines(&logs_dir)[0].ends_with("[INFO] Button 7 has been clicked."));
    }

    #[test]
    fn test_save_settings_persists_full_screen_and_notifies() {
        let temp_dir = TempDir::new().unwrap();
        write_settings(
            &temp_dir,
            r#"{"appSettings":{"fullScreen":false},"logicSettings":{"logLvl":"DEBUG"}}"#,
        );

        let (app, rx) = channel_app(test_config(&temp_dir));
        assert!(app.load_settings());

        app.set_full_screen(true);
        app.save_settings().unwrap();

        assert_eq!(
            rx.recv_timeout(RECV_TIMEOUT).unwrap(),
            Notification::info(SETTINGS_SAVED)
        );

        let saved = crate::settings::Settings::load(&temp_dir.path().join("config.json")).unwrap();
        assert!(saved.app_settings.full_screen);
        assert_eq!(saved.logic_settings.log_lvl, "DEBUG");
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let app = App::new(test_config(&temp_dir)).unwrap();

        app.shutdown();
        app.shutdown();
        assert_eq!(app.log().lifecycle(), Lifecycle::Stopped);
        assert_eq!(app.notifications().lifecycle(), Lifecycle::Stopped);
        drop(app);
    }
}
