use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use courier::app::App;
use courier::config::AppConfig;
use courier::logging::{self, PipelineLayer};
use courier::notify;

/// How long shutdown waits for queued log lines before stopping the writer
const LOG_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load(&AppConfig::config_file_path())?;

    // Subscribe before anything can fail so startup errors reach the user
    let (subscriber, mut receiver) = notify::channel(config.notification_buffer);
    let app = App::with_subscriber(config, subscriber)?;
    let presenter = tokio::spawn(async move {
        while let Some(notification) = receiver.recv().await {
            println!("[{}] {}", notification.kind, notification.text);
        }
    });

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(PipelineLayer::new(Arc::clone(app.log())))
        .init();

    app.load_settings();

    match logging::cleanup_old_logs(&app.config().logs_dir(), app.config().log_retention_days) {
        Ok(0) => {}
        Ok(count) => app.log().info(format!("Cleaned up {} old log files", count)),
        Err(e) => app.log().warning(format!("Log cleanup failed: {:#}", e)),
    }

    app.log().info("Starting app");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    app.log().info("Shutting down");
    let drained = tokio::time::timeout(LOG_DRAIN_TIMEOUT, async {
        while app.log().pending() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    if drained.is_err() {
        tracing::warn!(pending = app.log().pending(), "Log queue not drained before shutdown");
    }

    app.shutdown();
    presenter.abort();

    Ok(())
}
