//! Asynchronous, threshold-filtered log pipeline

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::file_sink::FileSink;
use super::line::LogLine;
use super::rotation::{RotatingWriter, DEFAULT_MAX_FILE_SIZE};
use super::Severity;
use crate::error::ErrorReporter;
use crate::pipeline::{Enqueued, Lifecycle, Pipeline, PipelineOptions};

/// Name of the log consumer thread
pub const LOG_THREAD_NAME: &str = "log-writer";

/// Log pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogPipelineConfig {
    /// Directory for log files (default: current directory)
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Name of the first log file (default: timestamped). Rotated files are
    /// always timestamped.
    #[serde(default)]
    pub file_name: Option<String>,

    /// Size in bytes at which the active file is rotated (default: 4 GiB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Initial threshold (default: INFO)
    #[serde(default)]
    pub threshold: Severity,

    /// Queue bound; unbounded when absent
    #[serde(default)]
    pub capacity: Option<usize>,
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

impl Default for LogPipelineConfig {
    fn default() -> Self {
        Self {
            dir: None,
            file_name: None,
            max_file_size: default_max_file_size(),
            threshold: Severity::default(),
            capacity: None,
        }
    }
}

/// Producer side of the log pipeline
///
/// Filtering and formatting happen on the calling thread; file I/O happens on
/// the consumer thread. Share it with `Arc`.
pub struct LogPipeline {
    pipeline: Pipeline<String>,
    threshold: RwLock<Severity>,
    reporter: Arc<dyn ErrorReporter>,
}

impl LogPipeline {
    /// Open the initial log file and start the consumer thread.
    ///
    /// A log file that cannot be created or opened does not fail construction:
    /// the error is reported and the pipeline runs without persistence. Only a
    /// failure to spawn the thread is returned.
    pub fn new(config: LogPipelineConfig, reporter: Arc<dyn ErrorReporter>) -> Result<Self> {
        let writer = RotatingWriter::open(
            FileSink::new(),
            config.dir.clone(),
            config.file_name.as_deref(),
            config.max_file_size,
            Arc::clone(&reporter),
        );

        let mut options = PipelineOptions::new(LOG_THREAD_NAME);
        if let Some(capacity) = config.capacity {
            options = options.with_capacity(capacity);
        }

        Ok(Self {
            pipeline: Pipeline::spawn(options, writer)?,
            threshold: RwLock::new(config.threshold),
            reporter,
        })
    }

    pub fn threshold(&self) -> Severity {
        *self.threshold.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies to every later `log` call; lines already queued are unaffected
    pub fn set_threshold(&self, level: Severity) {
        *self.threshold.write().unwrap_or_else(PoisonError::into_inner) = level;
    }

    /// Set the threshold from its name (`"TRACE"` ... `"FATAL"`).
    ///
    /// An unknown name leaves the threshold as it was and reports one
    /// [`LevelParseError`](crate::error::LevelParseError).
    pub fn set_threshold_name(&self, name: &str) {
        match name.parse::<Severity>() {
            Ok(level) => self.set_threshold(level),
            Err(e) => {
                warn!(name, "Ignoring unknown log level");
                self.reporter.report(e.into());
            }
        }
    }

    /// Whether a message at `level` would be written
    pub fn is_enabled(&self, level: Severity) -> bool {
        level != Severity::Off && level >= self.threshold()
    }

    /// Format and queue `message` unless it is below the threshold
    pub fn log(&self, level: Severity, message: impl Into<String>) {
        if !self.is_enabled(level) {
            return;
        }

        let line = LogLine::new(level, message).to_string();
        if let Enqueued::Full = self.pipeline.enqueue(line) {
            warn!("Log queue full, dropping line");
        }
    }

    pub fn trace(&self, message: impl Into<String>) {
        self.log(Severity::Trace, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(Severity::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Severity::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(Severity::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Severity::Error, message);
    }

    pub fn fatal(&self, message: impl Into<String>) {
        self.log(Severity::Fatal, message);
    }

    /// Stop the writer thread. Idempotent; lines still queued are discarded.
    pub fn stop(&self) {
        self.pipeline.stop();
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.pipeline.lifecycle()
    }

    /// Lines waiting to be written
    pub fn pending(&self) -> usize {
        self.pipeline.pending()
    }
}
