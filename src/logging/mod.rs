//! Asynchronous file logging
//!
//! Producers filter and format on their own thread; a dedicated writer thread
//! appends to a size-rotated log file. A `tracing` layer can feed the same
//! pipeline.

mod bridge;
mod file_sink;
mod line;
mod pipeline;
mod retention;
mod rotation;
mod severity;

pub use bridge::PipelineLayer;
pub use file_sink::{default_log_file_name, FileSink, LOG_FILE_EXTENSION, LOG_FILE_PREFIX};
pub use line::{LogLine, TIMESTAMP_FORMAT};
pub use pipeline::{LogPipeline, LogPipelineConfig, LOG_THREAD_NAME};
pub use retention::{cleanup_old_logs, DEFAULT_RETENTION_DAYS};
pub use rotation::{LogFile, RotatingWriter, DEFAULT_MAX_FILE_SIZE};
pub use severity::Severity;
