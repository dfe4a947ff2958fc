//! Size-based log file rotation
//!
//! [`RotatingWriter`] runs on the log consumer thread and is the only owner of
//! the active [`LogFile`].

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::file_sink::FileSink;
use crate::error::{ErrorReporter, SinkError};
use crate::pipeline::Consumer;

const KILOBYTE: u64 = 1024;
const MEGABYTE: u64 = 1024 * KILOBYTE;
const GIGABYTE: u64 = 1024 * MEGABYTE;

/// Default size at which the active log file is replaced
pub const DEFAULT_MAX_FILE_SIZE: u64 = 4 * GIGABYTE;

/// An open log file and the number of bytes it holds
#[derive(Debug)]
pub struct LogFile {
    path: PathBuf,
    file: File,
    size: u64,
}

impl LogFile {
    /// Open (or create) `path` for appending
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| SinkError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let size = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            path: path.to_path_buf(),
            file,
            size,
        })
    }

    /// Append `line` plus a newline and flush
    pub fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        let result = writeln!(self.file, "{}", line).and_then(|_| self.file.flush());
        result.map_err(|source| SinkError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.size += line.len() as u64 + 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Consumer that writes formatted lines to a size-rotated file
///
/// Failures never stop the writer: each failed line is reported and the next
/// one is attempted as usual. Without an open file every line is reported as
/// [`SinkError::Unavailable`].
pub struct RotatingWriter {
    sink: FileSink,
    dir: Option<PathBuf>,
    active: Option<LogFile>,
    max_file_size: u64,
    reporter: Arc<dyn ErrorReporter>,
}

impl RotatingWriter {
    /// Acquire the initial file. Failure is reported, not returned.
    pub fn open(
        sink: FileSink,
        dir: Option<PathBuf>,
        file_name: Option<&str>,
        max_file_size: u64,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let mut writer = Self {
            sink,
            dir,
            active: None,
            max_file_size,
            reporter,
        };

        match writer.acquire(file_name) {
            Ok(file) => {
                debug!(path = %file.path().display(), "Opened log file");
                writer.active = Some(file);
            }
            Err(e) => {
                warn!(error = %e, "Log file unavailable, running without persistence");
                writer.reporter.report(e.into());
            }
        }

        writer
    }

    /// Path of the file currently written to
    pub fn active_path(&self) -> Option<&Path> {
        self.active.as_ref().map(LogFile::path)
    }

    pub fn write(&mut self, line: &str) {
        let full = self
            .active
            .as_ref()
            .is_some_and(|file| file.size() >= self.max_file_size);
        if full {
            self.rotate();
        }

        let result = match self.active.as_mut() {
            Some(file) => file.write_line(line),
            None => Err(SinkError::Unavailable(line.to_string())),
        };

        if let Err(e) = result {
            self.reporter.report(e.into());
        }
    }

    fn rotate(&mut self) {
        if let Some(previous) = self.active.take() {
            debug!(
                path = %previous.path().display(),
                size = previous.size(),
                "Rotating log file"
            );
        }

        match self.acquire(None) {
            Ok(file) => self.active = Some(file),
            Err(e) => {
                warn!(error = %e, "Log rotation failed");
                self.reporter.report(e.into());
            }
        }
    }

    fn acquire(&self, file_name: Option<&str>) -> Result<LogFile, SinkError> {
        let path = self.sink.create_file(self.dir.as_deref(), file_name)?;
        LogFile::open(&path)
    }
}

impl Consumer<String> for RotatingWriter {
    fn consume(&mut self, line: String) {
        self.write(&line);
    }
}
