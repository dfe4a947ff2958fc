//! Log file target creation
//!
//! Resolves where the next log file goes. The returned path is not opened;
//! the caller opens it in append mode.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Local;

use crate::error::SinkError;

/// Prefix shared by every generated log file name
pub const LOG_FILE_PREFIX: &str = "log_";

/// Extension shared by every generated log file name
pub const LOG_FILE_EXTENSION: &str = "log";

/// Generate a timestamped log file name, e.g. `log_2024-03-07_15-04-05.log`
pub fn default_log_file_name() -> String {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("{}{}.{}", LOG_FILE_PREFIX, timestamp, LOG_FILE_EXTENSION)
}

/// Creates log file targets; safe to share between threads
#[derive(Debug, Default)]
pub struct FileSink {
    lock: Mutex<()>,
}

impl FileSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare a log file target
    ///
    /// An absent or empty `dir` means the current directory. The directory is
    /// created if missing and rejected if it is the filesystem root or cannot
    /// be read and written. An absent `file_name` yields a timestamped name,
    /// suffixed with `_1`, `_2`, ... when that name is already taken.
    pub fn create_file(
        &self,
        dir: Option<&Path>,
        file_name: Option<&str>,
    ) -> Result<PathBuf, SinkError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let dir = prepare_dir(dir)?;

        match file_name.filter(|name| !name.is_empty()) {
            Some(name) => Ok(dir.join(name)),
            None => Ok(unused_path(&dir, &default_log_file_name())),
        }
    }
}

fn prepare_dir(dir: Option<&Path>) -> Result<PathBuf, SinkError> {
    let dir = match dir {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|source| SinkError::CreateDir {
            path: dir.clone(),
            source,
        })?;
    }

    let resolved = dir
        .canonicalize()
        .map_err(|_| SinkError::Permissions(dir.clone()))?;

    if resolved.parent().is_none() {
        return Err(SinkError::RootDirectory(dir));
    }

    let metadata = fs::metadata(&resolved).map_err(|_| SinkError::Permissions(dir.clone()))?;
    if !metadata.is_dir() {
        return Err(SinkError::CreateDir {
            path: dir,
            source: std::io::Error::new(std::io::ErrorKind::Other, "path is not a directory"),
        });
    }

    if fs::read_dir(&resolved).is_err() || !is_writable(&resolved) {
        return Err(SinkError::Permissions(dir));
    }

    Ok(dir)
}

/// Permission bits alone don't say whether this process may write (owner,
/// group, ACLs), so try it.
fn is_writable(dir: &Path) -> bool {
    let check = dir.join(format!(".{}write_check_{}", LOG_FILE_PREFIX, std::process::id()));
    match OpenOptions::new().write(true).create_new(true).open(&check) {
        Ok(_) => {
            let _ = fs::remove_file(&check);
            true
        }
        Err(e) => e.kind() == std::io::ErrorKind::AlreadyExists,
    }
}

fn unused_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());

    (1u32..)
        .map(|n| dir.join(format!("{}_{}.{}", stem, n, LOG_FILE_EXTENSION)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}
