//! Error types shared by the pipelines and the settings store
//!
//! None of these errors are fatal. Failures inside a consumer thread are never
//! propagated back to producers; they are handed to an [`ErrorReporter`], which
//! in a running application is the notification pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Settings file could not be read, parsed, or written
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Settings file does not exist: {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to open settings file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("JSON is not an object")]
    NotAnObject,

    #[error("Missing or invalid '{0}' in JSON")]
    MissingSection(&'static str),

    #[error("Settings file already exists and overwrite is disabled: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Failed to write settings file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Log file could not be created, opened, or written
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to write logs into the root directory: {}", .0.display())]
    RootDirectory(PathBuf),

    #[error("Insufficient permissions for directory: {}", .0.display())]
    Permissions(PathBuf),

    #[error("Failed to open log file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write log file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No log file is open; carries the line that could not be persisted
    #[error("{0}")]
    Unavailable(String),
}

/// Unrecognized severity name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Incorrect log level string: {0}")]
pub struct LevelParseError(pub String);

/// Any recoverable error raised by this crate
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    LevelParse(#[from] LevelParseError),
}

/// Receiver of asynchronous error events
///
/// Implementations must not block for long: `report` is called from consumer
/// threads as well as from producer calls.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: CoreError);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse_error_message() {
        let err = LevelParseError("verbose".to_string());
        assert_eq!(err.to_string(), "Incorrect log level string: verbose");
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err: CoreError = ConfigError::MissingSection("appSettings").into();
        assert_eq!(err.to_string(), "Missing or invalid 'appSettings' in JSON");

        let err: CoreError = SinkError::Unavailable("[x] [INFO] hi".to_string()).into();
        assert_eq!(err.to_string(), "[x] [INFO] hi");
    }
}
