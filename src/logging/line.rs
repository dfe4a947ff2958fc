//! Log line formatting

use std::fmt;

use chrono::{DateTime, Local};

use super::Severity;

/// Timestamp layout inside a log line
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single entry, stamped when the producer called in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
}

impl LogLine {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            severity,
            message: message.into(),
        }
    }
}

/// `[yyyy-MM-dd hh:mm:ss] [LEVEL] message`
impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.severity,
            self.message
        )
    }
}
