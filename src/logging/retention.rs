//! Removal of rotated log files past their retention period

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};

use super::file_sink::{LOG_FILE_EXTENSION, LOG_FILE_PREFIX};

/// Default retention period in days
pub const DEFAULT_RETENTION_DAYS: u64 = 30;

fn is_generated_log(name: &str) -> bool {
    name.starts_with(LOG_FILE_PREFIX)
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext == LOG_FILE_EXTENSION)
}

/// Delete generated log files (`log_*.log`) last modified more than
/// `retention_days` ago. Other files are never touched.
///
/// Returns the number of files deleted; a missing directory counts as zero.
pub fn cleanup_old_logs(logs_dir: &Path, retention_days: u64) -> Result<usize> {
    if !logs_dir.exists() {
        return Ok(0);
    }

    let cutoff = SystemTime::now()
        .checked_sub(Duration::from_secs(retention_days * 24 * 60 * 60))
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let entries = fs::read_dir(logs_dir)
        .with_context(|| format!("Failed to list {}", logs_dir.display()))?;

    let mut deleted = 0;
    for entry in entries.flatten() {
        let generated = entry
            .file_name()
            .to_str()
            .is_some_and(is_generated_log);
        if !generated {
            continue;
        }

        let expired = entry
            .metadata()
            .and_then(|m| m.modified())
            .is_ok_and(|modified| modified < cutoff);
        if expired && fs::remove_file(entry.path()).is_ok() {
            deleted += 1;
        }
    }

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_generated_log() {
        assert!(is_generated_log("log_2024-03-07_15-04-05.log"));
        assert!(is_generated_log("log_2024-03-07_15-04-05_2.log"));
        assert!(!is_generated_log("app.log"));
        assert!(!is_generated_log("log_notes.txt"));
    }

    #[test]
    fn test_missing_dir() {
        let count = cleanup_old_logs(Path::new("/nonexistent/courier/logs"), 1).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_keeps_recent_and_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        let recent = temp_dir.path().join("log_2024-03-07_15-04-05.log");
        let foreign = temp_dir.path().join("config.json");
        fs::write(&recent, b"[x] [INFO] hi\n").unwrap();
        fs::write(&foreign, b"{}").unwrap();

        assert_eq!(cleanup_old_logs(temp_dir.path(), 1).unwrap(), 0);
        assert!(recent.exists());
        assert!(foreign.exists());
    }

    #[test]
    fn test_zero_retention_removes_generated_logs_only() {
        let temp_dir = TempDir::new().unwrap();
        let generated = temp_dir.path().join("log_2024-03-07_15-04-05.log");
        let named = temp_dir.path().join("session.log");
        fs::write(&generated, b"").unwrap();
        fs::write(&named, b"").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(cleanup_old_logs(temp_dir.path(), 0).unwrap(), 1);
        assert!(!generated.exists());
        assert!(named.exists());
    }
}
