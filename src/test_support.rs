//! Helpers for observing asynchronous delivery in tests

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread::sleep;
use std::time::{Duration, Instant};

use crate::error::{CoreError, ErrorReporter};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Reporter that keeps every error message it receives, oldest first
#[derive(Debug, Default)]
pub(crate) struct CollectingReporter {
    messages: Mutex<Vec<String>>,
}

impl CollectingReporter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, error: CoreError) {
        self.messages.lock().unwrap().push(error.to_string());
    }
}

/// Poll `condition` until it holds or five seconds pass
pub(crate) fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + POLL_TIMEOUT;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(POLL_INTERVAL);
    }
}

/// All `.log` files in `dir`, sorted by name
pub(crate) fn log_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "log"))
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}

/// Every line of every `.log` file in `dir`, files in name order
pub(crate) fn read_log_lines(dir: &Path) -> Vec<String> {
    log_files(dir)
        .iter()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .flat_map(|content| {
            content
                .lines()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}
