//! User-facing notifications
//!
//! Notifications are queued by any thread and forwarded, in order, to a single
//! subscriber from a dedicated thread. Nothing here renders them; the
//! subscriber decides how they are presented.

mod pipeline;
mod subscriber;

pub use pipeline::{NotificationPipeline, NOTIFY_THREAD_NAME};
pub use subscriber::{
    channel, ChannelSubscriber, NotificationReceiver, NotificationSubscriber,
    DEFAULT_CHANNEL_BUFFER,
};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of notification, which drives how it is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
}

impl NotificationKind {
    /// Title shown above the message
    pub fn title(&self) -> &'static str {
        match self {
            NotificationKind::Info => "Info",
            NotificationKind::Warning => "Warning",
            NotificationKind::Error => "Error",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A notification event: `{text, kind}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub text: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn new(kind: NotificationKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, text)
    }
}

/// Minimum level setting carried by the notification pipeline
///
/// Stored and exposed, but not used to filter: every notification is
/// forwarded regardless of this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum MessageLevel {
    Debug,
    Warning,
    #[default]
    Error,
    Off,
}
