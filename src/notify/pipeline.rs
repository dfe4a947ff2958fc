//! Notification forwarding pipeline

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use anyhow::Result;
use tracing::warn;

use super::{MessageLevel, Notification, NotificationKind, NotificationSubscriber};
use crate::error::{CoreError, ErrorReporter};
use crate::pipeline::{Enqueued, Lifecycle, Pipeline, PipelineOptions};

/// Name of the notification consumer thread
pub const NOTIFY_THREAD_NAME: &str = "notify-forwarder";

type SubscriberSlot = Arc<Mutex<Option<Box<dyn NotificationSubscriber>>>>;

/// Queues notifications and forwards them to at most one subscriber
pub struct NotificationPipeline {
    pipeline: Pipeline<Notification>,
    subscriber: SubscriberSlot,
    min_level: RwLock<MessageLevel>,
}

impl NotificationPipeline {
    pub fn new() -> Result<Self> {
        Self::with_options(PipelineOptions::new(NOTIFY_THREAD_NAME))
    }

    pub fn with_options(options: PipelineOptions) -> Result<Self> {
        let subscriber: SubscriberSlot = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&subscriber);

        let pipeline = Pipeline::spawn(options, move |notification: Notification| {
            let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(subscriber) = slot.as_mut() {
                subscriber.deliver(notification);
            }
        })?;

        Ok(Self {
            pipeline,
            subscriber,
            min_level: RwLock::new(MessageLevel::default()),
        })
    }

    /// Register the subscriber, replacing any previous one
    pub fn subscribe<S>(&self, subscriber: S)
    where
        S: NotificationSubscriber + 'static,
    {
        *self.lock_subscriber() = Some(Box::new(subscriber));
    }

    /// Remove the subscriber. Returns whether one was registered.
    pub fn unsubscribe(&self) -> bool {
        self.lock_subscriber().take().is_some()
    }

    pub fn has_subscriber(&self) -> bool {
        self.lock_subscriber().is_some()
    }

    pub fn min_level(&self) -> MessageLevel {
        *self.min_level.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stored for callers to inspect; sending never consults it
    pub fn set_min_level(&self, level: MessageLevel) {
        *self.min_level.write().unwrap_or_else(PoisonError::into_inner) = level;
    }

    /// Queue a notification for the subscriber
    pub fn notify(&self, kind: NotificationKind, text: impl Into<String>) {
        if let Enqueued::Full = self.pipeline.enqueue(Notification::new(kind, text)) {
            warn!(%kind, "Notification queue full, dropping notification");
        }
    }

    pub fn send_info(&self, text: impl Into<String>) {
        self.notify(NotificationKind::Info, text);
    }

    pub fn send_warning(&self, text: impl Into<String>) {
        self.notify(NotificationKind::Warning, text);
    }

    pub fn send_error(&self, text: impl Into<String>) {
        self.notify(NotificationKind::Error, text);
    }

    /// Stop forwarding. Safe to call from several shutdown paths; only the
    /// first call has an effect.
    pub fn stop(&self) {
        self.pipeline.stop();
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.pipeline.lifecycle()
    }

    fn lock_subscriber(
        &self,
    ) -> std::sync::MutexGuard<'_, Option<Box<dyn NotificationSubscriber>>> {
        self.subscriber
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Errors surface to the user as error notifications
impl ErrorReporter for NotificationPipeline {
    fn report(&self, error: CoreError) {
        self.send_error(error.to_string());
    }
}
