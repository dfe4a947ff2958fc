//! Notification subscribers

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::Notification;

/// Default capacity of the channel created by [`channel`]
pub const DEFAULT_CHANNEL_BUFFER: usize = 64;

/// Receiver of forwarded notifications
///
/// `deliver` runs on the notification thread. It must not call back into
/// [`NotificationPipeline::subscribe`](super::NotificationPipeline::subscribe)
/// or `unsubscribe`.
pub trait NotificationSubscriber: Send {
    fn deliver(&mut self, notification: Notification);
}

impl<F> NotificationSubscriber for F
where
    F: FnMut(Notification) + Send,
{
    fn deliver(&mut self, notification: Notification) {
        self(notification)
    }
}

/// Receiving half used by the presentation layer
pub type NotificationReceiver = mpsc::Receiver<Notification>;

/// Subscriber that hands notifications to an async task over a bounded channel
///
/// Never blocks the notification thread: when the channel is full the
/// notification is dropped, and when the receiver is gone delivery is a no-op.
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    sender: mpsc::Sender<Notification>,
}

impl NotificationSubscriber for ChannelSubscriber {
    fn deliver(&mut self, notification: Notification) {
        match self.sender.try_send(notification) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                warn!(kind = %dropped.kind, "Notification channel full, dropping notification");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Notification receiver gone");
            }
        }
    }
}

/// Create a bounded channel subscriber and its receiver
pub fn channel(buffer: usize) -> (ChannelSubscriber, NotificationReceiver) {
    let (sender, receiver) = mpsc::channel(buffer);
    (ChannelSubscriber { sender }, receiver)
}
