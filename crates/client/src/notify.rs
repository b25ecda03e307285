//! Delivery of user-facing [`Notification`]s.
//!
//! Notifiers never block the caller: a slow or absent presenter loses
//! notifications rather than stalling a workflow.

use aivoice_core::notification::{Notification, NotificationLevel};
use tokio::sync::mpsc;

/// Receives notifications produced by workflows.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log at a level matching their severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let dismiss_ms = notification.dismiss_after.as_millis() as u64;
        match notification.level {
            NotificationLevel::Error => {
                tracing::error!(dismiss_ms, "{}", notification.message)
            }
            NotificationLevel::Success | NotificationLevel::Info => {
                tracing::info!(level = ?notification.level, dismiss_ms, "{}", notification.message)
            }
        }
    }
}

/// Forwards notifications over a bounded channel, dropping them when
/// the channel is full or closed.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if let Err(e) = self.tx.try_send(notification) {
            tracing::debug!(error = %e, "Notification dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_notifier_delivers() {
        let (notifier, mut rx) = ChannelNotifier::new(4);
        notifier.notify(Notification::success("saved"));
        let n = rx.recv().await.unwrap();
        assert_eq!(n.level, NotificationLevel::Success);
        assert_eq!(n.message, "saved");
    }

    #[tokio::test]
    async fn channel_notifier_drops_when_full() {
        let (notifier, mut rx) = ChannelNotifier::new(1);
        notifier.notify(Notification::info("first"));
        notifier.notify(Notification::info("second"));
        assert_eq!(rx.recv().await.unwrap().message, "first");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn tracing_notifier_does_not_panic() {
        TracingNotifier.notify(Notification::error("boom"));
        TracingNotifier.notify(Notification::info("hello"));
    }
}
