//! Transient user-facing notifications.
//!
//! Mutating actions (login, registration, payment, profile edits) surface
//! their failures here rather than propagating them into the render tree;
//! the embedding shell drains the queue and shows each entry as a toast.
//! Read-query failures do NOT go through this channel - they are rendered
//! inline by the affected view.

use tokio::sync::mpsc;
use tracing::debug;

/// Severity of a notification, mapped to toast styling by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
}

/// A single transient notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

/// Sending half, cloned into every component that performs mutating actions.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Create a notifier and the receiving queue the shell drains.
    pub fn channel() -> (Self, NotificationQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, NotificationQueue { rx })
    }

    /// A notifier whose notifications go nowhere. For tests and headless
    /// embeddings that surface errors some other way.
    pub fn disconnected() -> Self {
        let (tx, _) = mpsc::unbounded_channel();
        Self { tx }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(Level::Info, message.into());
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(Level::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Level::Error, message.into());
    }

    fn push(&self, level: Level, message: String) {
        debug!(?level, %message, "notification");
        // A dropped receiver means the shell has shut down; nothing to do.
        let _ = self.tx.send(Notification { level, message });
    }
}

/// Receiving half, owned by the embedding shell.
#[derive(Debug)]
pub struct NotificationQueue {
    rx: mpsc::UnboundedReceiver<Notification>,
}

impl NotificationQueue {
    /// Wait for the next notification. Returns `None` once all notifiers are
    /// dropped.
    pub async fn next(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    /// Drain everything currently queued without waiting.
    pub fn drain(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = self.rx.try_recv() {
            out.push(n);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notifications_arrive_in_order() {
        let (notifier, mut queue) = Notifier::channel();
        notifier.error("first");
        notifier.success("second");

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, Level::Error);
        assert_eq!(drained[0].message, "first");
        assert_eq!(drained[1].level, Level::Success);
    }

    #[tokio::test]
    async fn disconnected_notifier_does_not_panic() {
        let notifier = Notifier::disconnected();
        notifier.error("nobody is listening");
    }
}
