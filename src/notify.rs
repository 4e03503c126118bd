//! User-visible notifications.
//!
//! Fire-and-forget signals emitted once per completed or failed operation.
//! They are not part of the data contract.

use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn success(&self, message: &str) {
        self.notify(Notification {
            kind: NotificationKind::Success,
            message: message.to_string(),
        });
    }

    fn failure(&self, message: &str) {
        self.notify(Notification {
            kind: NotificationKind::Failure,
            message: message.to_string(),
        });
    }
}

/// Prints to stderr unless silenced.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier {
    pub silent: bool,
}

impl ConsoleNotifier {
    pub fn new(silent: bool) -> Self {
        Self { silent }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        if self.silent {
            return;
        }
        match notification.kind {
            NotificationKind::Success => eprintln!("ok: {}", notification.message),
            NotificationKind::Failure => eprintln!("failed: {}", notification.message),
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.entries.lock().iter().filter(|n| n.kind == kind).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.entries.lock().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_notifier_keeps_order_and_kind() {
        let notifier = RecordingNotifier::new();
        notifier.success("Task created");
        notifier.failure("Could not delete task");

        assert_eq!(notifier.count(NotificationKind::Success), 1);
        assert_eq!(notifier.count(NotificationKind::Failure), 1);
        let taken = notifier.take();
        assert_eq!(taken[0].message, "Task created");
        assert_eq!(taken[1].kind, NotificationKind::Failure);
        assert!(notifier.entries().is_empty());
    }
}
