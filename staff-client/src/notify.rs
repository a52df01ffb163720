//! User-facing notifications
//!
//! Every failure is logged where it happens and then converted into one of
//! a small set of uniform notifications. Presentation of those (toast,
//! status line, log) belongs to whoever implements [`Notifier`].

use std::sync::Mutex;

use tokio::sync::mpsc;

/// Notification texts shown by the employee screen
pub mod messages {
    pub const SUCCESS: &str = "Success";
    pub const ERROR: &str = "Error";

    pub const EMPLOYEE_ADDED: &str = "Employee added successfully!";
    pub const EMPLOYEE_UPDATED: &str = "Employee updated successfully!";
    pub const EMPLOYEE_DELETED: &str = "Employee deleted successfully!";

    pub const SAVE_FAILED: &str = "Failed to save employee. Please try again.";
    pub const FETCH_FAILED: &str = "Failed to fetch employees.";
    pub const DELETE_FAILED: &str = "Failed to delete employee.";

    pub const LOGIN_REQUIRED: &str = "You must be logged in to manage employees.";
    pub const AUTH_REQUIRED_TITLE: &str = "Authentication Required";
    pub const AUTH_REQUIRED: &str = "Please sign in to access employee management.";

    pub const DELETE_PROMPT: &str = "Are you sure you want to delete this employee?";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationVariant {
    #[default]
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
}

impl Notification {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        variant: NotificationVariant,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant,
        }
    }

    pub fn success(description: impl Into<String>) -> Self {
        Self::new(messages::SUCCESS, description, NotificationVariant::Default)
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self::new(messages::ERROR, description, NotificationVariant::Destructive)
    }

    /// "You must be logged in" raised when a mutation finds no session
    pub fn login_required() -> Self {
        Self::error(messages::LOGIN_REQUIRED)
    }

    /// Raised once when the screen boots without a session
    pub fn auth_required() -> Self {
        Self::new(
            messages::AUTH_REQUIRED_TITLE,
            messages::AUTH_REQUIRED,
            NotificationVariant::Destructive,
        )
    }

    pub fn is_error(&self) -> bool {
        self.variant == NotificationVariant::Destructive
    }
}

/// Notification sink
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.variant {
            NotificationVariant::Default => {
                tracing::info!(title = %n.title, "{}", n.description)
            }
            NotificationVariant::Destructive => {
                tracing::warn!(title = %n.title, "{}", n.description)
            }
        }
    }
}

/// Forwards notifications to a UI loop
///
/// Once the UI side is gone, notifications go to the log instead.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if let Err(mpsc::error::SendError(notification)) = self.tx.send(notification) {
            TracingNotifier.notify(notification);
        }
    }
}

impl ChannelNotifier {
    /// `true` once the UI side dropped its receiver
    pub fn is_detached(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Drains what was recorded so far
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let ok = Notification::success(messages::EMPLOYEE_ADDED);
        assert_eq!(ok.title, "Success");
        assert!(!ok.is_error());

        let err = Notification::error(messages::FETCH_FAILED);
        assert_eq!(err.title, "Error");
        assert!(err.is_error());

        assert_eq!(Notification::auth_required().title, "Authentication Required");
    }

    #[test]
    fn test_recording_notifier_take_drains() {
        let notifier = RecordingNotifier::new();
        notifier.notify(Notification::error(messages::DELETE_FAILED));
        assert_eq!(notifier.take().len(), 1);
        assert!(notifier.all().is_empty());
    }

    #[tokio::test]
    async fn test_channel_notifier_forwards() {
        let (notifier, mut rx) = ChannelNotifier::channel();
        notifier.notify(Notification::success(messages::EMPLOYEE_DELETED));
        let got = rx.recv().await.unwrap();
        assert_eq!(got.description, "Employee deleted successfully!");
        assert!(!notifier.is_detached());
    }

    #[test]
    fn test_channel_notifier_falls_back_to_log_when_detached() {
        let (notifier, rx) = ChannelNotifier::channel();
        drop(rx);
        assert!(notifier.is_detached());
        notifier.notify(Notification::error(messages::FETCH_FAILED));
    }
}
