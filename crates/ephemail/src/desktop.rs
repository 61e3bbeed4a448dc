//! Desktop integrations: notifications and the system clipboard.

use ephemail_core::{Clipboard, Notifier, Severity};
use notify_rust::Notification;
use tokio::sync::watch;

/// A notification as shown in the terminal status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub severity: Severity,
    /// Text shown to the user.
    pub message: String,
}

/// Sends notifications to the desktop and to the terminal view.
pub struct DesktopNotifier {
    notices: watch::Sender<Option<Notice>>,
    desktop: bool,
}

impl DesktopNotifier {
    /// Creates a notifier. Returns the receiver the terminal view listens on.
    pub fn new(desktop: bool) -> (Self, watch::Receiver<Option<Notice>>) {
        let (notices, rx) = watch::channel(None);
        (Self { notices, desktop }, rx)
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        self.notices.send_replace(Some(Notice {
            severity,
            message: message.to_string(),
        }));

        if !self.desktop {
            return;
        }
        let mut notification = Notification::new();
        notification.summary("Ephemail").body(message);
        if severity == Severity::Error {
            notification.icon("dialog-error");
        }
        // Showing a notification talks to the session bus; keep it off the viewer task.
        tokio::task::spawn_blocking(move || {
            if let Err(e) = notification.show() {
                tracing::debug!("desktop notification failed: {}", e);
            }
        });
    }
}

/// The system clipboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> ephemail_core::Result<()> {
        arboard::Clipboard::new()
            .and_then(|mut clipboard| clipboard.set_text(text.to_owned()))
            .map_err(|e| ephemail_core::Error::Clipboard(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notice_reaches_terminal_view() {
        let (notifier, rx) = DesktopNotifier::new(false);
        notifier.notify(Severity::Error, "Failed to copy message");
        assert_eq!(
            *rx.borrow(),
            Some(Notice {
                severity: Severity::Error,
                message: "Failed to copy message".into(),
            })
        );
    }
}
