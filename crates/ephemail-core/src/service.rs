//! Collaborators the viewer depends on.
//!
//! The viewer never reaches for a global data source, notification system
//! or clipboard; hosts hand implementations of these traits to
//! [`MessageViewer`](crate::MessageViewer) through [`Services`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::Result;
use crate::model::{MessageId, MessageRecord};

/// Boxed, sendable future returned by async collaborators.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Loads a message by identifier.
pub trait MessageSource: Send + Sync {
    /// Fetches the message. The future must not borrow `self`.
    fn fetch(&self, id: &MessageId) -> BoxFuture<Result<MessageRecord>>;
}

/// Deletes the whole temporary inbox.
pub trait InboxDeleter: Send + Sync {
    /// Deletes the inbox. Not assumed to be idempotent.
    fn delete_inbox(&self) -> BoxFuture<Result<()>>;
}

/// Severity of a user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The operation succeeded.
    Success,
    /// The operation failed.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Error => "error",
        })
    }
}

/// Fire-and-forget user notifications.
pub trait Notifier: Send + Sync {
    /// Shows `message` to the user.
    fn notify(&self, severity: Severity, message: &str);
}

/// Platform clipboard.
pub trait Clipboard: Send + Sync {
    /// Replaces the clipboard contents with `text`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Clipboard`](crate::Error::Clipboard) if the platform
    /// refuses the write.
    fn write_text(&self, text: &str) -> Result<()>;
}

/// Bundle of collaborators injected into a viewer.
#[derive(Clone)]
pub struct Services {
    /// Message data source.
    pub source: Arc<dyn MessageSource>,
    /// Inbox deletion.
    pub deleter: Arc<dyn InboxDeleter>,
    /// Notification sink.
    pub notifier: Arc<dyn Notifier>,
    /// Clipboard.
    pub clipboard: Arc<dyn Clipboard>,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
