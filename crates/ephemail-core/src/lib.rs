//! # ephemail-core
//!
//! Lifecycle controller for ephemeral email messages.
//!
//! This crate provides:
//! - **Content formatting** - rendered markup, plain text and raw dumps of a message
//! - **Countdown** - once-per-second lifetime countdown with a single exhaustion signal
//! - **Expiry lifecycle** - forward-only `active → expired → deleting → closed` state machine
//! - **Message viewer** - orchestrator wiring fetch, countdown, deletion and clipboard together

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod countdown;
mod error;
pub mod format;
pub mod lifecycle;
pub mod model;
pub mod service;
pub mod timer;
pub mod viewer;

pub use config::ViewerConfig;
pub use countdown::{Countdown, CountdownEvent};
pub use error::{Error, Result};
pub use format::{Content, MessageHeader, Urgency, copy_text, format_content, format_remaining};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use model::{Address, MessageId, MessageRecord, ViewMode};
pub use service::{
    BoxFuture, Clipboard, InboxDeleter, MessageSource, Notifier, Services, Severity,
};
pub use timer::TimerHandle;
pub use viewer::{CloseCallback, FetchStatus, MessageViewer, ViewerHandle, ViewerSnapshot};
