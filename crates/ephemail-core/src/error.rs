//! Error types for the core library.

use thiserror::Error;

use crate::lifecycle::LifecycleState;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The message could not be fetched from the data source.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The inbox could not be deleted.
    #[error("Delete error: {0}")]
    Delete(String),

    /// Writing to the clipboard failed.
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// A lifecycle transition that would skip or revisit a state.
    #[error("Invalid lifecycle transition: {from} -> {to}")]
    InvalidTransition {
        /// State the lifecycle was in.
        from: LifecycleState,
        /// State that was requested.
        to: LifecycleState,
    },

    /// The viewer task is no longer running.
    #[error("Viewer has stopped")]
    Stopped,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
