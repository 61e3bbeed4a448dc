//! Message data models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of the message being viewed.
///
/// An empty string is treated the same as no identifier at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Creates an identifier, returning `None` for an empty or blank value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An email address with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// The mailbox address.
    pub address: String,
    /// Display name, if the sender provided one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Address {
    /// Creates an address without a display name.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => f.write_str(&self.address),
        }
    }
}

/// A fetched message. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    /// Server-side message identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Subject line.
    #[serde(default)]
    pub subject: Option<String>,
    /// Sender.
    pub from: Address,
    /// Recipients, in header order.
    #[serde(default)]
    pub to: Vec<Address>,
    /// Rendered markup fragments, concatenated in order for display.
    #[serde(default)]
    pub html: Vec<String>,
    /// Plain-text body.
    #[serde(default)]
    pub text: Option<String>,
    /// When the message was received.
    pub created_at: DateTime<Utc>,
}

/// Content representation selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    /// Rendered HTML markup.
    #[default]
    Rendered,
    /// Plain-text body.
    PlainText,
    /// Structured dump of the whole record.
    Raw,
}

impl ViewMode {
    /// All modes, in tab order.
    pub const ALL: [Self; 3] = [Self::Rendered, Self::PlainText, Self::Raw];

    /// Tab label for this mode.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rendered => "HTML",
            Self::PlainText => "Text",
            Self::Raw => "Raw",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
