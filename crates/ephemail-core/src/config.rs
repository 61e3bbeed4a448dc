//! Viewer timing configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default lifetime of a viewed message, in seconds.
pub const DEFAULT_TTL_SECS: u32 = 600;
/// Default pause between expiry and deletion, in seconds.
pub const DEFAULT_GRACE_SECS: u64 = 2;
/// Remaining time at or below which the countdown is shown as critical.
pub const DEFAULT_CRITICAL_THRESHOLD_SECS: u32 = 60;
/// Remaining time at or below which the countdown is shown as a warning.
pub const DEFAULT_WARNING_THRESHOLD_SECS: u32 = 300;

/// Timing constants for a viewer lifecycle.
///
/// Thresholds only affect presentation; state transitions depend on
/// `ttl_secs` and `grace_secs` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Total lifetime granted to a message before it expires.
    pub ttl_secs: u32,
    /// Delay between entering `expired` and invoking deletion.
    pub grace_secs: u64,
    /// Critical urgency threshold.
    pub critical_threshold_secs: u32,
    /// Warning urgency threshold.
    pub warning_threshold_secs: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL_SECS,
            grace_secs: DEFAULT_GRACE_SECS,
            critical_threshold_secs: DEFAULT_CRITICAL_THRESHOLD_SECS,
            warning_threshold_secs: DEFAULT_WARNING_THRESHOLD_SECS,
        }
    }
}

impl ViewerConfig {
    /// Returns the grace delay as a [`Duration`].
    #[must_use]
    pub const fn grace_delay(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }

    /// Checks that the configuration describes a usable lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the TTL is zero or the thresholds are
    /// out of order.
    pub fn validate(&self) -> Result<()> {
        if self.ttl_secs == 0 {
            return Err(Error::Config("ttl_secs must be at least 1".into()));
        }
        if self.critical_threshold_secs > self.warning_threshold_secs {
            return Err(Error::Config(format!(
                "critical_threshold_secs ({}) exceeds warning_threshold_secs ({})",
                self.critical_threshold_secs, self.warning_threshold_secs
            )));
        }
        Ok(())
    }
}
