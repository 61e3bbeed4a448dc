//! Expiry and deletion state machine.
//!
//! A viewed message moves strictly forward through
//! `active → expired → deleting → closed`. [`Lifecycle::advance`] is the
//! only way to change state and refuses any transition that would skip or
//! revisit a state, so "deletion at most once" follows from the type.

use std::fmt;

use tracing::debug;

use crate::{Error, Result};

/// Stage of a viewed message's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    /// Countdown running.
    #[default]
    Active,
    /// Countdown exhausted; waiting out the grace delay.
    Expired,
    /// Deletion in flight.
    Deleting,
    /// Terminal. The host should unmount the viewer.
    Closed,
}

impl LifecycleState {
    /// The only state this one may move to, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Active => Some(Self::Expired),
            Self::Expired => Some(Self::Deleting),
            Self::Deleting => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    /// Returns true if moving to `to` is an allowed transition.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        self.next() == Some(to)
    }

    /// Returns true for the terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Deleting => "deleting",
            Self::Closed => "closed",
        })
    }
}

/// Forward-only holder of a [`LifecycleState`].
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    /// Creates a lifecycle in the `active` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Moves to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] and leaves the state untouched if
    /// `to` is not the immediate successor of the current state.
    pub fn advance(&mut self, to: LifecycleState) -> Result<()> {
        if !self.state.can_transition_to(to) {
            return Err(Error::InvalidTransition {
                from: self.state,
                to,
            });
        }
        debug!(from = %self.state, %to, "lifecycle transition");
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    const ALL: [LifecycleState; 4] = [
        LifecycleState::Active,
        LifecycleState::Expired,
        LifecycleState::Deleting,
        LifecycleState::Closed,
    ];

    #[test]
    fn test_forward_path() {
        let mut lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Active);
        assert_ok!(lifecycle.advance(LifecycleState::Expired));
        assert_ok!(lifecycle.advance(LifecycleState::Deleting));
        assert_ok!(lifecycle.advance(LifecycleState::Closed));
        assert!(lifecycle.state().is_terminal());
    }

    #[test]
    fn test_skips_rejected() {
        let mut lifecycle = Lifecycle::new();
        assert_err!(lifecycle.advance(LifecycleState::Deleting));
        assert_err!(lifecycle.advance(LifecycleState::Closed));
        assert_eq!(lifecycle.state(), LifecycleState::Active);
    }

    #[test]
    fn test_deleting_entered_once() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(LifecycleState::Expired).unwrap();
        lifecycle.advance(LifecycleState::Deleting).unwrap();
        let err = lifecycle.advance(LifecycleState::Deleting).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                from: LifecycleState::Deleting,
                to: LifecycleState::Deleting
            }
        ));
    }

    #[test]
    fn test_no_backward_transitions() {
        for (i, from) in ALL.iter().enumerate() {
            for to in &ALL[..=i] {
                assert!(!from.can_transition_to(*to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_closed_is_terminal() {
        assert_eq!(LifecycleState::Closed.next(), None);
        assert!(ALL.iter().all(|s| !LifecycleState::Closed.can_transition_to(*s)));
    }
}
