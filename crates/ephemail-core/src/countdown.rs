//! Once-per-second countdown of a message's remaining lifetime.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use crate::timer::TimerHandle;

/// Signal produced by a [`Countdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// One second elapsed; the payload is the remaining time.
    Tick(u32),
    /// Remaining time reached zero. Emitted exactly once, last.
    Exhausted,
}

/// Remaining-seconds counter.
///
/// Decrements towards zero and never below it. Once exhausted every further
/// [`tick`](Self::tick) returns `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    exhausted: bool,
}

impl Countdown {
    /// Starts a countdown from `total` seconds.
    #[must_use]
    pub const fn new(total: u32) -> Self {
        Self {
            remaining: total,
            exhausted: false,
        }
    }

    /// Seconds left.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Returns true once the exhaustion event has been produced.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Advances by one second.
    pub fn tick(&mut self) -> Option<CountdownEvent> {
        if self.exhausted {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.exhausted = true;
            Some(CountdownEvent::Exhausted)
        } else {
            Some(CountdownEvent::Tick(self.remaining))
        }
    }
}

/// Runs a [`Countdown`] from `total` on a `period` interval, passing each
/// event to `on_event`. The task ends after [`CountdownEvent::Exhausted`].
pub fn spawn<F>(total: u32, period: Duration, mut on_event: F) -> TimerHandle
where
    F: FnMut(CountdownEvent) + Send + 'static,
{
    TimerHandle::new(tokio::spawn(async move {
        let mut countdown = Countdown::new(total);
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let Some(event) = countdown.tick() else {
                break;
            };
            on_event(event);
            if event == CountdownEvent::Exhausted {
                break;
            }
        }
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_counts_down_then_exhausts_once() {
        let mut countdown = Countdown::new(3);
        assert_eq!(countdown.tick(), Some(CountdownEvent::Tick(2)));
        assert_eq!(countdown.tick(), Some(CountdownEvent::Tick(1)));
        assert_eq!(countdown.tick(), Some(CountdownEvent::Exhausted));
        assert_eq!(countdown.remaining(), 0);
        assert_eq!(countdown.tick(), None);
        assert_eq!(countdown.remaining(), 0);
        assert!(countdown.is_exhausted());
    }

    #[test]
    fn test_zero_total_exhausts_on_first_tick() {
        let mut countdown = Countdown::new(0);
        assert_eq!(countdown.tick(), Some(CountdownEvent::Exhausted));
        assert_eq!(countdown.tick(), None);
    }

    proptest! {
        #[test]
        fn prop_exactly_one_exhaustion(total in 1u32..2_000, extra in 0u32..50) {
            let mut countdown = Countdown::new(total);
            let events: Vec<_> = (0..total + extra).filter_map(|_| countdown.tick()).collect();
            prop_assert_eq!(events.len() as u32, total);
            prop_assert_eq!(
                events.iter().filter(|e| **e == CountdownEvent::Exhausted).count(),
                1
            );
            prop_assert_eq!(events.last(), Some(&CountdownEvent::Exhausted));
            prop_assert_eq!(countdown.remaining(), 0);
        }
    }

    fn recorder() -> (Arc<Mutex<Vec<CountdownEvent>>>, impl FnMut(CountdownEvent) + Send + 'static) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        (events, move |e| sink.lock().unwrap().push(e))
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_countdown_ticks_each_second() {
        let (events, on_event) = recorder();
        let handle = spawn(5, Duration::from_secs(1), on_event);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(
            *events.lock().unwrap(),
            [CountdownEvent::Tick(4), CountdownEvent::Tick(3)]
        );

        tokio::time::sleep(Duration::from_secs(10)).await;
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(events.last(), Some(&CountdownEvent::Exhausted));
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_countdown_stops_ticking() {
        let (events, on_event) = recorder();
        let handle = spawn(10, Duration::from_secs(1), on_event);

        tokio::time::sleep(Duration::from_millis(3500)).await;
        handle.cancel();
        tokio::time::sleep(Duration::from_secs(20)).await;

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert!(!events.contains(&CountdownEvent::Exhausted));
    }
}
