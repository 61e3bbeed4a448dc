//! Cancellable timers scoped to a viewer lifecycle.

use std::time::Duration;

use tokio::task::JoinHandle;

/// Owns a spawned timer task. Cancelling or dropping the handle aborts the
/// task, so no callback runs after the owner is gone.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub(crate) const fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    /// Aborts the timer. Pending callbacks are discarded.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Returns true once the timer has fired or been cancelled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Runs `f` once after `delay`, unless the returned handle is cancelled first.
pub fn after<F>(delay: Duration, f: F) -> TimerHandle
where
    F: FnOnce() + Send + 'static,
{
    TimerHandle::new(tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        f();
    }))
}
