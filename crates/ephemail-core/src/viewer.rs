//! Message viewer orchestration.
//!
//! A [`MessageViewer`] runs as one task that applies events in order:
//! commands from hosts (through a [`ViewerHandle`]) and completions from the
//! timers and futures it spawned. Each mounted identifier gets its own
//! lifecycle instance tagged with a generation number; completions carrying
//! an older generation are dropped, and dropping an instance aborts its
//! timers.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::config::ViewerConfig;
use crate::countdown::{self, CountdownEvent};
use crate::format::{self, Content, MessageHeader, Urgency};
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::model::{MessageId, MessageRecord, ViewMode};
use crate::service::{Services, Severity};
use crate::timer::{self, TimerHandle};
use crate::{Error, Result};

/// Notification after a successful automatic deletion.
pub const DELETED_AFTER_EXPIRY: &str = "Email automatically deleted after expiry";
/// Notification after a failed automatic deletion.
pub const DELETE_FAILED: &str = "Failed to auto-delete inbox";
/// Notification after a successful copy.
pub const COPIED: &str = "Message copied to clipboard!";
/// Notification when the clipboard write fails.
pub const COPY_FAILED: &str = "Failed to copy message";
/// Notification when there is no loaded message to copy.
pub const NOTHING_TO_COPY: &str = "No message content to copy";

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Callback asking the host to hide the viewer.
pub type CloseCallback = Arc<dyn Fn() + Send + Sync>;

/// Progress of the message fetch for the current lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchStatus {
    /// Request in flight.
    #[default]
    Loading,
    /// Message available.
    Loaded(Arc<MessageRecord>),
    /// The source reported an error.
    Failed(String),
}

impl FetchStatus {
    /// The loaded record, if any.
    #[must_use]
    pub fn record(&self) -> Option<&MessageRecord> {
        match self {
            Self::Loaded(record) => Some(record),
            _ => None,
        }
    }
}

/// Everything a host needs to draw the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerSnapshot {
    /// Mounted identifier. `None` means render nothing.
    pub message_id: Option<MessageId>,
    /// Lifecycle stage.
    pub state: LifecycleState,
    /// Seconds left before expiry.
    pub remaining: u32,
    /// `m:ss` while active, `EXPIRED` afterwards.
    pub countdown: String,
    /// Urgency band of `remaining`.
    pub urgency: Urgency,
    /// Selected view mode.
    pub mode: ViewMode,
    /// Fetch progress.
    pub fetch: FetchStatus,
    /// Header lines, once the message has loaded.
    pub header: Option<MessageHeader>,
    /// Content for the selected mode, once the message has loaded.
    pub content: Option<Content>,
}

impl ViewerSnapshot {
    fn hidden(config: &ViewerConfig) -> Self {
        Self {
            message_id: None,
            state: LifecycleState::Active,
            remaining: config.ttl_secs,
            countdown: format::format_remaining(config.ttl_secs),
            urgency: Urgency::for_remaining(config.ttl_secs, config),
            mode: ViewMode::default(),
            fetch: FetchStatus::default(),
            header: None,
            content: None,
        }
    }

    /// Returns true if the viewer has something to show.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.message_id.is_some()
    }

    /// Returns true while the expiry banner should be shown.
    #[must_use]
    pub fn shows_expiry_banner(&self) -> bool {
        self.is_visible() && self.state != LifecycleState::Active
    }
}

#[derive(Debug)]
enum Command {
    Mount(Option<MessageId>),
    SelectMode(ViewMode),
    Copy,
    Close,
    Drain(oneshot::Sender<()>),
}

#[derive(Debug)]
enum Completion {
    Countdown {
        generation: u64,
        event: CountdownEvent,
    },
    GraceElapsed {
        generation: u64,
    },
    Fetched {
        generation: u64,
        id: MessageId,
        result: Result<MessageRecord>,
    },
    Deleted {
        generation: u64,
        result: Result<()>,
    },
}

/// One identifier's lifecycle. Dropping it cancels its timers.
struct Session {
    generation: u64,
    id: MessageId,
    lifecycle: Lifecycle,
    remaining: u32,
    mode: ViewMode,
    fetch: FetchStatus,
    countdown: Option<TimerHandle>,
    grace: Option<TimerHandle>,
}

impl Drop for Session {
    fn drop(&mut self) {
        for timer in self.countdown.iter().chain(self.grace.iter()) {
            timer.cancel();
        }
    }
}

/// Cloneable handle for driving a running [`MessageViewer`].
#[derive(Debug, Clone)]
pub struct ViewerHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<ViewerSnapshot>,
}

impl ViewerHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::Stopped)
    }

    /// Shows `id`, or nothing for `None`. Any other identifier's lifecycle is
    /// torn down first; mounting the identifier already shown does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stopped`] if the viewer task has exited.
    pub fn mount(&self, id: Option<MessageId>) -> Result<()> {
        self.send(Command::Mount(id))
    }

    /// Equivalent to `mount(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stopped`] if the viewer task has exited.
    pub fn unmount(&self) -> Result<()> {
        self.mount(None)
    }

    /// Switches the view mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stopped`] if the viewer task has exited.
    pub fn select_mode(&self, mode: ViewMode) -> Result<()> {
        self.send(Command::SelectMode(mode))
    }

    /// Copies the current content to the clipboard. The outcome is reported
    /// through the notifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stopped`] if the viewer task has exited.
    pub fn copy(&self) -> Result<()> {
        self.send(Command::Copy)
    }

    /// Closes the viewer on the user's behalf. Pending timers are cancelled,
    /// so a message in its grace period is not deleted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stopped`] if the viewer task has exited.
    pub fn close(&self) -> Result<()> {
        self.send(Command::Close)
    }

    /// Resolves once no inbox deletion is in flight.
    ///
    /// A deletion started before a manual close keeps running; hosts await
    /// this before exiting so its outcome is still reported.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stopped`] if the viewer task has exited.
    pub async fn drain(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Drain(tx))?;
        rx.await.map_err(|_| Error::Stopped)
    }

    /// The latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ViewerSnapshot {
        self.snapshot.borrow().clone()
    }

    /// A receiver that is notified on every snapshot change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewerSnapshot> {
        self.snapshot.clone()
    }
}

/// Lifecycle controller for one on-screen message at a time.
pub struct MessageViewer {
    config: ViewerConfig,
    services: Services,
    on_close: CloseCallback,
    commands: mpsc::UnboundedReceiver<Command>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    snapshot: watch::Sender<ViewerSnapshot>,
    session: Option<Session>,
    next_generation: u64,
    deletions_in_flight: usize,
    drain_waiters: Vec<oneshot::Sender<()>>,
}

impl MessageViewer {
    /// Creates a viewer and the handle that drives it. Nothing happens until
    /// [`run`](Self::run) is polled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` fails
    /// [`validate`](ViewerConfig::validate).
    pub fn new(
        config: ViewerConfig,
        services: Services,
        on_close: CloseCallback,
    ) -> Result<(Self, ViewerHandle)> {
        config.validate()?;
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (snapshot, snapshot_rx) = watch::channel(ViewerSnapshot::hidden(&config));

        let viewer = Self {
            config,
            services,
            on_close,
            commands,
            completions_tx,
            completions,
            snapshot,
            session: None,
            next_generation: 0,
            deletions_in_flight: 0,
            drain_waiters: Vec::new(),
        };
        let handle = ViewerHandle {
            commands: commands_tx,
            snapshot: snapshot_rx,
        };
        Ok((viewer, handle))
    }

    /// Creates a viewer and runs it on a new tokio task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` is invalid.
    pub fn spawn(
        config: ViewerConfig,
        services: Services,
        on_close: CloseCallback,
    ) -> Result<ViewerHandle> {
        let (viewer, handle) = Self::new(config, services, on_close)?;
        tokio::spawn(viewer.run());
        Ok(handle)
    }

    /// Processes events until every [`ViewerHandle`] has been dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(completion) = self.completions.recv() => self.handle_completion(completion),
            }
        }
        debug!("viewer stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Mount(id) => self.mount(id),
            Command::SelectMode(mode) => {
                if let Some(session) = self.session.as_mut() {
                    session.mode = mode;
                    self.publish();
                }
            }
            Command::Copy => self.copy(),
            Command::Close => self.close(),
            Command::Drain(waiter) => {
                if self.deletions_in_flight == 0 {
                    let _ = waiter.send(());
                } else {
                    self.drain_waiters.push(waiter);
                }
            }
        }
    }

    fn mount(&mut self, id: Option<MessageId>) {
        if id.is_some() && self.session.as_ref().map(|s| &s.id) == id.as_ref() {
            return;
        }
        self.session = None;
        if let Some(id) = id {
            self.start_session(id);
        }
        self.publish();
    }

    fn start_session(&mut self, id: MessageId) {
        self.next_generation += 1;
        let generation = self.next_generation;
        info!(%id, generation, "mounting message");

        let tx = self.completions_tx.clone();
        let countdown = countdown::spawn(self.config.ttl_secs, TICK_PERIOD, move |event| {
            let _ = tx.send(Completion::Countdown { generation, event });
        });

        let fetch = self.services.source.fetch(&id);
        let tx = self.completions_tx.clone();
        let fetch_id = id.clone();
        tokio::spawn(async move {
            let result = fetch.await;
            let _ = tx.send(Completion::Fetched {
                generation,
                id: fetch_id,
                result,
            });
        });

        self.session = Some(Session {
            generation,
            id,
            lifecycle: Lifecycle::new(),
            remaining: self.config.ttl_secs,
            mode: ViewMode::default(),
            fetch: FetchStatus::Loading,
            countdown: Some(countdown),
            grace: None,
        });
    }

    fn close(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        info!(id = %session.id, state = %session.lifecycle.state(), "viewer closed by user");
        let already_closed = session.lifecycle.state().is_terminal();
        drop(session);
        self.publish();
        if !already_closed {
            (self.on_close)();
        }
    }

    fn copy(&self) {
        let notifier = &self.services.notifier;
        let Some(session) = self.session.as_ref() else {
            notifier.notify(Severity::Error, NOTHING_TO_COPY);
            return;
        };
        let Some(text) = session
            .fetch
            .record()
            .and_then(|record| format::copy_text(record, session.mode))
        else {
            notifier.notify(Severity::Error, NOTHING_TO_COPY);
            return;
        };
        match self.services.clipboard.write_text(&text) {
            Ok(()) => notifier.notify(Severity::Success, COPIED),
            Err(e) => {
                warn!("Failed to copy message: {}", e);
                notifier.notify(Severity::Error, COPY_FAILED);
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Countdown { generation, event } if self.is_current(generation) => {
                self.on_countdown(generation, event);
            }
            Completion::GraceElapsed { generation } if self.is_current(generation) => {
                self.begin_deletion();
            }
            Completion::Countdown { generation, .. } | Completion::GraceElapsed { generation } => {
                debug!(generation, "dropping timer event from a torn-down lifecycle");
            }
            Completion::Fetched {
                generation,
                id,
                result,
            } => self.on_fetched(generation, &id, result),
            Completion::Deleted { generation, result } => self.on_deleted(generation, result),
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.generation == generation)
    }

    fn on_countdown(&mut self, generation: u64, event: CountdownEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.lifecycle.state() != LifecycleState::Active {
            return;
        }
        match event {
            CountdownEvent::Tick(remaining) => {
                session.remaining = remaining;
            }
            CountdownEvent::Exhausted => {
                session.remaining = 0;
                if let Err(e) = session.lifecycle.advance(LifecycleState::Expired) {
                    error!("{}", e);
                    return;
                }
                info!(id = %session.id, "message expired");
                session.countdown = None;
                let tx = self.completions_tx.clone();
                session.grace = Some(timer::after(self.config.grace_delay(), move || {
                    let _ = tx.send(Completion::GraceElapsed { generation });
                }));
            }
        }
        self.publish();
    }

    fn begin_deletion(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Err(e) = session.lifecycle.advance(LifecycleState::Deleting) {
            error!("{}", e);
            return;
        }
        session.grace = None;
        info!(id = %session.id, "deleting inbox");

        let generation = session.generation;
        let deletion = self.services.deleter.delete_inbox();
        self.deletions_in_flight += 1;
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = deletion.await;
            let _ = tx.send(Completion::Deleted { generation, result });
        });
        self.publish();
    }

    fn on_deleted(&mut self, generation: u64, result: Result<()>) {
        let notifier = &self.services.notifier;
        match &result {
            Ok(()) => notifier.notify(Severity::Success, DELETED_AFTER_EXPIRY),
            Err(e) => {
                warn!("Failed to auto-delete inbox: {}", e);
                notifier.notify(Severity::Error, DELETE_FAILED);
            }
        }
        self.deletions_in_flight = self.deletions_in_flight.saturating_sub(1);
        if self.deletions_in_flight == 0 {
            for waiter in self.drain_waiters.drain(..) {
                let _ = waiter.send(());
            }
        }

        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.generation == generation)
        else {
            debug!(generation, "deletion finished after its viewer was torn down");
            return;
        };
        if let Err(e) = session.lifecycle.advance(LifecycleState::Closed) {
            error!("{}", e);
            return;
        }
        info!(id = %session.id, ok = result.is_ok(), "lifecycle closed");
        self.publish();
        (self.on_close)();
    }

    fn on_fetched(&mut self, generation: u64, id: &MessageId, result: Result<MessageRecord>) {
        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.generation == generation && &s.id == id)
        else {
            debug!(%id, generation, "discarding stale fetch result");
            return;
        };
        session.fetch = match result {
            Ok(record) => FetchStatus::Loaded(Arc::new(record)),
            Err(e) => {
                warn!(%id, "Failed to load message: {}", e);
                FetchStatus::Failed(e.to_string())
            }
        };
        self.publish();
    }

    fn publish(&self) {
        let snapshot = self.session.as_ref().map_or_else(
            || ViewerSnapshot::hidden(&self.config),
            |session| {
                let state = session.lifecycle.state();
                let record = session.fetch.record();
                ViewerSnapshot {
                    message_id: Some(session.id.clone()),
                    state,
                    remaining: session.remaining,
                    countdown: format::countdown_label(state, session.remaining),
                    urgency: Urgency::for_remaining(session.remaining, &self.config),
                    mode: session.mode,
                    fetch: session.fetch.clone(),
                    header: record.map(|r| MessageHeader::from_record(r, Utc::now())),
                    content: record.map(|r| format::format_content(r, session.mode)),
                }
            },
        );
        self.snapshot.send_replace(snapshot);
    }
}
