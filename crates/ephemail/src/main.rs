//! `Ephemail` - terminal viewer for disposable inbox messages.
//!
//! Shows one message, counts down its lifetime and deletes the temporary
//! inbox once it expires.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod api;
mod command;
mod desktop;
mod render;
mod settings;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use ephemail_core::{MessageId, MessageViewer, Services, ViewerHandle, ViewerSnapshot};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{Notify, watch};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::MailApi;
use command::{HELP, UserCommand};
use desktop::{DesktopNotifier, Notice, SystemClipboard};

/// Upper bound on waiting for an in-flight inbox deletion at exit.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(name = "ephemail")]
#[command(about = "View a disposable inbox message before it deletes itself")]
struct Cli {
    /// Identifier of the message to show
    message_id: String,

    /// Base URL of the mail API (overrides the settings file)
    #[arg(long)]
    api_base: Option<String>,

    /// Bearer token of the temporary inbox
    #[arg(long, env = "EPHEMAIL_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Lifetime of the message in seconds (overrides the settings file)
    #[arg(long)]
    ttl: Option<u32>,

    /// Do not send desktop notifications
    #[arg(long)]
    no_desktop_notifications: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout belongs to the viewer.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ephemail=info,ephemail_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut settings = settings::load_settings()
        .await
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("reading {}", settings::settings_path().display()))?;
    if let Some(api_base) = cli.api_base {
        settings.api_base = api_base;
    }
    if cli.token.is_some() {
        settings.token = cli.token;
    }
    if let Some(ttl) = cli.ttl {
        settings.viewer.ttl_secs = ttl;
    }

    let message_id = MessageId::new(cli.message_id).context("message id must not be empty")?;
    info!(api = %settings.api_base, %message_id, "Starting Ephemail");

    let api = Arc::new(MailApi::new(&settings.api_base, settings.token)?);
    let (notifier, mut notices) = DesktopNotifier::new(!cli.no_desktop_notifications);
    let services = Services {
        source: api.clone(),
        deleter: api,
        notifier: Arc::new(notifier),
        clipboard: Arc::new(SystemClipboard),
    };

    let closed = Arc::new(Notify::new());
    let on_close = {
        let closed = Arc::clone(&closed);
        Arc::new(move || closed.notify_one())
    };
    let viewer = MessageViewer::spawn(settings.viewer, services, on_close)?;
    viewer.mount(Some(message_id))?;

    run_terminal(&viewer, &mut notices, &closed).await?;
    viewer.unmount()?;

    // A close during deletion leaves the request running; the runtime must
    // outlive it.
    match tokio::time::timeout(DRAIN_TIMEOUT, viewer.drain()).await {
        Ok(result) => result?,
        Err(_) => warn!("Gave up waiting for the inbox deletion to finish"),
    }
    if notices.has_changed().unwrap_or(false)
        && let Some(notice) = notices.borrow_and_update().clone()
    {
        println!("\n{}", render::render_notice(&notice));
    }
    Ok(())
}

/// Drives the terminal until the viewer asks to close or stdin ends.
async fn run_terminal(
    viewer: &ViewerHandle,
    notices: &mut watch::Receiver<Option<Notice>>,
    closed: &Notify,
) -> anyhow::Result<()> {
    let mut snapshots = viewer.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last: Option<ViewerSnapshot> = None;
    let mut stdin_open = true;
    let mut notices_open = true;

    draw(&mut last, &snapshots.borrow_and_update())?;
    loop {
        tokio::select! {
            () = closed.notified() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                draw(&mut last, &snapshot)?;
            }
            changed = notices.changed(), if notices_open => {
                if changed.is_err() {
                    notices_open = false;
                    continue;
                }
                if let Some(notice) = notices.borrow_and_update().clone() {
                    println!("\n{}", render::render_notice(&notice));
                }
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => match UserCommand::parse(&line) {
                    Some(UserCommand::View(mode)) => viewer.select_mode(mode)?,
                    Some(UserCommand::Copy) => viewer.copy()?,
                    Some(UserCommand::Close) => viewer.close()?,
                    Some(UserCommand::Help) => println!("{HELP}"),
                    None => {}
                },
                None => stdin_open = false,
            },
        }
    }
    Ok(())
}

fn draw(last: &mut Option<ViewerSnapshot>, snapshot: &ViewerSnapshot) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    if render::needs_full_render(last.as_ref(), snapshot) {
        write!(stdout, "\n{}", render::render_view(snapshot))?;
    }
    if snapshot.is_visible() {
        write!(stdout, "\r{}", render::render_status(snapshot))?;
    }
    stdout.flush()?;
    *last = Some(snapshot.clone());
    Ok(())
}
