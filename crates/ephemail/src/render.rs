//! Terminal rendering of viewer snapshots.

use std::fmt::Write;

use ephemail_core::format::{self, EXPIRY_BANNER_BODY, EXPIRY_BANNER_TITLE};
use ephemail_core::{Content, FetchStatus, Severity, Urgency, ViewMode, ViewerSnapshot};

use crate::command::HELP;
use crate::desktop::Notice;

const RULE: &str = "────────────────────────────────────────────────────────────";

/// Returns true if `next` differs from `prev` in more than the countdown.
pub fn needs_full_render(prev: Option<&ViewerSnapshot>, next: &ViewerSnapshot) -> bool {
    prev.is_none_or(|prev| {
        prev.message_id != next.message_id
            || prev.state != next.state
            || prev.mode != next.mode
            || prev.fetch != next.fetch
    })
}

/// Countdown line, redrawn in place every second.
pub fn render_status(snapshot: &ViewerSnapshot) -> String {
    let marker = match snapshot.urgency {
        Urgency::Normal => " ",
        Urgency::Warning => "!",
        Urgency::Critical => "‼",
    };
    format!("⏱ {marker} {:>7}   {HELP}", snapshot.countdown)
}

/// Renders the whole viewer.
pub fn render_view(snapshot: &ViewerSnapshot) -> String {
    let mut out = String::new();
    let Some(id) = &snapshot.message_id else {
        return out;
    };

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "✉  Email Message  ({id})");
    let _ = writeln!(out, "{RULE}");

    if snapshot.shows_expiry_banner() {
        let _ = writeln!(out, "🗑  {EXPIRY_BANNER_TITLE}");
        let _ = writeln!(out, "   {EXPIRY_BANNER_BODY}");
        let _ = writeln!(out, "{RULE}");
    }

    match &snapshot.fetch {
        FetchStatus::Loading => {
            let _ = writeln!(out, "Loading message...");
        }
        FetchStatus::Failed(reason) => {
            let _ = writeln!(out, "Failed to load message");
            let _ = writeln!(out, "  {reason}");
        }
        FetchStatus::Loaded(_) => render_message(&mut out, snapshot),
    }
    out
}

fn render_message(out: &mut String, snapshot: &ViewerSnapshot) {
    if let Some(header) = &snapshot.header {
        let _ = writeln!(out, "{}    ({})", header.subject, header.received);
        let _ = writeln!(out, "From: {}", header.from);
        if let Some(to) = &header.to {
            let _ = writeln!(out, "To:   {to}");
        }
        let _ = writeln!(out, "{RULE}");
    }

    let tabs: Vec<String> = ViewMode::ALL
        .iter()
        .map(|mode| {
            if *mode == snapshot.mode {
                format!("[{}]", mode.label())
            } else {
                format!(" {} ", mode.label())
            }
        })
        .collect();
    let _ = writeln!(out, "{}", tabs.join(" "));
    let _ = writeln!(out, "{RULE}");

    let body = match &snapshot.content {
        Some(Content::Markup(markup)) => format::html_to_text(markup),
        Some(content) => content.as_display().to_string(),
        None => String::new(),
    };
    let _ = writeln!(out, "{body}");
    let _ = writeln!(out, "{RULE}");
}

/// Formats a notification for the terminal.
pub fn render_notice(notice: &Notice) -> String {
    match notice.severity {
        Severity::Success => format!("✔ {}", notice.message),
        Severity::Error => format!("✖ {}", notice.message),
    }
}
