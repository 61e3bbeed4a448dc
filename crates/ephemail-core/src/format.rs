//! Content formatting for the message viewer.
//!
//! Everything here is a pure function of its inputs: the same record and
//! view mode always produce the same output.

use chrono::{DateTime, Utc};

use crate::config::ViewerConfig;
use crate::lifecycle::LifecycleState;
use crate::model::{MessageRecord, ViewMode};

/// Placeholder shown when a message has no subject.
pub const NO_SUBJECT: &str = "(No subject)";
/// Shown when the selected view mode has nothing to display.
pub const NO_CONTENT: &str = "No content available for this view mode";
/// Countdown label once the message has expired.
pub const EXPIRED_LABEL: &str = "EXPIRED";
/// Expiry banner title.
pub const EXPIRY_BANNER_TITLE: &str = "Email Expired";
/// Expiry banner body.
pub const EXPIRY_BANNER_BODY: &str = "This email will be automatically deleted in a few seconds.";

/// Displayable content for one view mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Concatenated markup, trusted as-is. Sanitizing is the host's job.
    Markup(String),
    /// Plain-text body, shown preformatted.
    Preformatted(String),
    /// Structured dump of the record.
    Raw(String),
    /// The selected mode has no data for this message.
    NoContent,
}

impl Content {
    /// Returns true for the "no content" presentation.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::NoContent)
    }

    /// Returns the displayable text, or the placeholder for [`Content::NoContent`].
    #[must_use]
    pub fn as_display(&self) -> &str {
        match self {
            Self::Markup(s) | Self::Preformatted(s) | Self::Raw(s) => s,
            Self::NoContent => NO_CONTENT,
        }
    }
}

/// Maps a record and view mode to displayable content.
#[must_use]
pub fn format_content(record: &MessageRecord, mode: ViewMode) -> Content {
    match mode {
        ViewMode::Rendered if !record.html.is_empty() => Content::Markup(record.html.concat()),
        ViewMode::PlainText => plain_body(record)
            .map_or(Content::NoContent, |text| Content::Preformatted(text.to_owned())),
        ViewMode::Raw => Content::Raw(raw_dump(record)),
        ViewMode::Rendered => Content::NoContent,
    }
}

/// Text placed on the clipboard for a record and view mode.
///
/// Returns `None` when the mode has nothing to copy.
#[must_use]
pub fn copy_text(record: &MessageRecord, mode: ViewMode) -> Option<String> {
    match format_content(record, mode) {
        Content::Markup(markup) => Some(html_to_text(&markup)).filter(|t| !t.is_empty()),
        Content::Preformatted(text) | Content::Raw(text) => Some(text),
        Content::NoContent => None,
    }
}

/// Pretty-printed JSON of the whole record, keys in declaration order.
#[must_use]
pub fn raw_dump(record: &MessageRecord) -> String {
    serde_json::to_string_pretty(record).unwrap_or_else(|_| format!("{record:#?}"))
}

fn plain_body(record: &MessageRecord) -> Option<&str> {
    record.text.as_deref().filter(|t| !t.is_empty())
}

/// Formats remaining seconds as `minutes:seconds`.
#[must_use]
pub fn format_remaining(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Countdown label for a lifecycle: the remaining time while active,
/// [`EXPIRED_LABEL`] afterwards.
#[must_use]
pub fn countdown_label(state: LifecycleState, remaining: u32) -> String {
    if state == LifecycleState::Active {
        format_remaining(remaining)
    } else {
        EXPIRED_LABEL.to_string()
    }
}

/// How close the countdown is to expiry. Presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Urgency {
    /// Plenty of time left.
    Normal,
    /// At or below the warning threshold.
    Warning,
    /// At or below the critical threshold.
    Critical,
}

impl Urgency {
    /// Classifies the remaining time against the configured thresholds.
    #[must_use]
    pub const fn for_remaining(remaining: u32, config: &ViewerConfig) -> Self {
        if remaining <= config.critical_threshold_secs {
            Self::Critical
        } else if remaining <= config.warning_threshold_secs {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

/// Header lines shown above the message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    /// Subject, or [`NO_SUBJECT`].
    pub subject: String,
    /// Sender display string.
    pub from: String,
    /// Recipients joined by `", "`; `None` when there are none.
    pub to: Option<String>,
    /// Relative age, e.g. "5 minutes ago".
    pub received: String,
}

impl MessageHeader {
    /// Builds the header for a record as seen at `now`.
    #[must_use]
    pub fn from_record(record: &MessageRecord, now: DateTime<Utc>) -> Self {
        let subject = record
            .subject
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(NO_SUBJECT)
            .to_string();
        let to = (!record.to.is_empty()).then(|| {
            record
                .to
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        });
        Self {
            subject,
            from: record.from.to_string(),
            to,
            received: relative_age(record.created_at, now),
        }
    }
}

/// Describes how long ago `then` was, relative to `now`.
///
/// Timestamps in the future are treated as "just now".
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn relative_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    let minutes = ((seconds as f64) / 60.0).round() as i64;

    let distance = match minutes {
        0 if seconds < 30 => "less than a minute".to_string(),
        0 | 1 => "1 minute".to_string(),
        2..=44 => format!("{minutes} minutes"),
        45..=89 => "about 1 hour".to_string(),
        90..=1439 => format!("about {} hours", (minutes as f64 / 60.0).round() as i64),
        1440..=2519 => "1 day".to_string(),
        2520..=43199 => format!("{} days", (minutes as f64 / 1440.0).round() as i64),
        43200..=525_599 => {
            let months = ((minutes as f64) / 43200.0).round() as i64;
            if months <= 1 {
                "about 1 month".to_string()
            } else {
                format!("{months} months")
            }
        }
        _ => format!("about {} years", minutes / 525_600),
    };
    format!("{distance} ago")
}

/// Extracts readable text from markup.
///
/// Tags are dropped, block-level tags become single line breaks, runs of
/// whitespace collapse to one space, `<script>`/`<style>` bodies are
/// skipped and common entities are decoded.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    let mut skip_until: Option<&'static str> = None;

    while let Some(c) = rest.chars().next() {
        if c == '<' && opens_tag(rest) {
            if let Some(comment) = rest.strip_prefix("<!--") {
                rest = comment.find("-->").map_or("", |end| &comment[end + 3..]);
                continue;
            }
            // An unterminated tag is kept as text.
            if let Some(end) = rest.find('>') {
                let tag = tag_name(&rest[1..end]);
                rest = &rest[end + 1..];

                if let Some(closing) = skip_until {
                    if tag == closing {
                        skip_until = None;
                    }
                    continue;
                }
                match tag.as_str() {
                    "script" => skip_until = Some("/script"),
                    "style" => skip_until = Some("/style"),
                    t if is_line_break(t) => push_newline(&mut out),
                    _ => {}
                }
                continue;
            }
        }

        rest = &rest[c.len_utf8()..];
        if skip_until.is_some() {
            continue;
        }
        if c == '&'
            && let Some((decoded, consumed)) = decode_entity(rest)
        {
            out.push(decoded);
            rest = &rest[consumed..];
        } else if c.is_whitespace() {
            if !out.is_empty() && !out.ends_with([' ', '\n']) {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }

    out.trim().to_string()
}

/// A `<` only starts markup when followed by a name, `/`, `!` or `?`.
fn opens_tag(from_lt: &str) -> bool {
    from_lt[1..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
}

fn tag_name(inner: &str) -> String {
    inner
        .trim_start()
        .chars()
        .take_while(|&c| c.is_ascii_alphanumeric() || c == '/')
        .collect::<String>()
        .to_ascii_lowercase()
}

fn is_line_break(tag: &str) -> bool {
    matches!(
        tag.trim_start_matches('/'),
        "br" | "p" | "div" | "tr" | "li" | "ul" | "ol" | "table" | "blockquote" | "hr"
            | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    )
}

fn push_newline(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// Decodes the entity that follows an `&`, returning the character and the
/// number of bytes consumed including the trailing `;`.
fn decode_entity(after_amp: &str) -> Option<(char, usize)> {
    let semi = after_amp.find(';').filter(|&i| i > 0 && i <= 10)?;
    let name = &after_amp[..semi];
    let decoded = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "hellip" => '\u{2026}',
        "copy" => '\u{00A9}',
        _ => {
            let code = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
                .map_or_else(
                    || name.strip_prefix('#')?.parse::<u32>().ok(),
                    |hex| u32::from_str_radix(hex, 16).ok(),
                )?;
            char::from_u32(code)?
        }
    };
    Some((decoded, semi + 1))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Address;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn record(html: &[&str], text: Option<&str>) -> MessageRecord {
        MessageRecord {
            id: Some("m1".into()),
            subject: Some("Hello".into()),
            from: Address::new("sender@example.com").with_name("Sender"),
            to: vec![Address::new("me@example.com")],
            html: html.iter().map(|s| (*s).to_string()).collect(),
            text: text.map(str::to_string),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_markup_only_record() {
        let record = record(&["<p>Hi</p>"], None);
        assert_eq!(
            format_content(&record, ViewMode::Rendered),
            Content::Markup("<p>Hi</p>".into())
        );
        assert_eq!(format_content(&record, ViewMode::PlainText), Content::NoContent);
        match format_content(&record, ViewMode::Raw) {
            Content::Raw(dump) => assert!(!dump.is_empty()),
            other => panic!("expected raw dump, got {other:?}"),
        }
    }

    #[test]
    fn test_fragments_concatenated_in_order() {
        let record = record(&["<p>a</p>", "<p>b</p>"], None);
        assert_eq!(
            format_content(&record, ViewMode::Rendered),
            Content::Markup("<p>a</p><p>b</p>".into())
        );
    }

    #[test]
    fn test_text_only_record() {
        let record = record(&[], Some("  line one\nline two  "));
        assert_eq!(format_content(&record, ViewMode::Rendered), Content::NoContent);
        assert_eq!(
            format_content(&record, ViewMode::PlainText),
            Content::Preformatted("  line one\nline two  ".into())
        );
    }

    #[test]
    fn test_empty_text_is_no_content() {
        let record = record(&[], Some(""));
        assert!(format_content(&record, ViewMode::PlainText).is_empty());
        assert_eq!(Content::NoContent.as_display(), NO_CONTENT);
    }

    #[test]
    fn test_raw_dump_parses_back() {
        let record = record(&["<b>x</b>"], Some("x"));
        let dump = raw_dump(&record);
        let parsed: MessageRecord = serde_json::from_str(&dump).unwrap();
        assert_eq!(parsed, record);
        assert!(dump.find("\"subject\"").unwrap() < dump.find("\"from\"").unwrap());
        assert!(dump.contains("\"createdAt\""));
    }

    #[test]
    fn test_copy_text_per_mode() {
        let record = record(&["<p>Hi &amp; bye</p><p>Second</p>"], Some("plain"));
        assert_eq!(
            copy_text(&record, ViewMode::Rendered).unwrap(),
            "Hi & bye\nSecond"
        );
        assert_eq!(copy_text(&record, ViewMode::PlainText).unwrap(), "plain");
        assert_eq!(
            copy_text(&record, ViewMode::Raw).unwrap(),
            raw_dump(&record)
        );
        assert!(copy_text(&self::record(&[], None), ViewMode::Rendered).is_none());
    }

    #[test]
    fn test_html_to_text_strips_and_decodes() {
        let html = "<html><head><style>p { color: red; }</style></head>\
                    <body><h1>Title</h1><p>Hello&nbsp;<b>world</b>&#33;</p>\
                    Line<br>break &hellip; &#x41; &bogus;</body></html>";
        assert_eq!(
            html_to_text(html),
            "Title\nHello world!\nLine\nbreak \u{2026} A &bogus;"
        );
    }

    #[test]
    fn test_html_to_text_collapses_whitespace() {
        assert_eq!(html_to_text("<div>  a \n\n  b </div>"), "a b");
        assert_eq!(html_to_text("<p></p><p></p><p></p><p>x</p>"), "x");
    }

    #[test]
    fn test_html_to_text_keeps_stray_less_than() {
        assert_eq!(html_to_text("<p>a < b</p>"), "a < b");
        assert_eq!(html_to_text("<p>Price <5 dollars"), "Price <5 dollars");
        assert_eq!(html_to_text("<p>x &lt; y</p>"), "x < y");
    }

    #[test]
    fn test_html_to_text_unterminated_tag_is_text() {
        assert_eq!(html_to_text("<p>ok</p>see <b"), "ok\nsee <b");
    }

    #[test]
    fn test_html_to_text_skips_comments() {
        assert_eq!(html_to_text("<p>x</p><!-- a > b -->tail"), "x\ntail");
        assert_eq!(html_to_text("x<!-- never closed"), "x");
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(0), "0:00");
        assert_eq!(format_remaining(5), "0:05");
        assert_eq!(format_remaining(59), "0:59");
        assert_eq!(format_remaining(60), "1:00");
        assert_eq!(format_remaining(605), "10:05");
        assert_eq!(format_remaining(600), "10:00");
    }

    #[test]
    fn test_countdown_label_after_expiry() {
        assert_eq!(countdown_label(LifecycleState::Active, 61), "1:01");
        assert_eq!(countdown_label(LifecycleState::Expired, 0), EXPIRED_LABEL);
        assert_eq!(countdown_label(LifecycleState::Deleting, 0), EXPIRED_LABEL);
    }

    #[test]
    fn test_urgency_thresholds() {
        let config = ViewerConfig::default();
        assert_eq!(Urgency::for_remaining(600, &config), Urgency::Normal);
        assert_eq!(Urgency::for_remaining(301, &config), Urgency::Normal);
        assert_eq!(Urgency::for_remaining(300, &config), Urgency::Warning);
        assert_eq!(Urgency::for_remaining(61, &config), Urgency::Warning);
        assert_eq!(Urgency::for_remaining(60, &config), Urgency::Critical);
        assert_eq!(Urgency::for_remaining(0, &config), Urgency::Critical);
    }

    #[test]
    fn test_header_formatting() {
        let mut record = record(&[], None);
        let now = record.created_at + Duration::minutes(5);
        let header = MessageHeader::from_record(&record, now);
        assert_eq!(header.subject, "Hello");
        assert_eq!(header.from, "Sender <sender@example.com>");
        assert_eq!(header.to.as_deref(), Some("me@example.com"));
        assert_eq!(header.received, "5 minutes ago");

        record.subject = None;
        record.to.clear();
        let header = MessageHeader::from_record(&record, now);
        assert_eq!(header.subject, NO_SUBJECT);
        assert!(header.to.is_none());
    }

    #[test]
    fn test_relative_age_buckets() {
        let then = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let age = |secs: i64| relative_age(then, then + Duration::seconds(secs));
        assert_eq!(age(-10), "less than a minute ago");
        assert_eq!(age(10), "less than a minute ago");
        assert_eq!(age(45), "1 minute ago");
        assert_eq!(age(60 * 30), "30 minutes ago");
        assert_eq!(age(60 * 60), "about 1 hour ago");
        assert_eq!(age(60 * 60 * 5), "about 5 hours ago");
        assert_eq!(age(60 * 60 * 30), "1 day ago");
        assert_eq!(age(60 * 60 * 24 * 10), "10 days ago");
    }

    proptest! {
        #[test]
        fn prop_format_content_is_pure(
            html in proptest::collection::vec(".{0,20}", 0..3),
            text in proptest::option::of(".{0,20}"),
        ) {
            let record = MessageRecord {
                html,
                text,
                ..record(&[], None)
            };
            for mode in ViewMode::ALL {
                prop_assert_eq!(format_content(&record, mode), format_content(&record, mode));
            }
            prop_assert!(!format_content(&record, ViewMode::Raw).is_empty());
        }

        #[test]
        fn prop_remaining_roundtrips(seconds in 0u32..100_000) {
            let label = format_remaining(seconds);
            let (m, s) = label.split_once(':').unwrap();
            prop_assert_eq!(s.len(), 2);
            prop_assert_eq!(m.parse::<u32>().unwrap() * 60 + s.parse::<u32>().unwrap(), seconds);
        }
    }
}
