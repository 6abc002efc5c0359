//! Load completion notifications.
//!
//! Every finished [`refresh`](crate::collection::PaginatedCollection::refresh)
//! or [`load_more`](crate::collection::PaginatedCollection::load_more) emits
//! one [`CollectionEvent`] to the collection's observer, whether it
//! succeeded or failed. Consumers use this to stop a refresh spinner or show
//! a failure notice; the CLI uses it to report progress.
//!
//! Output goes to **stderr** so stdout remains parseable for scripts.

use std::io::Write;

use crate::error::FetchError;

/// Which load produced an event.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadKind {
    Refresh,
    Append,
}

impl LoadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadKind::Refresh => "refresh",
            LoadKind::Append => "append",
        }
    }
}

/// A completed load.
#[derive(Clone, Debug, PartialEq)]
pub enum CollectionEvent {
    /// The sequence was replaced by a fresh first page.
    Refreshed { count: usize, has_more: bool },
    /// A page was appended to the sequence.
    Appended {
        added: usize,
        total: usize,
        has_more: bool,
    },
    /// The fetch failed; sequence and cursor are unchanged.
    LoadFailed {
        kind: LoadKind,
        error_kind: &'static str,
        message: String,
    },
}

impl CollectionEvent {
    pub(crate) fn failed(kind: LoadKind, err: &FetchError) -> Self {
        CollectionEvent::LoadFailed {
            kind,
            error_kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Receives load completions. Called after the collection has released its
/// in-flight state, so an observer may immediately start another load.
pub trait CollectionObserver: Send + Sync {
    fn on_event(&self, event: &CollectionEvent);
}

/// Human-friendly lines on stderr: "append  +25 items (75 total, more available)".
pub struct StderrObserver;

impl CollectionObserver for StderrObserver {
    fn on_event(&self, event: &CollectionEvent) {
        let line = match event {
            CollectionEvent::Refreshed { count, has_more } => format!(
                "refresh  {} items{}\n",
                format_number(*count as u64),
                more_suffix(*has_more)
            ),
            CollectionEvent::Appended {
                added,
                total,
                has_more,
            } => format!(
                "append  +{} items ({} total{})\n",
                format_number(*added as u64),
                format_number(*total as u64),
                more_suffix(*has_more)
            ),
            CollectionEvent::LoadFailed { kind, message, .. } => {
                format!("{}  failed: {}\n", kind.as_str(), message)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

fn more_suffix(has_more: bool) -> &'static str {
    if has_more {
        ", more available"
    } else {
        ", end of list"
    }
}

/// Machine-readable events: one JSON object per line on stderr.
pub struct JsonObserver;

impl CollectionObserver for JsonObserver {
    fn on_event(&self, event: &CollectionEvent) {
        let at = chrono::Utc::now().to_rfc3339();
        let obj = match event {
            CollectionEvent::Refreshed { count, has_more } => serde_json::json!({
                "event": "refreshed",
                "at": at,
                "count": count,
                "has_more": has_more
            }),
            CollectionEvent::Appended {
                added,
                total,
                has_more,
            } => serde_json::json!({
                "event": "appended",
                "at": at,
                "added": added,
                "total": total,
                "has_more": has_more
            }),
            CollectionEvent::LoadFailed {
                kind,
                error_kind,
                message,
            } => serde_json::json!({
                "event": "load_failed",
                "at": at,
                "load": kind.as_str(),
                "error": error_kind,
                "message": message
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op observer.
pub struct NoObserver;

impl CollectionObserver for NoObserver {
    fn on_event(&self, _event: &CollectionEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Observer mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ObserverMode {
    Off,
    Human,
    Json,
}

impl ObserverMode {
    /// Default: human output when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ObserverMode::Human
        } else {
            ObserverMode::Off
        }
    }

    pub fn observer(&self) -> Box<dyn CollectionObserver> {
        match self {
            ObserverMode::Off => Box::new(NoObserver),
            ObserverMode::Human => Box::new(StderrObserver),
            ObserverMode::Json => Box::new(JsonObserver),
        }
    }
}
