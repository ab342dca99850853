//! Download Event Logger
//!
//! Structured download lifecycle events (requested, saved, failed) emitted
//! through `tracing` under the `download_events` target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadEvent {
    Requested {
        kind: String,
        url: String,
    },
    Saved {
        kind: String,
        path: String,
    },
    /// Finished without a path to report (videos).
    Completed {
        kind: String,
    },
    Failed {
        kind: String,
        url: String,
        detail: String,
    },
    Unrecognized {
        text: String,
    },
}

impl DownloadEvent {
    fn redacted(mut self) -> Self {
        match &mut self {
            DownloadEvent::Requested { url, .. } => {
                *url = redact_sensitive_data(url);
            }
            DownloadEvent::Failed { url, detail, .. } => {
                *url = redact_sensitive_data(url);
                *detail = redact_sensitive_data(detail);
            }
            DownloadEvent::Unrecognized { text } => {
                *text = redact_sensitive_data(text);
            }
            DownloadEvent::Saved { .. } | DownloadEvent::Completed { .. } => {}
        }
        self
    }
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    /// Id of the inbound message that caused the event.
    pub message_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: DownloadEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Redact and emit one event. Returns the entry as logged.
    pub fn log_event(message_id: &str, event: DownloadEvent) -> EventLogEntry {
        let entry = EventLogEntry {
            message_id: message_id.into(),
            timestamp: Utc::now(),
            event: event.redacted(),
        };

        match &entry.event {
            DownloadEvent::Failed { .. } => {
                warn!(target: "download_events", event = ?entry, "Download event");
            }
            _ => {
                info!(target: "download_events", event = ?entry, "Download event");
            }
        }
        entry
    }
}
