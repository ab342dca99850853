//! Structured logging components for fetchbot.
//!
//! Handles log redaction, console/JSON output, file rotation, and download
//! event logging.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{DownloadEvent, EventLogEntry, EventLogger};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
