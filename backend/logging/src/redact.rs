//! Log Redaction Layer
//!
//! Scrubs access tokens and phone numbers (WhatsApp sender ids) from strings
//! prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static TELEPHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap());
static BEARER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Bearer\s+[a-zA-Z0-9\-\._~+/]+=*").unwrap());
/// Graph API access tokens start with `EAA`.
static GRAPH_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bEAA[a-zA-Z0-9]{20,}").unwrap());
static QUERY_SECRET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([?&](?:access_token|token|key|signature|sig)=)[^&#\s]+").unwrap()
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let mut redacted = BEARER_RE.replace_all(input, "[REDACTED_TOKEN]").to_string();
    redacted = GRAPH_TOKEN_RE.replace_all(&redacted, "[REDACTED_TOKEN]").to_string();
    redacted = QUERY_SECRET_RE.replace_all(&redacted, "${1}[REDACTED]").to_string();
    redacted = TELEPHONE_RE.replace_all(&redacted, "[REDACTED_PHONE]").to_string();
    redacted
}
