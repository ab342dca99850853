/// Command types.
use serde::{Deserialize, Serialize};

use fetchbot_core::{DownloadKind, DownloadRequest};

// ---------------------------------------------------------------------------
// Parsed command
// ---------------------------------------------------------------------------

/// One parsed line of chat text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "arg", rename_all = "snake_case")]
pub enum Command {
    /// `/download_file <url>`
    File(String),
    /// `/download_video <url>`
    Video(String),
    /// `/download_app <url>`
    App(String),
    /// Exactly `/help`.
    Help,
    /// Anything else, kept verbatim for logging.
    Unknown(String),
}

impl Command {
    /// Download request carried by this command, if any.
    pub fn download_request(&self) -> Option<DownloadRequest> {
        match self {
            Command::File(url) => Some(DownloadRequest::new(url.clone(), DownloadKind::File)),
            Command::Video(url) => Some(DownloadRequest::new(url.clone(), DownloadKind::Video)),
            Command::App(url) => Some(DownloadRequest::new(url.clone(), DownloadKind::App)),
            Command::Help | Command::Unknown(_) => None,
        }
    }

    /// Download command of the given kind.
    pub fn for_kind(kind: DownloadKind, url: String) -> Self {
        match kind {
            DownloadKind::File => Command::File(url),
            DownloadKind::Video => Command::Video(url),
            DownloadKind::App => Command::App(url),
        }
    }
}

// ---------------------------------------------------------------------------
// Command definition
// ---------------------------------------------------------------------------

/// What a command does once recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    Download(DownloadKind),
    Help,
}

/// A command entry in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandDef {
    /// Exact, case-sensitive alias including the leading '/'.
    pub alias: String,
    /// Placeholder shown in help, e.g. `<url>`. `None` means no argument.
    pub arg: Option<String>,
    pub description: String,
    pub action: CommandAction,
}

impl CommandDef {
    /// `alias` plus the argument placeholder, as shown in help.
    pub fn usage(&self) -> String {
        match &self.arg {
            Some(arg) => format!("{} {}", self.alias, arg),
            None => self.alias.clone(),
        }
    }
}
