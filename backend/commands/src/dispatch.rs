/// Command routing: parse, run the download, format exactly one reply.
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use fetchbot_core::{DownloadRequest, DownloadResult, InboundMessage, OutboundReply};
use fetchbot_downloader::DownloadService;
use logging::{DownloadEvent, EventLogger};

use crate::detection::parse_command;
use crate::registry::CommandRegistry;
use crate::types::Command;

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

pub const DOWNLOAD_FAILED: &str = "Download failed.";
pub const VIDEO_DOWNLOADED: &str = "YouTube video downloaded!";
pub const UNKNOWN_COMMAND: &str = "Unknown command. Type /help for commands.";

/// Reply text for a parsed command and, for downloads, its result.
///
/// A download command without a result is treated as failed.
pub fn reply_for(command: &Command, result: Option<&DownloadResult>, registry: &CommandRegistry) -> String {
    match command {
        Command::Help => registry.help_text(),
        Command::Unknown(_) => UNKNOWN_COMMAND.to_string(),
        Command::File(_) | Command::Video(_) | Command::App(_) => {
            let Some(result) = result.filter(|r| r.is_success()) else {
                return DOWNLOAD_FAILED.to_string();
            };
            match (command, &result.saved_path) {
                (Command::Video(_), _) => VIDEO_DOWNLOADED.to_string(),
                (Command::File(_), Some(path)) => format!("File saved: {}", path.display()),
                (Command::App(_), Some(path)) => format!("App saved: {}", path.display()),
                _ => DOWNLOAD_FAILED.to_string(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// Whatever actually performs downloads for the router.
#[async_trait]
pub trait DownloadBackend: Send + Sync {
    async fn fetch(&self, request: &DownloadRequest) -> DownloadResult;
}

#[async_trait]
impl DownloadBackend for DownloadService {
    async fn fetch(&self, request: &DownloadRequest) -> DownloadResult {
        DownloadService::fetch(self, request).await
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Stateless across calls; every effect goes through the backend.
pub struct CommandRouter {
    registry: CommandRegistry,
    backend: Arc<dyn DownloadBackend>,
}

impl CommandRouter {
    pub fn new(backend: Arc<dyn DownloadBackend>) -> Self {
        Self {
            registry: CommandRegistry::new(),
            backend,
        }
    }

    /// Dispatch raw text and return the reply text.
    pub async fn dispatch(&self, text: &str) -> String {
        self.handle(&InboundMessage::new("direct", "local", text)).await.text
    }

    /// Dispatch an inbound message and build the reply addressed to its sender.
    pub async fn handle(&self, message: &InboundMessage) -> OutboundReply {
        let command = parse_command(&message.text, &self.registry);
        debug!(message_id = %message.id, channel = %message.channel, ?command, "Parsed command");

        let message_id = message.id.to_string();
        let result = match command.download_request() {
            Some(request) => {
                EventLogger::log_event(
                    &message_id,
                    DownloadEvent::Requested {
                        kind: request.kind.to_string(),
                        url: request.url.clone(),
                    },
                );
                let result = self.backend.fetch(&request).await;
                EventLogger::log_event(&message_id, outcome_event(&request, &result));
                Some(result)
            }
            None => {
                if let Command::Unknown(text) = &command {
                    EventLogger::log_event(&message_id, DownloadEvent::Unrecognized { text: text.clone() });
                }
                None
            }
        };

        let reply = reply_for(&command, result.as_ref(), &self.registry);
        info!(message_id = %message.id, channel = %message.channel, "Reply ready");
        message.reply(reply)
    }
}

fn outcome_event(request: &DownloadRequest, result: &DownloadResult) -> DownloadEvent {
    let kind = request.kind.to_string();
    match (result.is_success(), &result.saved_path) {
        (true, Some(path)) => DownloadEvent::Saved {
            kind,
            path: path.display().to_string(),
        },
        (true, None) => DownloadEvent::Completed { kind },
        (false, _) => DownloadEvent::Failed {
            kind,
            url: request.url.clone(),
            detail: result.error_detail.clone().unwrap_or_default(),
        },
    }
}
