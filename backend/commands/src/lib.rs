pub mod detection;
pub mod dispatch;
pub mod registry;
pub mod types;

pub use detection::parse_command;
pub use dispatch::{
    reply_for, CommandRouter, DownloadBackend, DOWNLOAD_FAILED, UNKNOWN_COMMAND, VIDEO_DOWNLOADED,
};
pub use registry::{builtin_commands, CommandRegistry, HELP_HEADER};
pub use types::{Command, CommandAction, CommandDef};
