/// Command registry: the fixed set of chat commands and the help text built from it.
use fetchbot_core::DownloadKind;

use crate::types::{CommandAction, CommandDef};

/// First line of the help reply.
pub const HELP_HEADER: &str = "Fetchbot commands:";

fn download(alias: &str, description: &str, kind: DownloadKind) -> CommandDef {
    CommandDef {
        alias: alias.to_string(),
        arg: Some("<url>".to_string()),
        description: description.to_string(),
        action: CommandAction::Download(kind),
    }
}

/// Build the built-in command table.
pub fn builtin_commands() -> Vec<CommandDef> {
    vec![
        download("/download_file", "Download a file to the server", DownloadKind::File),
        download("/download_video", "Download a YouTube video", DownloadKind::Video),
        download("/download_app", "Download an app package", DownloadKind::App),
        CommandDef {
            alias: "/help".into(),
            arg: None,
            description: "Show this message".into(),
            action: CommandAction::Help,
        },
    ]
}

#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: Vec<CommandDef>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self { commands: builtin_commands() }
    }

    /// Exact, case-sensitive alias lookup.
    pub fn find_by_alias(&self, alias: &str) -> Option<&CommandDef> {
        self.commands.iter().find(|c| c.alias == alias)
    }

    /// Help reply listing every command, one per line.
    pub fn help_text(&self) -> String {
        let mut lines = vec![HELP_HEADER.to_string()];
        for cmd in &self.commands {
            lines.push(format!("{} - {}", cmd.usage(), cmd.description));
        }
        lines.join("\n")
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
