/// Command detection: turn one line of chat text into a [`Command`].
use crate::registry::CommandRegistry;
use crate::types::{Command, CommandAction};

/// Parse `text` against the registry.
///
/// The text is split on the first space only. A download alias must be
/// followed by that space; everything after it is the URL, verbatim, and may
/// be empty. `/help` must match exactly. Only trailing line terminators are
/// stripped beforehand.
pub fn parse_command(text: &str, registry: &CommandRegistry) -> Command {
    let line = text.trim_end_matches(['\r', '\n']);

    let (alias, arg) = match line.split_once(' ') {
        Some((alias, rest)) => (alias, Some(rest)),
        None => (line, None),
    };

    let Some(def) = registry.find_by_alias(alias) else {
        return Command::Unknown(line.to_string());
    };

    match (def.action, arg) {
        (CommandAction::Download(kind), Some(rest)) => Command::for_kind(kind, rest.to_string()),
        (CommandAction::Help, None) => Command::Help,
        _ => Command::Unknown(line.to_string()),
    }
}
