//! Bot commands understood by the relay.

use teloxide::types::BotCommand;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Zones,
    Pause,
    Home,
    Status,
    /// Sent by Telegram when a user first opens the chat. Ignored.
    Start,
    Unknown(String),
}

impl Command {
    /// Parse a `/command[@botname] [args]` message. Returns `None` for plain text.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim_start().strip_prefix('/')?;
        let word = rest.split_whitespace().next()?;
        let name = word.split_once('@').map_or(word, |(name, _bot)| name);
        if name.is_empty() {
            return None;
        }

        Some(match name {
            "zones" => Self::Zones,
            "pause" => Self::Pause,
            "home" => Self::Home,
            "status" => Self::Status,
            "start" => Self::Start,
            other => Self::Unknown(other.to_string()),
        })
    }

    /// Commands advertised in the Telegram menu.
    pub fn menu() -> Vec<BotCommand> {
        vec![
            BotCommand::new("zones", "List zones for cleanup"),
            BotCommand::new("pause", "Pause"),
            BotCommand::new("home", "Go back to the dock"),
            BotCommand::new("status", "Display status"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_commands() {
        assert_eq!(Command::parse("/zones"), Some(Command::Zones));
        assert_eq!(Command::parse("/pause"), Some(Command::Pause));
        assert_eq!(Command::parse("/home"), Some(Command::Home));
        assert_eq!(Command::parse("/status"), Some(Command::Status));
        assert_eq!(Command::parse("/start"), Some(Command::Start));
    }

    #[test]
    fn test_bot_suffix_and_arguments_ignored() {
        assert_eq!(Command::parse("/status@vacuum_bot"), Some(Command::Status));
        assert_eq!(Command::parse("/home now please"), Some(Command::Home));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(Command::parse("/dance"), Some(Command::Unknown("dance".into())));
        assert_eq!(Command::parse("/Status"), Some(Command::Unknown("Status".into())));
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(Command::parse("status"), None);
        assert_eq!(Command::parse("/"), None);
        assert_eq!(Command::parse("/@vacuum_bot"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn test_menu_hides_start() {
        let names: Vec<String> = Command::menu().into_iter().map(|c| c.command).collect();
        assert_eq!(names, vec!["zones", "pause", "home", "status"]);
    }
}
