//! Built-in slash commands, intercepted before the answer service.

/// A recognized command. Unrecognized tokens fall back to Help so a typo
/// never turns into an error or an answer-service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Clear,
}

impl Command {
    /// Parse a message text into a command. Returns None when the text does
    /// not start with "/" (i.e. it is a question, not a command).
    pub fn parse(text: &str) -> Option<Command> {
        let text = text.trim();
        if !text.starts_with('/') {
            return None;
        }
        match text {
            "/clear" => Some(Command::Clear),
            _ => Some(Command::Help),
        }
    }
}

/// Usage message sent for /help and for any unrecognized command.
pub const USAGE: &str = "Commands:\n/help - show this message\n/clear - forget this conversation's history\nAnything else is sent to the answer service.";

/// Confirmation sent after /clear.
pub const CLEAR_CONFIRMATION: &str = "Conversation history cleared.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(Command::parse("/help"), Some(Command::Help));
        assert_eq!(Command::parse("/clear"), Some(Command::Clear));
        assert_eq!(Command::parse("  /clear  "), Some(Command::Clear));
    }

    #[test]
    fn unknown_command_defaults_to_help() {
        assert_eq!(Command::parse("/reset"), Some(Command::Help));
        assert_eq!(Command::parse("/"), Some(Command::Help));
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(Command::parse("hello"), None);
        assert_eq!(Command::parse("what is /clear?"), None);
    }
}
