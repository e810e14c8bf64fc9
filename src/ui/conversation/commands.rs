use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Discard the conversation and start over
    New,
    /// Show help
    Help,
    /// Exit the application
    Bye,
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::New => "start a fresh conversation",
            SlashCommand::Help => "show available commands",
            SlashCommand::Bye => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }

    /// Whether this command can be run while a reply is outstanding.
    pub fn available_while_pending(self) -> bool {
        match self {
            SlashCommand::New => false,
            SlashCommand::Help | SlashCommand::Bye => true,
        }
    }
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let head = input.trim().strip_prefix('/')?;
    if head.is_empty() || head.contains(char::is_whitespace) {
        return None;
    }

    SlashCommand::from_str(head).ok().or_else(|| match head.to_lowercase().as_str() {
        "q" | "quit" | "exit" => Some(SlashCommand::Bye),
        "h" | "?" => Some(SlashCommand::Help),
        "reset" => Some(SlashCommand::New),
        _ => None,
    })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n");
    for command in SlashCommand::iter() {
        help.push_str(&format!("/{} - {}\n", command.command(), command.description()));
    }

    help.push_str("Aliases: /q, /quit and /exit for /bye, /h for /help, /reset for /new.\n");
    help.push_str("Enter sends, Shift+Enter adds a new line, Esc quits.");

    help
}
