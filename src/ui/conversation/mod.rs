//! Conversation UI components for the chat interface

pub mod commands;
pub mod composer;
pub mod history;
pub mod indicator;
pub mod manager;

pub use commands::{get_help_text, parse_slash_command, SlashCommand};
pub use composer::{ComposerResult, ConversationComposer};
pub use history::TranscriptView;
pub use indicator::ThinkingIndicator;
pub use manager::{ConversationAction, ConversationManager};
