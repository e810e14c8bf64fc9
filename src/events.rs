use crate::client::ReplyOutcome;
use crossterm::event::{Event, KeyEvent, KeyEventKind};

/// Everything the chat loop reacts to
#[derive(Debug)]
pub enum AppEvent {
    /// Terminal input
    Tui(TuiEvent),

    /// Outcome of the in-flight chat request
    Reply(ReplyOutcome),

    /// Animation tick while a reply is outstanding
    Tick,

    /// The terminal event stream ended or failed
    InputClosed,
}

/// TUI-specific events (keyboard, paste, resize)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    /// Key press event
    Key(KeyEvent),

    /// Paste event
    Paste(String),

    /// Terminal resize
    Resize(u16, u16),
}

impl TuiEvent {
    /// Keep the terminal events the chat cares about. Key releases and repeats
    /// are dropped so a held key submits once.
    pub fn from_crossterm(event: Event) -> Option<Self> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(TuiEvent::Key(key)),
            Event::Paste(text) => Some(TuiEvent::Paste(text)),
            Event::Resize(width, height) => Some(TuiEvent::Resize(width, height)),
            _ => None,
        }
    }
}
