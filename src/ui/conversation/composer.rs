use crate::ui::conversation::commands::{parse_slash_command, SlashCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Result returned when the user interacts with the conversation composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(SlashCommand),
    None,
}

/// State for the text area within the composer. `cursor` is a byte offset
/// that always sits on a char boundary of `content`.
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    pub cursor: usize,
}

/// Conversation composer for user input
#[derive(Clone)]
pub struct ConversationComposer {
    state: TextAreaState,
    placeholder: String,
    locked: bool,
}

impl ConversationComposer {
    pub fn new(placeholder: String) -> Self {
        Self {
            state: TextAreaState::default(),
            placeholder,
            locked: false,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.insert_char('\n');
                } else {
                    return self.take_submission();
                }
            }
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.state.cursor = self.prev_boundary(),
            KeyCode::Right => self.state.cursor = self.next_boundary(),
            KeyCode::Home => self.state.cursor = 0,
            KeyCode::End => self.state.cursor = self.state.content.len(),
            _ => {}
        }

        ComposerResult::None
    }

    /// Insert pasted text at the cursor
    pub fn insert_str(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n");
        self.state.content.insert_str(self.state.cursor, &text);
        self.state.cursor += text.len();
    }

    /// Slash commands are always handed out. Plain text is kept in the editor
    /// while the composer is locked or when it is blank.
    fn take_submission(&mut self) -> ComposerResult {
        if let Some(command) = parse_slash_command(&self.state.content) {
            self.clear();
            return ComposerResult::Command(command);
        }

        if self.locked || self.state.content.trim().is_empty() {
            return ComposerResult::None;
        }

        let content = std::mem::take(&mut self.state.content);
        self.state.cursor = 0;
        ComposerResult::Submitted(content)
    }

    fn insert_char(&mut self, c: char) {
        self.state.content.insert(self.state.cursor, c);
        self.state.cursor += c.len_utf8();
    }

    /// Delete character before cursor
    fn backspace(&mut self) {
        if self.state.cursor > 0 {
            let start = self.prev_boundary();
            self.state.content.replace_range(start..self.state.cursor, "");
            self.state.cursor = start;
        }
    }

    /// Delete character at cursor
    fn delete(&mut self) {
        if self.state.cursor < self.state.content.len() {
            let end = self.next_boundary();
            self.state.content.replace_range(self.state.cursor..end, "");
        }
    }

    fn prev_boundary(&self) -> usize {
        self.state.content[..self.state.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn next_boundary(&self) -> usize {
        self.state.content[self.state.cursor..]
            .chars()
            .next()
            .map(|c| self.state.cursor + c.len_utf8())
            .unwrap_or(self.state.cursor)
    }

    /// Refuse plain-text submissions, e.g. while a reply is outstanding
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Get current content
    pub fn content(&self) -> &str {
        &self.state.content
    }

    /// Clear content
    pub fn clear(&mut self) {
        self.state.content.clear();
        self.state.cursor = 0;
    }

    fn title(&self) -> &'static str {
        if self.locked {
            "Waiting for the assistant..."
        } else {
            "Message (Enter to send, /help for commands)"
        }
    }
}

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title())
            .style(if !self.locked {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);
        if inner_area.is_empty() {
            return;
        }

        if self.state.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
            return;
        }

        let mut content = self.state.content.clone();
        if !self.locked {
            content.insert(self.state.cursor, '▌');
        }

        // Show the tail when the draft is taller than the box
        let lines: Vec<&str> = content.split('\n').collect();
        let height = inner_area.height as usize;
        let start = lines.len().saturating_sub(height);
        for (i, line_text) in lines[start..].iter().enumerate() {
            let line = Line::from(vec![Span::raw(*line_text)]);
            buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
        }
    }
}
