//! Transcript display component

use crate::conversation::{Author, Message};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Read-only view over the conversation transcript.
///
/// Always shows the newest lines; older lines scroll off the top.
pub struct TranscriptView<'a> {
    messages: &'a [Message],
    notices: &'a [String],
    show_timestamps: bool,
    reserved_rows: u16,
}

impl<'a> TranscriptView<'a> {
    pub fn new(messages: &'a [Message], show_timestamps: bool) -> Self {
        Self {
            messages,
            notices: &[],
            show_timestamps,
            reserved_rows: 0,
        }
    }

    /// UI-only notices (help text and the like) shown after the transcript
    pub fn notices(mut self, notices: &'a [String]) -> Self {
        self.notices = notices;
        self
    }

    /// Leave `rows` empty at the bottom for the thinking indicator
    pub fn reserve_bottom(mut self, rows: u16) -> Self {
        self.reserved_rows = rows;
        self
    }

    /// All lines of the transcript laid out for `width` columns
    pub fn lines(&self, width: u16) -> Vec<Line<'a>> {
        let mut all_lines = Vec::new();
        for message in self.messages {
            all_lines.extend(self.render_message(message, width));
            all_lines.push(Line::from(""));
        }

        for notice in self.notices {
            for text in wrap_text(notice, width.saturating_sub(2) as usize) {
                all_lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(text, Style::default().fg(Color::Yellow)),
                ]));
            }
            all_lines.push(Line::from(""));
        }

        all_lines
    }

    /// Render a single message into lines
    fn render_message(&self, message: &Message, width: u16) -> Vec<Line<'a>> {
        let (marker, label) = match message.author {
            Author::User => ("👤", "You"),
            Author::Assistant => ("📚", "BookWise"),
        };

        let header = if self.show_timestamps {
            let timestamp = message.created_at.with_timezone(&chrono::Local).format("%H:%M:%S");
            format!("{marker} {label} {timestamp} {}", "─".repeat(12))
        } else {
            format!("{marker} {label} {}", "─".repeat(12))
        };

        let mut lines = vec![Line::from(vec![Span::styled(
            header,
            Style::default().fg(Color::DarkGray),
        )])];

        let style = content_style(message.author);
        for content_line in wrap_text(&message.content, width.saturating_sub(2) as usize) {
            lines.push(Line::from(vec![Span::raw("  "), Span::styled(content_line, style)]));
        }

        lines
    }
}

impl Widget for TranscriptView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("📖 Chat with BookWise Assistant");

        let inner_area = block.inner(area);
        block.render(area, buf);
        if inner_area.is_empty() {
            return;
        }

        let all_lines = self.lines(inner_area.width);
        let height = inner_area.height.saturating_sub(self.reserved_rows) as usize;
        let start = all_lines.len().saturating_sub(height);

        for (i, line) in all_lines[start..].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

/// Get content style based on author
fn content_style(author: Author) -> Style {
    match author {
        Author::User => Style::default().fg(Color::Blue),
        Author::Assistant => Style::default().fg(Color::Green),
    }
}

/// Word-wrap `text` to `width` columns, keeping explicit line breaks.
/// Words longer than a line are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current_line));
                    current_len = 0;
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed > width {
                lines.push(std::mem::take(&mut current_line));
                current_len = 0;
            }
            if current_len > 0 {
                current_line.push(' ');
                current_len += 1;
            }
            current_len += word.len();
            current_line.extend(word);
        }

        lines.push(current_line);
    }

    lines
}
