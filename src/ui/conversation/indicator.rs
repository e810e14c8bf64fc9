use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};
use std::time::{Duration, Instant};

const FRAME: Duration = Duration::from_millis(300);

/// "BookWise is thinking..." line shown while a reply is outstanding
#[derive(Debug, Clone, Copy)]
pub struct ThinkingIndicator {
    since: Instant,
}

impl ThinkingIndicator {
    pub fn new(since: Instant) -> Self {
        Self { since }
    }

    /// Animated dots for the current frame
    pub fn dots(&self, now: Instant) -> &'static str {
        let frame = now.saturating_duration_since(self.since).as_millis() / FRAME.as_millis();
        match frame % 4 {
            0 => ".",
            1 => "..",
            2 => "...",
            _ => "   ",
        }
    }
}

impl Widget for ThinkingIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }

        let indicator = Line::from(vec![
            Span::styled("📚 ", Style::default().fg(Color::Green)),
            Span::styled("BookWise is thinking", Style::default().fg(Color::Green)),
            Span::styled(self.dots(Instant::now()), Style::default().fg(Color::Yellow)),
        ]);
        buf.set_line(area.x, area.y, &indicator, area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dots_cycle_every_four_frames() {
        let start = Instant::now();
        let indicator = ThinkingIndicator::new(start);
        let frames: Vec<&str> = (0..5).map(|i| indicator.dots(start + FRAME * i)).collect();
        assert_eq!(frames, vec![".", "..", "...", "   ", "."]);
    }
}
