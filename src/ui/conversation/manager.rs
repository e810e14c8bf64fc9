use crate::client::{RecommendationService, ReplyOutcome};
use crate::config::Config;
use crate::conversation::Conversation;
use crate::ui::conversation::{
    get_help_text, ComposerResult, ConversationComposer, SlashCommand, ThinkingIndicator,
    TranscriptView,
};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Widget,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Drives one conversation from the terminal: owns the store, spawns the
/// request for each accepted submission and applies replies as they arrive.
pub struct ConversationManager {
    conversation: Conversation,
    composer: ConversationComposer,
    service: Arc<dyn RecommendationService>,
    reply_tx: mpsc::UnboundedSender<ReplyOutcome>,
    reply_rx: mpsc::UnboundedReceiver<ReplyOutcome>,
    greeting: String,
    show_timestamps: bool,
    notices: Vec<String>,
    waiting_since: Option<Instant>,
}

impl ConversationManager {
    pub fn new(config: &Config, service: Arc<dyn RecommendationService>) -> Self {
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();

        Self {
            conversation: Conversation::new(config.greeting.clone()),
            composer: ConversationComposer::new(config.ui.placeholder.clone()),
            service,
            reply_tx,
            reply_rx,
            greeting: config.greeting.clone(),
            show_timestamps: config.ui.show_timestamps,
            notices: Vec::new(),
            waiting_since: None,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn composer(&self) -> &ConversationComposer {
        &self.composer
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> ConversationAction {
        match self.composer.handle_key(key) {
            ComposerResult::Submitted(input) => {
                self.submit(&input);
                ConversationAction::None
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => ConversationAction::None,
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        self.composer.insert_str(text);
    }

    /// Accept `text` into the conversation and start its request.
    ///
    /// Returns false when the store ignored the submission.
    pub fn submit(&mut self, text: &str) -> bool {
        let Some(turn) = self.conversation.submit_user_message(text) else {
            debug!(pending = self.conversation.is_pending(), "submission ignored");
            return false;
        };

        self.notices.clear();
        self.composer.set_locked(true);
        self.waiting_since = Some(Instant::now());
        info!(history_len = turn.history.len(), "requesting recommendation");

        let service = Arc::clone(&self.service);
        let reply_tx = self.reply_tx.clone();
        tokio::spawn(async move {
            let outcome = service.recommend(&turn).await;
            // The receiver lives as long as the manager; a closed channel
            // means the UI is shutting down.
            let _ = reply_tx.send(outcome);
        });

        true
    }

    /// Wait for the outcome of the in-flight request
    pub async fn next_reply(&mut self) -> Option<ReplyOutcome> {
        self.reply_rx.recv().await
    }

    /// Append the reply to the transcript and reopen the composer
    pub fn apply_reply(&mut self, outcome: ReplyOutcome) {
        match self.conversation.receive_reply(outcome) {
            Ok(message) => debug!(id = %message.id, "reply appended"),
            Err(e) => warn!(error = %e, "dropping reply"),
        }

        self.waiting_since = None;
        self.composer.set_locked(false);
    }

    pub fn is_waiting(&self) -> bool {
        self.conversation.is_pending()
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: SlashCommand) -> ConversationAction {
        if self.conversation.is_pending() && !command.available_while_pending() {
            self.notices = vec![format!("/{} is unavailable while waiting for a reply.", command.command())];
            return ConversationAction::None;
        }

        match command {
            SlashCommand::Help => {
                self.notices = vec![get_help_text()];
                ConversationAction::None
            }
            SlashCommand::New => {
                info!("starting a new conversation");
                self.conversation = Conversation::new(self.greeting.clone());
                self.notices.clear();
                ConversationAction::None
            }
            SlashCommand::Bye => ConversationAction::Exit,
        }
    }
}

impl Widget for &ConversationManager {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),    // Transcript
                Constraint::Length(5), // Composer
            ])
            .split(area);

        let reserved = if self.waiting_since.is_some() { 1 } else { 0 };
        TranscriptView::new(self.conversation.messages(), self.show_timestamps)
            .notices(&self.notices)
            .reserve_bottom(reserved)
            .render(chunks[0], buf);

        // needs a row between the borders
        if let (Some(since), true) = (self.waiting_since, chunks[0].height > 2) {
            // last row inside the transcript border
            let indicator_area = Rect {
                x: chunks[0].x + 1,
                y: (chunks[0].y + chunks[0].height).saturating_sub(2),
                width: chunks[0].width.saturating_sub(2),
                height: 1,
            };
            ThinkingIndicator::new(since).render(indicator_area, buf);
        }

        self.composer.render(chunks[1], buf);
    }
}
