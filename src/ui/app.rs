use crate::client::RecommendationService;
use crate::config::Config;
use crate::events::{AppEvent, TuiEvent};
use crate::ui::conversation::{ConversationAction, ConversationManager};
use anyhow::{Context, Result};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste, EventStream, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Run the interactive chat until the user quits
pub async fn run(config: &Config, service: Arc<dyn RecommendationService>) -> Result<()> {
    let mut terminal = enter_terminal()?;
    let result = event_loop(&mut terminal, ConversationManager::new(config, service)).await;

    // Restore the terminal even when the loop failed
    if let Err(e) = leave_terminal(&mut terminal) {
        warn!(error = %e, "failed to restore terminal");
    }
    result
}

fn enter_terminal() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
        .context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn leave_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableBracketedPaste)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

async fn event_loop(terminal: &mut Tui, mut manager: ConversationManager) -> Result<()> {
    let mut events = EventStream::new();
    let mut ticker = interval(Duration::from_millis(150));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("chat started");
    loop {
        terminal
            .draw(|frame| frame.render_widget(&manager, frame.size()))
            .context("Failed to draw frame")?;

        let event = tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(event)) => match TuiEvent::from_crossterm(event) {
                    Some(event) => AppEvent::Tui(event),
                    None => continue,
                },
                Some(Err(e)) => {
                    warn!(error = %e, "terminal input error");
                    AppEvent::InputClosed
                }
                None => AppEvent::InputClosed,
            },
            Some(outcome) = manager.next_reply() => AppEvent::Reply(outcome),
            _ = ticker.tick(), if manager.is_waiting() => AppEvent::Tick,
        };

        match event {
            AppEvent::Tui(TuiEvent::Key(key)) => {
                if is_quit_key(&key) {
                    break;
                }
                if manager.handle_key(key) == ConversationAction::Exit {
                    break;
                }
            }
            AppEvent::Tui(TuiEvent::Paste(text)) => manager.handle_paste(&text),
            AppEvent::Tui(TuiEvent::Resize(_, _)) | AppEvent::Tick => {}
            AppEvent::Reply(outcome) => manager.apply_reply(outcome),
            AppEvent::InputClosed => break,
        }
    }

    info!(messages = manager.conversation().len(), "chat ended");
    Ok(())
}

fn is_quit_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}
