pub mod app;
pub mod components;
pub mod events;
pub mod theme;

pub use app::App;
pub use events::{Event, EventHandler};
pub use theme::Theme;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use storechat::app::AppState;

type Tui = Terminal<CrosstermBackend<Stdout>>;

fn setup_terminal() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

/// Runs the interactive chat until the user quits. The terminal is restored
/// on every exit path, panics included.
pub async fn run(app_state: Arc<AppState>, preferred_store: Option<String>) -> anyhow::Result<()> {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        default_hook(info);
    }));

    let tick_rate = Duration::from_millis(app_state.config().ui.tick_rate_ms);
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, app_state, preferred_store, tick_rate).await;

    restore_terminal()?;
    terminal.show_cursor()?;
    result
}

async fn event_loop(
    terminal: &mut Tui,
    app_state: Arc<AppState>,
    preferred_store: Option<String>,
    tick_rate: Duration,
) -> anyhow::Result<()> {
    let mut events = EventHandler::new(tick_rate);
    let mut app = App::new(app_state, events.sender(), preferred_store);
    app.initialize();
    info!("Terminal UI started");

    loop {
        terminal.draw(|frame| app.render(frame))?;

        if let Some(event) = events.next().await {
            app.handle_event(event);
        }
        if app.should_quit() {
            info!("Terminal UI closing");
            return Ok(());
        }
    }
}
