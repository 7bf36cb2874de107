use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::timeout;

use storechat::api::{ApiKeyAck, ChatOutcome, StoreSummary};
use storechat::chat::PendingChat;

#[derive(Clone, Debug)]
pub enum Event {
    /// Terminal tick event
    Tick,
    /// Key press event
    Key(KeyEvent),
    #[allow(dead_code)]
    Mouse(MouseEvent),
    #[allow(dead_code)]
    Resize(u16, u16),
    /// A backend chat call finished.
    ChatCompleted {
        pending: PendingChat,
        outcome: ChatOutcome,
    },
    StoresLoaded(Result<Vec<StoreSummary>, String>),
    ApiKeyConfigured(Result<ApiKeyAck, String>),
    Status(String),
}

pub struct EventHandler {
    sender: mpsc::UnboundedSender<Event>,
    receiver: mpsc::UnboundedReceiver<Event>,
    last_tick: Instant,
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver,
            last_tick: Instant::now(),
            tick_rate,
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }

    /// Next event from background tasks, the terminal or the tick timer.
    /// `None` means nothing happened within one polling round.
    pub async fn next(&mut self) -> Option<Event> {
        if let Ok(event) = timeout(Duration::from_millis(10), self.receiver.recv()).await {
            return event;
        }

        if event::poll(Duration::from_millis(0)).unwrap_or(false) {
            match event::read() {
                // Windows reports releases as well.
                Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    return Some(Event::Key(key))
                }
                Ok(CrosstermEvent::Mouse(mouse)) => return Some(Event::Mouse(mouse)),
                Ok(CrosstermEvent::Resize(w, h)) => return Some(Event::Resize(w, h)),
                _ => {}
            }
        }

        if self.last_tick.elapsed() >= self.tick_rate {
            self.last_tick = Instant::now();
            return Some(Event::Tick);
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
        None
    }
}
