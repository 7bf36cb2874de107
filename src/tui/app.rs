use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use storechat::api::{ChatFailure, ChatOutcome};
use storechat::app::AppState;
use storechat::chat::{ChatPanel, PendingChat};
use storechat::stores::StoreSelector;

use crate::tui::{
    components::{
        api_key_dialog::DialogAction, ApiKeyDialog, ChatView, CitationsPanel, Component,
        ConnectionStatus, HelpPopup, InputBox, Notice, PanelView, StatusBar, StoreList,
        UsagePanel,
    },
    Event, Theme,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FocusedPanel {
    Stores,
    Chat,
    Citations,
    Input,
}

pub struct App {
    // Components
    store_list: StoreList,
    chat_view: ChatView,
    citations: CitationsPanel,
    usage: UsagePanel,
    input_box: InputBox,
    status_bar: StatusBar,
    help_popup: HelpPopup,
    notice: Notice,
    api_key_dialog: ApiKeyDialog,

    // State
    panel: ChatPanel,
    stores: StoreSelector,
    status: String,
    connection: ConnectionStatus,
    backend_url: String,
    focused_panel: FocusedPanel,
    theme: Theme,
    should_quit: bool,

    // Backend integration
    app_state: Arc<AppState>,
    event_sender: mpsc::UnboundedSender<Event>,
}

impl App {
    pub fn new(
        app_state: Arc<AppState>,
        event_sender: mpsc::UnboundedSender<Event>,
        preferred_store: Option<String>,
    ) -> Self {
        let default_store = app_state.config().ui.default_store.clone();

        let mut app = Self {
            store_list: StoreList::new(),
            chat_view: ChatView::new(),
            citations: CitationsPanel::new(),
            usage: UsagePanel::new(),
            input_box: InputBox::new(),
            status_bar: StatusBar::new(),
            help_popup: HelpPopup::new(),
            notice: Notice::new(),
            api_key_dialog: ApiKeyDialog::new(),
            panel: ChatPanel::new(),
            stores: StoreSelector::new(preferred_store.or(default_store)),
            status: "Ready".to_string(),
            connection: ConnectionStatus::Disconnected,
            backend_url: app_state.config().backend.base_url.clone(),
            focused_panel: FocusedPanel::Stores,
            theme: Theme::from_name(&app_state.config().ui.theme),
            should_quit: false,
            app_state,
            event_sender,
        };

        app.update_focus();
        app
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Pushes a remembered API key to the backend, then loads the stores.
    pub fn initialize(&mut self) {
        self.status = "Loading stores...".to_string();

        let state = self.app_state.clone();
        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            match state.sync_remembered_key().await {
                Ok(Some(ack)) if !ack.success => {
                    let _ = sender.send(Event::Status(format!(
                        "Remembered API key rejected: {}",
                        ack.message
                    )));
                }
                Ok(_) => {}
                Err(e) => warn!("Could not push the remembered API key: {}", e),
            }

            let result = state.backend().list_stores().await.map_err(|e| e.to_string());
            let _ = sender.send(Event::StoresLoaded(result));
        });
    }

    pub fn handle_event(&mut self, event: Event) {
        // Modal layers first
        if self.notice.handle_event(&event) {
            return;
        }
        if self.api_key_dialog.is_open() {
            if let Event::Key(key) = event {
                self.handle_dialog_key(key);
                return;
            }
        }
        if self.help_popup.is_visible() && self.help_popup.handle_event(&event) {
            return;
        }

        match event {
            Event::Key(key) => {
                if self.handle_global_keys(key) {
                    return;
                }
                self.handle_panel_specific_keys(key);
            }
            Event::ChatCompleted { pending, outcome } => {
                self.handle_chat_completed(pending, outcome);
            }
            Event::StoresLoaded(Ok(stores)) => {
                let count = stores.len();
                self.stores.replace(stores);
                self.store_list.set_len(count);
                if let Some(index) = self.active_store_index() {
                    self.store_list.highlight(index);
                }
                self.connection = ConnectionStatus::Connected;
                self.status = format!("Loaded {} store(s)", count);
            }
            Event::StoresLoaded(Err(e)) => {
                warn!("Loading stores failed: {}", e);
                self.connection = ConnectionStatus::Error("Backend unreachable".to_string());
                self.status = format!("Error loading stores: {}", e);
            }
            Event::ApiKeyConfigured(Ok(ack)) => {
                if ack.success {
                    self.status = ack.message;
                    self.refresh_stores();
                } else {
                    self.notice.show(ack.message);
                }
            }
            Event::ApiKeyConfigured(Err(e)) => {
                self.status = format!("Error configuring API key: {}", e);
            }
            Event::Status(status) => {
                self.status = status;
            }
            Event::Tick | Event::Mouse(_) | Event::Resize(_, _) => {}
        }
    }

    fn handle_global_keys(&mut self, key: KeyEvent) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL)
            | (KeyCode::Char('q'), KeyModifiers::CONTROL) => {
                self.should_quit = true;
                true
            }
            (KeyCode::F(1), _) | (KeyCode::Char('h'), KeyModifiers::CONTROL) => {
                self.help_popup.toggle();
                true
            }
            (KeyCode::Char('k'), KeyModifiers::CONTROL) => {
                self.api_key_dialog.open();
                self.status = "Enter API key (Enter to save, Esc to cancel)".to_string();
                true
            }
            (KeyCode::Char('r'), KeyModifiers::CONTROL) => {
                self.refresh_stores();
                true
            }
            (KeyCode::Tab, KeyModifiers::NONE) => {
                self.next_panel();
                true
            }
            (KeyCode::BackTab, _) => {
                self.previous_panel();
                true
            }
            (KeyCode::Char('1'), KeyModifiers::ALT) => {
                self.set_focused_panel(FocusedPanel::Stores);
                true
            }
            (KeyCode::Char('2'), KeyModifiers::ALT) => {
                self.set_focused_panel(FocusedPanel::Chat);
                true
            }
            (KeyCode::Char('3'), KeyModifiers::ALT) => {
                self.set_focused_panel(FocusedPanel::Citations);
                true
            }
            (KeyCode::Char('4'), KeyModifiers::ALT) => {
                self.set_focused_panel(FocusedPanel::Input);
                true
            }
            (KeyCode::Esc, KeyModifiers::NONE) => {
                self.set_focused_panel(FocusedPanel::Stores);
                true
            }
            _ => false,
        }
    }

    fn handle_panel_specific_keys(&mut self, key: KeyEvent) {
        let event = Event::Key(key);
        let handled = match self.focused_panel {
            FocusedPanel::Stores => self.store_list.handle_event(&event),
            FocusedPanel::Chat => self.chat_view.handle_event(&event),
            FocusedPanel::Citations => self.citations.handle_event(&event),
            FocusedPanel::Input => self.input_box.handle_event(&event),
        };
        if handled {
            return;
        }

        match self.focused_panel {
            FocusedPanel::Stores => match key.code {
                KeyCode::Enter => self.select_highlighted_store(),
                KeyCode::Char('c') => {
                    self.stores.clear();
                    self.status = "Store selection cleared".to_string();
                }
                KeyCode::Char('r') => self.refresh_stores(),
                _ => {}
            },
            FocusedPanel::Input => {
                if key.code == KeyCode::Enter {
                    self.submit_input();
                }
            }
            _ => {}
        }
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) {
        match self.api_key_dialog.handle_key(key) {
            DialogAction::Submit { api_key, remember } => {
                self.status = "Validating API key...".to_string();
                let state = self.app_state.clone();
                let sender = self.event_sender.clone();
                tokio::spawn(async move {
                    let result = state
                        .configure_api_key(&api_key, remember)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = sender.send(Event::ApiKeyConfigured(result));
                });
            }
            DialogAction::Cancel => {
                self.status = "API key entry cancelled".to_string();
            }
            DialogAction::None => {}
        }
    }

    fn select_highlighted_store(&mut self) {
        let Some(name) = self
            .store_list
            .highlighted()
            .and_then(|index| self.stores.stores().get(index))
            .map(|store| store.name.clone())
        else {
            return;
        };
        if !self.stores.select(&name) {
            return;
        }
        info!("Using store {}", name);
        let label = self.stores.active_label().unwrap_or(&name).to_string();

        self.set_focused_panel(FocusedPanel::Input);
        self.status = format!("Using store {}", label);
    }

    fn active_store_index(&self) -> Option<usize> {
        let active = self.stores.active()?;
        self.stores.stores().iter().position(|s| s.name == active)
    }

    fn refresh_stores(&mut self) {
        self.status = "Loading stores...".to_string();
        let backend = self.app_state.backend();
        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            let result = backend.list_stores().await.map_err(|e| e.to_string());
            let _ = sender.send(Event::StoresLoaded(result));
        });
    }

    /// Validation failures open a notice and keep the typed text.
    fn submit_input(&mut self) {
        let content = self.input_box.content();
        match self.panel.submit(&content, self.stores.active()) {
            Ok(pending) => {
                self.input_box.clear();
                self.chat_view.scroll_to_bottom();
                self.status = "Waiting for response...".to_string();
                self.spawn_chat(pending);
            }
            Err(e) => {
                debug!("Submission rejected: {}", e);
                self.notice.show(e.to_string());
            }
        }
    }

    fn spawn_chat(&self, pending: PendingChat) {
        let backend = self.app_state.backend();
        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            let outcome = ChatOutcome::from_result(backend.chat(&pending.request).await);
            let _ = sender.send(Event::ChatCompleted { pending, outcome });
        });
    }

    fn handle_chat_completed(&mut self, pending: PendingChat, outcome: ChatOutcome) {
        match &outcome {
            ChatOutcome::Success(_) => {
                self.connection = ConnectionStatus::Connected;
                self.citations.reset();
                self.status = "Response received".to_string();
            }
            ChatOutcome::Failure(ChatFailure::Remote { .. }) => {
                self.connection = ConnectionStatus::Connected;
                self.status = "The backend reported an error".to_string();
            }
            ChatOutcome::Failure(ChatFailure::Transport { .. }) => {
                self.connection = ConnectionStatus::Error("Backend unreachable".to_string());
                self.status = "Error connecting to the API".to_string();
            }
        }
        self.panel.complete(pending, outcome);
        self.chat_view.scroll_to_bottom();
    }

    fn next_panel(&mut self) {
        self.focused_panel = match self.focused_panel {
            FocusedPanel::Stores => FocusedPanel::Chat,
            FocusedPanel::Chat => FocusedPanel::Citations,
            FocusedPanel::Citations => FocusedPanel::Input,
            FocusedPanel::Input => FocusedPanel::Stores,
        };
        self.update_focus();
    }

    fn previous_panel(&mut self) {
        self.focused_panel = match self.focused_panel {
            FocusedPanel::Stores => FocusedPanel::Input,
            FocusedPanel::Chat => FocusedPanel::Stores,
            FocusedPanel::Citations => FocusedPanel::Chat,
            FocusedPanel::Input => FocusedPanel::Citations,
        };
        self.update_focus();
    }

    fn set_focused_panel(&mut self, panel: FocusedPanel) {
        self.focused_panel = panel;
        self.update_focus();
    }

    fn update_focus(&mut self) {
        self.store_list.unfocus();
        self.chat_view.unfocus();
        self.citations.unfocus();
        self.input_box.unfocus();

        match self.focused_panel {
            FocusedPanel::Stores => {
                self.store_list.focus();
                self.status = "Select a store (Enter to use, r to refresh)".to_string();
            }
            FocusedPanel::Chat => {
                self.chat_view.focus();
                self.status = "Reading transcript (Tab to continue)".to_string();
            }
            FocusedPanel::Citations => {
                self.citations.focus();
                self.status = "Citations (Enter to expand or collapse)".to_string();
            }
            FocusedPanel::Input => {
                self.input_box.focus();
                self.status = "Type your message (Enter to send)".to_string();
            }
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // Main content
                Constraint::Length(2), // Status bar
            ])
            .split(frame.size());

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(32), // Stores
                Constraint::Min(1),     // Chat area
            ])
            .split(chunks[0]);

        let citations_height = if self.citations.is_expanded() { 12 } else { 3 };
        let right_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),
                Constraint::Length(citations_height),
                Constraint::Length(6),
                Constraint::Length(3),
            ])
            .split(main_chunks[1]);

        let view = PanelView {
            chat: self.panel.view(),
            stores: &self.stores,
            status: &self.status,
            connection: &self.connection,
            backend_url: &self.backend_url,
        };

        self.store_list.render(frame, main_chunks[0], &view, &self.theme);
        self.chat_view.render(frame, right_chunks[0], &view, &self.theme);
        self.citations.render(frame, right_chunks[1], &view, &self.theme);
        self.usage.render(frame, right_chunks[2], &view, &self.theme);
        self.input_box.render(frame, right_chunks[3], &view, &self.theme);
        self.status_bar.render(frame, chunks[1], &view, &self.theme);

        // Overlays, topmost last
        let full = frame.size();
        self.api_key_dialog.render(frame, full, &view, &self.theme);
        self.help_popup.render(frame, full, &view, &self.theme);
        self.notice.render(frame, full, &view, &self.theme);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::components::testing::buffer_text;
    use async_trait::async_trait;
    use ratatui::{backend::TestBackend, Terminal};
    use storechat::api::{ApiKeyAck, ChatBackend, ChatReply, ChatRequest, StoreSummary};
    use storechat::app::AppConfig;
    use storechat::platform::{MemoryStorage, SecureStorageManager};
    use storechat::Result;

    struct CannedBackend;

    #[async_trait]
    impl ChatBackend for CannedBackend {
        async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
            Ok(serde_json::from_value(serde_json::json!({
                "query": request.query,
                "response": "Forty-two.",
                "citations": [{"source": "guide.pdf", "page": "Page 7", "text": "The answer is 42."}],
                "usage": {"total_token_count": 42, "prompt_token_count": 40, "candidates_token_count": 2}
            }))?)
        }

        async fn list_stores(&self) -> Result<Vec<StoreSummary>> {
            Ok(vec![store()])
        }

        async fn configure_api_key(&self, _api_key: &str) -> Result<ApiKeyAck> {
            Ok(ApiKeyAck {
                success: true,
                message: "API key configured successfully".to_string(),
            })
        }
    }

    fn store() -> StoreSummary {
        StoreSummary {
            name: "fileSearchStores/guides".to_string(),
            display_name: Some("Guides".to_string()),
            active_documents_count: 3,
            ..Default::default()
        }
    }

    fn app() -> (App, mpsc::UnboundedReceiver<Event>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let state = AppState::with_backend(
            AppConfig::default(),
            SecureStorageManager::with_backend(Box::new(MemoryStorage::default())),
            Arc::new(CannedBackend),
        );
        (App::new(Arc::new(state), sender, None), receiver)
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(110, 40)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[tokio::test]
    async fn test_initial_render() {
        let (mut app, _rx) = app();
        let screen = draw(&mut app);
        assert!(screen.contains("Stores (0)"));
        assert!(screen.contains("No citations yet"));
        assert!(screen.contains("Token Usage"));
        assert!(screen.contains("No store selected"));
    }

    #[tokio::test]
    async fn test_submit_without_store_shows_notice() {
        let (mut app, _rx) = app();
        app.set_focused_panel(FocusedPanel::Input);
        app.input_box.set_content("hello".to_string());

        app.handle_event(key(KeyCode::Enter));
        assert_eq!(app.notice.message(), Some("Please select a store"));
        assert!(app.panel.transcript().is_empty());
        assert_eq!(app.input_box.content(), "hello");
        assert!(draw(&mut app).contains("Please select a store"));

        // The notice swallows the key that dismisses it.
        app.handle_event(key(KeyCode::Enter));
        assert!(!app.notice.is_visible());
        assert!(app.panel.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_shows_notice() {
        let (mut app, _rx) = app();
        app.handle_event(Event::StoresLoaded(Ok(vec![store()])));
        app.handle_event(key(KeyCode::Enter));
        assert_eq!(app.stores.active(), Some("fileSearchStores/guides"));
        assert_eq!(app.focused_panel, FocusedPanel::Input);

        app.handle_event(key(KeyCode::Enter));
        assert_eq!(app.notice.message(), Some("Please enter a message"));
    }

    #[tokio::test]
    async fn test_chat_round_trip() {
        let (mut app, mut rx) = app();
        app.handle_event(Event::StoresLoaded(Ok(vec![store()])));
        app.handle_event(key(KeyCode::Enter));
        app.input_box.set_content("What is the answer?".to_string());
        app.handle_event(key(KeyCode::Enter));

        assert_eq!(app.panel.transcript().len(), 1);
        assert!(app.panel.view().is_awaiting());
        assert_eq!(app.input_box.content(), "");

        let completed = rx.recv().await.unwrap();
        assert!(matches!(completed, Event::ChatCompleted { .. }));
        app.handle_event(completed);

        assert_eq!(app.panel.transcript().len(), 2);
        assert_eq!(app.panel.transcript()[1].text(), "Forty-two.");
        assert_eq!(app.connection, ConnectionStatus::Connected);

        let screen = draw(&mut app);
        assert!(screen.contains("Citations (1 references used)"));
        assert!(screen.contains("Total tokens used: 42"));
        assert!(screen.contains("Time taken:"));

        app.set_focused_panel(FocusedPanel::Citations);
        app.handle_event(key(KeyCode::Enter));
        let screen = draw(&mut app);
        assert!(screen.contains("Reference 1"));
        assert!(screen.contains("File ID: guide.pdf"));
        assert!(screen.contains("Page: Page 7"));
    }

    #[tokio::test]
    async fn test_api_key_dialog_flow() {
        let (mut app, mut rx) = app();
        app.handle_event(Event::Key(KeyEvent::new(
            KeyCode::Char('k'),
            KeyModifiers::CONTROL,
        )));
        assert!(app.api_key_dialog.is_open());
        assert!(draw(&mut app).contains("Gemini API Key"));

        for c in "AIza-test".chars() {
            app.handle_event(key(KeyCode::Char(c)));
        }
        app.handle_event(key(KeyCode::Enter));
        assert!(!app.api_key_dialog.is_open());

        let configured = rx.recv().await.unwrap();
        app.handle_event(configured);
        assert_eq!(app.status, "Loading stores...");
        assert_eq!(
            app.app_state.remembered_api_key().await.unwrap().as_deref(),
            Some("AIza-test")
        );

        let loaded = rx.recv().await.unwrap();
        app.handle_event(loaded);
        assert_eq!(app.stores.len(), 1);
    }
}
