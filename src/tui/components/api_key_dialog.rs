use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Margin, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::tui::{
    components::{Component, InputBox, PanelView},
    Event, Theme,
};

/// What the dialog wants the app to do with a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogAction {
    Submit { api_key: String, remember: bool },
    Cancel,
    None,
}

/// Masked entry for the Gemini API key, opened with Ctrl+K.
pub struct ApiKeyDialog {
    input: InputBox,
    remember: bool,
    is_open: bool,
}

impl ApiKeyDialog {
    pub fn new() -> Self {
        let mut input = InputBox::masked("Paste your Gemini API key...");
        input.focus();
        Self {
            input,
            remember: true,
            is_open: false,
        }
    }

    pub fn open(&mut self) {
        self.input.clear();
        self.is_open = true;
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> DialogAction {
        if !self.is_open {
            return DialogAction::None;
        }

        match key.code {
            KeyCode::Enter => {
                let api_key = self.input.content().trim().to_string();
                if api_key.is_empty() {
                    return DialogAction::None;
                }
                self.is_open = false;
                self.input.clear();
                DialogAction::Submit {
                    api_key,
                    remember: self.remember,
                }
            }
            KeyCode::Esc => {
                self.is_open = false;
                self.input.clear();
                DialogAction::Cancel
            }
            KeyCode::Tab => {
                self.remember = !self.remember;
                DialogAction::None
            }
            _ if key.modifiers.contains(KeyModifiers::CONTROL) => DialogAction::None,
            _ => {
                self.input.handle_event(&Event::Key(key));
                DialogAction::None
            }
        }
    }
}

impl Component for ApiKeyDialog {
    fn render(&mut self, frame: &mut Frame, area: Rect, _view: &PanelView<'_>, theme: &Theme) {
        if !self.is_open {
            return;
        }

        let dialog_area = Rect {
            x: area.x + area.width / 6,
            y: area.y + area.height.saturating_sub(5) / 2,
            width: area.width - area.width / 3,
            height: 5.min(area.height),
        };
        frame.render_widget(Clear, dialog_area);

        let dialog_block = Block::default()
            .borders(Borders::ALL)
            .title(" Gemini API Key ")
            .border_style(theme.accent());
        let inner = dialog_area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        });
        frame.render_widget(dialog_block, dialog_area);

        let input_area = Rect { height: 1, ..inner };
        self.input.render_line(frame, input_area, theme);

        if inner.height >= 3 {
            let checkbox = if self.remember { "[x]" } else { "[ ]" };
            let hint = Line::from(vec![
                Span::styled(checkbox, theme.accent()),
                Span::styled(" Remember in keyring (Tab)  ", theme.normal()),
                Span::styled("Enter: save  Esc: cancel", theme.secondary()),
            ]);
            let hint_area = Rect {
                y: inner.y + 2,
                height: 1,
                ..inner
            };
            frame.render_widget(Paragraph::new(hint), hint_area);
        }
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        match event {
            Event::Key(key) if self.is_open => {
                self.handle_key(*key);
                true
            }
            _ => false,
        }
    }
}
