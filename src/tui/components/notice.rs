use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::tui::{
    components::{centered_rect, Component, PanelView},
    Event, Theme,
};

/// Blocking message box; Enter or Esc dismisses it.
pub struct Notice {
    message: Option<String>,
}

impl Notice {
    pub fn new() -> Self {
        Self { message: None }
    }

    pub fn show(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn is_visible(&self) -> bool {
        self.message.is_some()
    }

    #[cfg(test)]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl Component for Notice {
    fn render(&mut self, frame: &mut Frame, area: Rect, _view: &PanelView<'_>, theme: &Theme) {
        let Some(message) = &self.message else {
            return;
        };

        let popup = centered_rect(40, 20, area);
        frame.render_widget(Clear, popup);

        let body = vec![
            Line::from(Span::styled(message.as_str(), theme.warning())),
            Line::from(""),
            Line::from(Span::styled("Press Enter to continue", theme.secondary())),
        ];
        let paragraph = Paragraph::new(body)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.warning())
                    .title(" Notice "),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .style(theme.normal());

        frame.render_widget(paragraph, popup);
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        if self.message.is_none() {
            return false;
        }
        if let Event::Key(key) = event {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.message = None;
            }
            return true;
        }
        false
    }
}
