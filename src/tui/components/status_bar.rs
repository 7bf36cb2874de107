use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::tui::{
    components::{Component, PanelView},
    Event, Theme,
};

#[derive(Clone, Debug, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Error(String),
}

pub struct StatusBar;

impl StatusBar {
    pub fn new() -> Self {
        Self
    }

    fn connection_indicator(view: &PanelView<'_>, theme: &Theme) -> (String, Style) {
        if view.chat.is_awaiting() {
            return (
                format!("◐ Waiting ({})", view.chat.outstanding),
                theme.warning(),
            );
        }
        match view.connection {
            ConnectionStatus::Connected => ("● Connected".to_string(), theme.success()),
            ConnectionStatus::Disconnected => ("○ Disconnected".to_string(), theme.secondary()),
            ConnectionStatus::Error(err) => (format!("● {}", err), theme.error()),
        }
    }
}

impl Component for StatusBar {
    fn render(&mut self, frame: &mut Frame, area: Rect, view: &PanelView<'_>, theme: &Theme) {
        let (connection, connection_style) = Self::connection_indicator(view, theme);
        let store = view
            .stores
            .active_label()
            .map(|label| format!("Store: {}", label))
            .unwrap_or_else(|| "No store selected".to_string());

        let status_line = Line::from(vec![
            Span::styled(view.status, theme.normal()),
            Span::raw(" | "),
            Span::styled(store, theme.accent()),
            Span::raw(" | "),
            Span::styled(view.backend_url, theme.secondary()),
            Span::raw(" | "),
            Span::styled(connection, connection_style),
            Span::raw(" | "),
            Span::styled("F1: Help", theme.secondary()),
            Span::raw(" | "),
            Span::styled("Ctrl+Q: Quit", theme.secondary()),
        ]);

        let paragraph = Paragraph::new(status_line)
            .block(Block::default().borders(Borders::TOP).border_style(theme.border()))
            .alignment(Alignment::Left);

        frame.render_widget(paragraph, area);
    }

    fn handle_event(&mut self, _event: &Event) -> bool {
        false
    }
}
