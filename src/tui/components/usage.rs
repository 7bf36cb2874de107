use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::tui::{
    components::{Component, PanelView},
    Event, Theme,
};

/// Token counts and response time of the latest exchange.
pub struct UsagePanel;

impl UsagePanel {
    pub fn new() -> Self {
        Self
    }
}

impl Component for UsagePanel {
    fn render(&mut self, frame: &mut Frame, area: Rect, view: &PanelView<'_>, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border())
            .title(" Token Usage ");

        let Some(usage) = view.chat.usage else {
            frame.render_widget(
                Paragraph::new("No requests yet").block(block).style(theme.secondary()),
                area,
            );
            return;
        };

        let mut lines: Vec<Line> = usage
            .tokens
            .map(|tokens| {
                tokens
                    .lines()
                    .into_iter()
                    .map(|line| Line::from(Span::styled(line, theme.normal())))
                    .collect()
            })
            .unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled("Time taken: ", theme.secondary()),
            Span::styled(usage.elapsed.clone(), theme.warning()),
        ]));

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn handle_event(&mut self, _event: &Event) -> bool {
        false
    }
}
