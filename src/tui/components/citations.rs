use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use storechat::chat::CitationsView;

use crate::tui::{
    components::{Component, PanelView},
    Event, Theme,
};

/// Collapsible list of the references behind the latest answer. Starts
/// collapsed; each new answer collapses it again.
pub struct CitationsPanel {
    is_focused: bool,
    expanded: bool,
    scroll: u16,
    max_scroll: u16,
}

impl CitationsPanel {
    pub fn new() -> Self {
        Self {
            is_focused: false,
            expanded: false,
            scroll: 0,
            max_scroll: 0,
        }
    }

    pub fn focus(&mut self) {
        self.is_focused = true;
    }

    pub fn unfocus(&mut self) {
        self.is_focused = false;
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
        self.scroll = 0;
    }

    /// Collapses after the citations were replaced.
    pub fn reset(&mut self) {
        self.expanded = false;
        self.scroll = 0;
    }

    fn entry_lines(citations: &CitationsView, theme: &Theme) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for entry in &citations.entries {
            lines.push(Line::from(Span::styled(
                format!("Reference {}", entry.reference),
                theme.highlight(),
            )));
            lines.push(Line::from(vec![
                Span::styled("  File ID: ", theme.secondary()),
                Span::styled(entry.source.clone(), theme.normal()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("  Page: ", theme.secondary()),
                Span::styled(entry.page.clone(), theme.normal()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("  Text: ", theme.secondary()),
                Span::styled(entry.excerpt.clone(), theme.normal()),
            ]));
            lines.push(Line::from(""));
        }
        lines
    }
}

impl Component for CitationsPanel {
    fn render(&mut self, frame: &mut Frame, area: Rect, view: &PanelView<'_>, theme: &Theme) {
        let border_style = if self.is_focused {
            theme.accent()
        } else {
            theme.border()
        };

        let Some(citations) = view.chat.citations else {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(" Citations ");
            frame.render_widget(
                Paragraph::new("No citations yet").block(block).style(theme.secondary()),
                area,
            );
            return;
        };

        let marker = if self.expanded { "▾" } else { "▸" };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(format!(" {} {} ", marker, citations.summary));

        let body = if self.expanded {
            let lines = Self::entry_lines(citations, theme);
            self.max_scroll = u16::try_from(lines.len().saturating_sub(1)).unwrap_or(u16::MAX);
            self.scroll = self.scroll.min(self.max_scroll);
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((self.scroll, 0))
        } else {
            Paragraph::new(Line::from(Span::styled(
                "Enter to show references",
                theme.secondary(),
            )))
        };

        frame.render_widget(body.block(block), area);
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        if !self.is_focused {
            return false;
        }

        match event {
            Event::Key(KeyEvent { code, .. }) => match code {
                KeyCode::Enter | KeyCode::Char(' ') => {
                    self.toggle();
                    true
                }
                KeyCode::Up | KeyCode::Char('k') if self.expanded => {
                    self.scroll = self.scroll.saturating_sub(1);
                    true
                }
                KeyCode::Down | KeyCode::Char('j') if self.expanded => {
                    self.scroll = self.scroll.saturating_add(1).min(self.max_scroll);
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }
}
