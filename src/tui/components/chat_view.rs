use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use storechat::chat::{ChatMessage, Sender};

use crate::tui::{
    components::{wrap_text, Component, PanelView},
    Event, Theme,
};

/// Scrollable transcript.
pub struct ChatView {
    is_focused: bool,
    auto_scroll: bool,
    scroll_offset: usize,
}

impl ChatView {
    pub fn new() -> Self {
        Self {
            is_focused: false,
            auto_scroll: true,
            scroll_offset: 0,
        }
    }

    pub fn focus(&mut self) {
        self.is_focused = true;
    }

    pub fn unfocus(&mut self) {
        self.is_focused = false;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
        self.auto_scroll = false;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
        self.auto_scroll = false;
    }

    /// Follow new messages again.
    pub fn scroll_to_bottom(&mut self) {
        self.auto_scroll = true;
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
        self.auto_scroll = false;
    }

    fn sender_label(sender: Sender, theme: &Theme) -> (&'static str, Style) {
        match sender {
            Sender::User => ("You", theme.accent()),
            Sender::Bot => ("Bot", theme.success()),
        }
    }

    fn message_lines(message: &ChatMessage, width: usize, theme: &Theme) -> Vec<Line<'static>> {
        let (label, label_style) = Self::sender_label(message.sender, theme);
        let mut lines = vec![Line::from(vec![
            Span::styled(label, label_style),
            Span::raw(" "),
            Span::styled(message.timestamp.format("%H:%M").to_string(), theme.secondary()),
        ])];

        let body_style = if message.body.is_structured() {
            theme.code()
        } else {
            theme.normal()
        };
        for line in wrap_text(message.text(), width) {
            lines.push(Line::from(vec![Span::raw("  "), Span::styled(line, body_style)]));
        }
        lines.push(Line::from(""));
        lines
    }
}

impl Component for ChatView {
    fn render(&mut self, frame: &mut Frame, area: Rect, view: &PanelView<'_>, theme: &Theme) {
        let border_style = if self.is_focused {
            theme.accent()
        } else {
            theme.border()
        };
        let title = match view.stores.active_label() {
            Some(label) => format!(" Chat: {} ", label),
            None => " Chat ".to_string(),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title);

        if view.chat.transcript.is_empty() && !view.chat.is_awaiting() {
            let empty = Paragraph::new("Select a store, then ask a question about its documents.")
                .block(block)
                .alignment(Alignment::Center)
                .style(theme.secondary());
            frame.render_widget(empty, area);
            return;
        }

        let content_width = area.width.saturating_sub(4) as usize;
        let content_height = area.height.saturating_sub(2) as usize;

        let mut all_lines: Vec<Line> = view
            .chat
            .transcript
            .iter()
            .flat_map(|message| Self::message_lines(message, content_width, theme))
            .collect();
        if view.chat.is_awaiting() {
            all_lines.push(Line::from(Span::styled("Bot is thinking...", theme.warning())));
        }

        let total_lines = all_lines.len();
        let max_scroll = total_lines.saturating_sub(content_height);
        if self.auto_scroll || self.scroll_offset >= max_scroll {
            self.scroll_offset = max_scroll;
            self.auto_scroll = true;
        }

        let visible: Vec<Line> = all_lines
            .into_iter()
            .skip(self.scroll_offset)
            .take(content_height)
            .collect();

        frame.render_widget(Paragraph::new(visible).block(block), area);
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        if !self.is_focused {
            return false;
        }

        match event {
            Event::Key(KeyEvent { code, .. }) => match code {
                KeyCode::Up | KeyCode::Char('k') => {
                    self.scroll_up(1);
                    true
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.scroll_down(1);
                    true
                }
                KeyCode::PageUp => {
                    self.scroll_up(10);
                    true
                }
                KeyCode::PageDown => {
                    self.scroll_down(10);
                    true
                }
                KeyCode::Home | KeyCode::Char('g') => {
                    self.scroll_to_top();
                    true
                }
                KeyCode::End | KeyCode::Char('G') => {
                    self.scroll_to_bottom();
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }
}
