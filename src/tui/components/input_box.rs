use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};
use unicode_width::UnicodeWidthChar;

use crate::tui::{
    components::{Component, PanelView},
    Event, Theme,
};

/// Single-line editor used for the query and the API key dialog.
#[derive(Debug, Clone)]
pub struct InputBox {
    input: Input,
    is_focused: bool,
    placeholder: String,
    masked: bool,
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            input: Input::default(),
            is_focused: false,
            placeholder: "Ask about your documents... (Enter: Send)".to_string(),
            masked: false,
        }
    }

    /// Shows one bullet per character instead of the value.
    pub fn masked(placeholder: &str) -> Self {
        Self {
            placeholder: placeholder.to_string(),
            masked: true,
            ..Self::new()
        }
    }

    pub fn focus(&mut self) {
        self.is_focused = true;
    }

    pub fn unfocus(&mut self) {
        self.is_focused = false;
    }

    pub fn clear(&mut self) {
        self.input.reset();
    }

    pub fn content(&self) -> String {
        self.input.value().to_string()
    }

    #[allow(dead_code)]
    pub fn set_content(&mut self, content: String) {
        self.input = Input::new(content);
    }

    /// Draws the text without a border, scrolled so the cursor stays visible.
    pub fn render_line(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        if self.input.value().is_empty() {
            let placeholder = Line::from(Span::styled(&self.placeholder, theme.secondary()));
            frame.render_widget(Paragraph::new(placeholder).style(theme.normal()), area);
            if self.is_focused {
                frame.set_cursor(area.x, area.y);
            }
            return;
        }

        let available_width = area.width as usize;
        // Bullets are one column each, so a masked cursor is a char index.
        let (shown, cursor_col) = if self.masked {
            (
                "•".repeat(self.input.value().chars().count()),
                self.input.cursor(),
            )
        } else {
            (self.input.value().to_string(), self.input.visual_cursor())
        };
        let (visible, cursor_offset) = visible_window(&shown, cursor_col, available_width);

        frame.render_widget(
            Paragraph::new(Line::from(visible)).style(theme.normal()),
            area,
        );

        if self.is_focused {
            let cursor_x = area.x + cursor_offset as u16;
            if cursor_x < area.x + area.width {
                frame.set_cursor(cursor_x, area.y);
            }
        }
    }
}

/// The slice of `text` that fits in `width` columns with the cursor column in
/// view, and the cursor's column within that slice. Wide characters are never
/// split.
fn visible_window(text: &str, cursor_col: usize, width: usize) -> (String, usize) {
    let scroll_cols = (cursor_col + 1).saturating_sub(width);

    let mut col = 0;
    let mut start_col = None;
    let mut used = 0;
    let mut visible = String::new();
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if start_col.is_none() {
            if col < scroll_cols {
                col += ch_width;
                continue;
            }
            start_col = Some(col);
        }
        if used + ch_width > width {
            break;
        }
        visible.push(ch);
        used += ch_width;
    }

    let start_col = start_col.unwrap_or(col);
    (visible, cursor_col.saturating_sub(start_col))
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect, view: &PanelView<'_>, theme: &Theme) {
        let border_style = if self.is_focused {
            theme.accent()
        } else {
            theme.border()
        };

        let title = if view.chat.is_awaiting() {
            " Message (waiting for reply) "
        } else {
            " Message "
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.render_line(frame, inner, theme);
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        if !self.is_focused {
            return false;
        }

        match event {
            Event::Key(key) => match key.code {
                KeyCode::Enter | KeyCode::Tab | KeyCode::BackTab | KeyCode::Esc => false,
                _ => {
                    // Leave control/alt combinations to the global hotkeys.
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        || key.modifiers.contains(KeyModifiers::ALT)
                    {
                        false
                    } else {
                        self.input.handle_event(&crossterm::event::Event::Key(*key));
                        true
                    }
                }
            },
            _ => false,
        }
    }
}
