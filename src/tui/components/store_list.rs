use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use storechat::stores::format_size;

use crate::tui::{
    components::{Component, PanelView},
    Event, Theme,
};

/// Sidebar listing the stores. Enter activates the highlighted one; the
/// app reads the cursor with [`StoreList::highlighted`].
pub struct StoreList {
    state: ListState,
    len: usize,
    is_focused: bool,
}

impl StoreList {
    pub fn new() -> Self {
        Self {
            state: ListState::default(),
            len: 0,
            is_focused: false,
        }
    }

    pub fn focus(&mut self) {
        self.is_focused = true;
    }

    pub fn unfocus(&mut self) {
        self.is_focused = false;
    }

    /// Keeps the cursor in range after the list changed.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if len == 0 {
            self.state.select(None);
        } else {
            let selected = self.state.selected().unwrap_or(0);
            self.state.select(Some(selected.min(len - 1)));
        }
    }

    pub fn highlight(&mut self, index: usize) {
        if index < self.len {
            self.state.select(Some(index));
        }
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.state.selected().filter(|&i| i < self.len)
    }

    pub fn next(&mut self) {
        if self.len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    fn truncate(label: &str, max_width: usize) -> String {
        if label.width() <= max_width {
            return label.to_string();
        }
        let mut out = String::new();
        for ch in label.chars() {
            if out.width() + 4 > max_width {
                break;
            }
            out.push(ch);
        }
        format!("{}...", out.trim_end())
    }
}

impl Component for StoreList {
    fn render(&mut self, frame: &mut Frame, area: Rect, view: &PanelView<'_>, theme: &Theme) {
        let border_style = if self.is_focused {
            theme.accent()
        } else {
            theme.border()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(format!(" Stores ({}) ", view.stores.len()));

        let max_label = area.width.saturating_sub(6) as usize;
        let active = view.stores.active();

        let items: Vec<ListItem> = view
            .stores
            .stores()
            .iter()
            .map(|store| {
                let is_active = active == Some(store.name.as_str());
                let marker = if is_active { "● " } else { "  " };
                let label_style = if is_active {
                    theme.success()
                } else {
                    theme.normal()
                };

                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(marker, theme.success()),
                        Span::styled(Self::truncate(store.label(), max_label), label_style),
                    ]),
                    Line::from(Span::styled(
                        format!(
                            "  {} docs, {}",
                            store.active_documents_count,
                            format_size(store.size_bytes)
                        ),
                        theme.secondary(),
                    )),
                ])
            })
            .collect();

        if items.is_empty() {
            let text = Paragraph::new("No stores (r to refresh)")
                .block(block)
                .style(theme.secondary());
            frame.render_widget(text, area);
            return;
        }

        let list = List::new(items)
            .block(block)
            .highlight_style(theme.selected())
            .highlight_symbol("> ");

        frame.render_stateful_widget(list, area, &mut self.state);
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        if !self.is_focused {
            return false;
        }

        match event {
            Event::Key(KeyEvent { code, .. }) => match code {
                KeyCode::Up | KeyCode::Char('k') => {
                    self.previous();
                    true
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.next();
                    true
                }
                // Enter, r and c are handled by the app.
                _ => false,
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_wraps_and_clamps() {
        let mut list = StoreList::new();
        list.next();
        assert_eq!(list.highlighted(), None);

        list.set_len(3);
        assert_eq!(list.highlighted(), Some(0));
        list.previous();
        assert_eq!(list.highlighted(), Some(2));
        list.next();
        assert_eq!(list.highlighted(), Some(0));

        list.highlight(2);
        list.set_len(2);
        assert_eq!(list.highlighted(), Some(1));
        list.set_len(0);
        assert_eq!(list.highlighted(), None);
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(StoreList::truncate("short", 10), "short");
        assert_eq!(StoreList::truncate("a very long store name", 10), "a very...");
    }
}
