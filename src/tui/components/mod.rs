pub mod api_key_dialog;
pub mod chat_view;
pub mod citations;
pub mod help_popup;
pub mod input_box;
pub mod notice;
pub mod status_bar;
pub mod store_list;
pub mod usage;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use storechat::chat::ChatPanelView;
use storechat::stores::StoreSelector;

use crate::tui::{Event, Theme};

pub use api_key_dialog::ApiKeyDialog;
pub use chat_view::ChatView;
pub use citations::CitationsPanel;
pub use help_popup::HelpPopup;
pub use input_box::InputBox;
pub use notice::Notice;
pub use status_bar::{ConnectionStatus, StatusBar};
pub use store_list::StoreList;
pub use usage::UsagePanel;

/// Everything a frame shows, borrowed from the app for one render pass.
pub struct PanelView<'a> {
    pub chat: ChatPanelView<'a>,
    pub stores: &'a StoreSelector,
    pub status: &'a str,
    pub connection: &'a ConnectionStatus,
    pub backend_url: &'a str,
}

/// Base trait for all TUI components
pub trait Component {
    /// Draws from the shared view; `&mut self` is for widget-local state
    /// such as scroll offsets.
    fn render(&mut self, frame: &mut Frame, area: Rect, view: &PanelView<'_>, theme: &Theme);

    /// Returns true when the event was consumed.
    fn handle_event(&mut self, event: &Event) -> bool;
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Word wrap measured in terminal columns. Lines that already fit keep their
/// leading whitespace, so indented JSON survives.
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    use unicode_width::UnicodeWidthStr;

    if width < 10 {
        return text.lines().map(str::to_string).collect();
    }

    let mut lines = Vec::new();
    for line in text.lines() {
        if line.width() <= width {
            lines.push(line.to_string());
            continue;
        }

        let mut current = String::new();
        for word in line.split_whitespace() {
            let needed = if current.is_empty() {
                word.width()
            } else {
                current.width() + 1 + word.width()
            };
            if needed <= width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
            } else {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current = word.to_string();
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
pub(crate) mod testing {
    use ratatui::buffer::Buffer;

    /// Buffer contents row by row, for substring assertions.
    pub fn buffer_text(buffer: &Buffer) -> String {
        let area = buffer.area;
        let mut out = String::new();
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                out.push_str(buffer.get(x, y).symbol());
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text() {
        let wrapped = wrap_text("the quick brown fox jumps over the lazy dog", 12);
        assert_eq!(wrapped, vec!["the quick", "brown fox", "jumps over", "the lazy dog"]);

        let json = "{\n  \"a\": 1\n}";
        assert_eq!(wrap_text(json, 40), vec!["{", "  \"a\": 1", "}"]);

        assert_eq!(wrap_text("", 40), vec![String::new()]);
    }
}
