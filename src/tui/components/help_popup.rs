use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem},
    Frame,
};

use crate::tui::{
    components::{centered_rect, Component, PanelView},
    Event, Theme,
};

pub struct HelpPopup {
    is_visible: bool,
}

impl HelpPopup {
    pub fn new() -> Self {
        Self { is_visible: false }
    }

    pub fn hide(&mut self) {
        self.is_visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    pub fn toggle(&mut self) {
        self.is_visible = !self.is_visible;
    }

    fn help_content() -> &'static [(&'static str, &'static str)] {
        &[
            ("Navigation", ""),
            ("  Tab / Shift+Tab", "Switch between panels"),
            ("  Alt+1..4", "Stores / Chat / Citations / Input"),
            ("  Escape", "Return to Stores"),
            ("  Arrow keys / jk", "Move in lists and scroll"),
            ("  Page Up/Down", "Scroll messages quickly"),
            ("  Home/End (g/G)", "Top/bottom of the transcript"),
            ("", ""),
            ("Stores", ""),
            ("  Enter", "Use the highlighted store"),
            ("  c", "Clear the selection"),
            ("  r / Ctrl+R", "Refresh the store list"),
            ("", ""),
            ("Chat", ""),
            ("  Enter", "Send message"),
            ("  Enter (citations)", "Show/hide references"),
            ("", ""),
            ("General", ""),
            ("  Ctrl+K", "Configure the Gemini API key"),
            ("  F1 / Ctrl+H", "Show/hide this help"),
            ("  Ctrl+C / Ctrl+Q", "Quit application"),
        ]
    }
}

impl Component for HelpPopup {
    fn render(&mut self, frame: &mut Frame, area: Rect, _view: &PanelView<'_>, theme: &Theme) {
        if !self.is_visible {
            return;
        }

        let popup_area = centered_rect(60, 70, area);
        frame.render_widget(Clear, popup_area);

        let items: Vec<ListItem> = Self::help_content()
            .iter()
            .map(|(key, description)| {
                if key.is_empty() {
                    ListItem::new(Line::from(""))
                } else if description.is_empty() {
                    ListItem::new(Line::from(Span::styled(
                        *key,
                        theme.accent().add_modifier(Modifier::BOLD),
                    )))
                } else {
                    ListItem::new(Line::from(vec![
                        Span::styled(*key, theme.highlight()),
                        Span::raw(": "),
                        Span::styled(*description, theme.normal()),
                    ]))
                }
            })
            .collect();

        let help_list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.accent())
                    .title(" Help - Press F1 or Esc to close "),
            )
            .style(theme.normal());

        frame.render_widget(help_list, popup_area);
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        if !self.is_visible {
            return false;
        }

        match event {
            Event::Key(key) => {
                match (key.code, key.modifiers) {
                    (KeyCode::Esc, _) | (KeyCode::F(1), _) | (KeyCode::Char('q'), _) => {
                        self.hide();
                    }
                    (KeyCode::Char('h'), KeyModifiers::CONTROL) => {
                        self.hide();
                    }
                    _ => {}
                }
                // Modal while open.
                true
            }
            _ => false,
        }
    }
}
