use crate::theme::Base16Palette;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

pub enum AlertPopupAction {
    Dismiss,
}

/// Modal message that blocks other input until dismissed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertPopup {
    message: String,
}

impl AlertPopup {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn render(&self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let text_width = self.message.chars().count() as u16;
        let desired_width = (text_width + 6).clamp(30, area.width.saturating_sub(4).max(30));
        let inner_width = desired_width.saturating_sub(4).max(1);
        let wrapped_lines = text_width.div_ceil(inner_width).max(1);
        // message, blank, hint, borders
        let height = wrapped_lines + 4;

        let popup_area = centered_rect(desired_width, height, area);
        f.render_widget(Clear, popup_area);

        let lines = vec![
            Line::from(Span::styled(
                self.message.clone(),
                Style::default().fg(palette.base_06),
            )),
            Line::default(),
            Line::from(Span::styled(
                "Press Enter to dismiss",
                Style::default()
                    .fg(palette.base_03)
                    .add_modifier(Modifier::ITALIC),
            ))
            .centered(),
        ];

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(" Alert ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.base_09))
                    .style(Style::default().bg(palette.base_00)),
            )
            .wrap(Wrap { trim: true });

        f.render_widget(paragraph, popup_area);
    }

    pub fn handle_key(&self, key: KeyEvent) -> Option<AlertPopupAction> {
        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => Some(AlertPopupAction::Dismiss),
            _ => None,
        }
    }
}

fn centered_rect(width: u16, height: u16, r: Rect) -> Rect {
    let height = height.min(r.height);
    let width = width.min(r.width);
    let v_margin = r.height.saturating_sub(height) / 2;
    let h_margin = r.width.saturating_sub(width) / 2;

    let row = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(v_margin),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r)[1];

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(h_margin),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(row)[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::current_theme;
    use crate::test_utils::test_helpers::{capture_terminal_state, create_test_terminal};
    use crossterm::event::KeyModifiers;

    #[test]
    fn alert_is_drawn_centered_with_message() {
        let mut terminal = create_test_terminal(80, 20);
        let alert = AlertPopup::new("Please upload a valid PDF file.");
        terminal
            .draw(|f| alert.render(f, f.area(), current_theme()))
            .unwrap();

        let screen = capture_terminal_state(&terminal);
        assert!(screen.contains("Please upload a valid PDF file."));
        assert!(screen.contains("Press Enter to dismiss"));
    }

    #[test]
    fn enter_and_escape_dismiss() {
        let alert = AlertPopup::new("x");
        for code in [KeyCode::Enter, KeyCode::Esc] {
            assert!(matches!(
                alert.handle_key(KeyEvent::new(code, KeyModifiers::empty())),
                Some(AlertPopupAction::Dismiss)
            ));
        }
        assert!(
            alert
                .handle_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::empty()))
                .is_none()
        );
    }
}
