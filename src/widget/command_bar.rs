use ratatui::{
    Frame,
    layout::{Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use crate::command::CommandBar;
use crate::theme::Base16Palette;

pub const PLACEHOLDER: &str = "What do you want to do?";

/// Draw the command input; places the terminal cursor when focused
pub fn render_command_bar(
    f: &mut Frame,
    area: Rect,
    bar: &CommandBar,
    focused: bool,
    palette: &Base16Palette,
) {
    let (text_color, border_color, bg) = palette.get_panel_colors(focused);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(bg));
    let inner = block.inner(area);

    let line = if bar.input().is_empty() {
        Line::from(Span::styled(
            PLACEHOLDER,
            Style::default()
                .fg(palette.base_03)
                .add_modifier(Modifier::ITALIC),
        ))
    } else {
        Line::from(Span::styled(
            bar.input().to_string(),
            Style::default().fg(text_color),
        ))
    };

    // Keep the cursor visible by scrolling long input horizontally
    let before_cursor: String = bar.input().chars().take(bar.cursor()).collect();
    let cursor_col = before_cursor.width() as u16;
    let scroll = cursor_col.saturating_sub(inner.width.saturating_sub(1));

    f.render_widget(Paragraph::new(line).block(block).scroll((0, scroll)), area);

    if focused && inner.width > 0 && inner.height > 0 {
        f.set_cursor_position(Position::new(inner.x + cursor_col - scroll, inner.y));
    }
}
