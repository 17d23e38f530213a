use ratatui::{
    Frame,
    layout::{Alignment, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::theme::Base16Palette;
use crate::upload::{DROP_HINT, DropZone};

pub fn render_drop_zone(
    f: &mut Frame,
    area: Rect,
    zone: &DropZone,
    focused: bool,
    palette: &Base16Palette,
) {
    let (_, border_color, bg) = palette.get_panel_colors(focused);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(bg));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = Vec::new();
    let top_padding = inner.height.saturating_sub(5) / 2;
    lines.extend((0..top_padding).map(|_| Line::default()));
    lines.push(Line::from(Span::styled(
        DROP_HINT,
        Style::default().fg(palette.base_05),
    )));
    if let Some(status) = zone.status_line() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            status,
            Style::default()
                .fg(palette.base_0b)
                .add_modifier(Modifier::BOLD),
        )));
    }

    let mut prompt_row = None;
    if let Some(prompt) = zone.prompt() {
        lines.push(Line::default());
        prompt_row = Some(lines.len() as u16);
        lines.push(Line::from(vec![
            Span::styled("Path: ", Style::default().fg(palette.base_0d)),
            Span::styled(prompt.input.clone(), Style::default().fg(palette.base_06)),
        ]));
    }

    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false }),
        inner,
    );

    if let (Some(row), Some(prompt)) = (prompt_row, zone.prompt()) {
        let text_width = ("Path: ".width() + prompt.input.width()) as u16;
        let start = inner.x + inner.width.saturating_sub(text_width) / 2;
        let col = (start + text_width).min(inner.x + inner.width.saturating_sub(1));
        if focused && row < inner.height {
            f.set_cursor_position(Position::new(col, inner.y + row));
        }
    }
}
