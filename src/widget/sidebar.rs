//! Collapsible side panels and the search result navigator

use std::time::{Duration, Instant};

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::backend::SearchResult;
use crate::theme::Base16Palette;

pub const LEFT_MIN_WIDTH: u16 = 16;
pub const LEFT_MAX_WIDTH: u16 = 40;
pub const RIGHT_MIN_WIDTH: u16 = 20;
pub const RIGHT_MAX_WIDTH: u16 = 60;
/// A collapsed right panel still shows its icon column
pub const RIGHT_COLLAPSED_WIDTH: u16 = 3;
const ELLIPSIS_INTERVAL: Duration = Duration::from_millis(500);

pub const BOOKMARK_ICON: &str = "★";
pub const SHARE_ICON: &str = "⇪";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SidebarState {
    pub side: Side,
    pub collapsed: bool,
    width: u16,
    min: u16,
    max: u16,
}

impl SidebarState {
    #[must_use]
    pub fn left(width: u16) -> Self {
        Self {
            side: Side::Left,
            collapsed: true,
            width: width.clamp(LEFT_MIN_WIDTH, LEFT_MAX_WIDTH),
            min: LEFT_MIN_WIDTH,
            max: LEFT_MAX_WIDTH,
        }
    }

    #[must_use]
    pub fn right(width: u16) -> Self {
        Self {
            side: Side::Right,
            collapsed: false,
            width: width.clamp(RIGHT_MIN_WIDTH, RIGHT_MAX_WIDTH),
            min: RIGHT_MIN_WIDTH,
            max: RIGHT_MAX_WIDTH,
        }
    }

    pub fn toggle(&mut self) {
        self.collapsed = !self.collapsed;
    }

    /// Width when expanded
    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Columns the panel occupies right now
    #[must_use]
    pub fn occupied_width(&self) -> u16 {
        match (self.collapsed, self.side) {
            (false, _) => self.width,
            (true, Side::Left) => 0,
            (true, Side::Right) => RIGHT_COLLAPSED_WIDTH,
        }
    }

    /// Apply a horizontal divider drag of `dx` columns.
    ///
    /// Dragging away from the window edge grows the panel. Ignored while
    /// collapsed.
    pub fn drag(&mut self, dx: i32) {
        if self.collapsed {
            return;
        }
        let delta = match self.side {
            Side::Left => dx,
            Side::Right => -dx,
        };
        self.resize_by(delta);
    }

    /// Grow (positive) or shrink the panel, clamped to its range
    pub fn resize_by(&mut self, delta: i32) {
        let next = (i32::from(self.width) + delta).clamp(i32::from(self.min), i32::from(self.max));
        self.width = next as u16;
    }
}

/// Position within the latest search results
#[derive(Clone, Debug, Default)]
pub struct ResultNavigator {
    results: Vec<SearchResult>,
    index: usize,
}

impl ResultNavigator {
    /// Replace the results wholesale; the position returns to the first one
    pub fn replace(&mut self, results: Vec<SearchResult>) {
        self.results = results;
        self.index = 0;
    }

    #[must_use]
    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn current(&self) -> Option<&SearchResult> {
        self.results.get(self.index)
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.index + 1 < self.results.len()
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    /// Move to the next result; `None` at the last one
    pub fn next(&mut self) -> Option<&SearchResult> {
        if !self.has_next() {
            return None;
        }
        self.index += 1;
        self.current()
    }

    /// Move to the previous result; `None` at the first one
    pub fn previous(&mut self) -> Option<&SearchResult> {
        if !self.has_previous() {
            return None;
        }
        self.index -= 1;
        self.current()
    }
}

/// Cycles "", ".", "..", "..." while a request is outstanding
#[derive(Debug)]
pub struct Ellipsis {
    dots: usize,
    last_step: Instant,
}

impl Default for Ellipsis {
    fn default() -> Self {
        Self {
            dots: 0,
            last_step: Instant::now(),
        }
    }
}

impl Ellipsis {
    /// Advance on the 500 ms cadence; returns true when the text changed
    pub fn tick_at(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_step) < ELLIPSIS_INTERVAL {
            return false;
        }
        self.last_step = now;
        self.dots = (self.dots + 1) % 4;
        true
    }

    pub fn reset(&mut self) {
        self.dots = 0;
        self.last_step = Instant::now();
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        ["", ".", "..", "..."][self.dots]
    }
}

/// Everything the right panel shows
pub struct RightPanelView<'a> {
    pub message: &'a str,
    pub searching: bool,
    pub ellipsis: &'a str,
    pub navigator: &'a ResultNavigator,
    pub show_results: bool,
}

/// Screen cells of the clickable controls drawn by [`render_right_sidebar`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RightPanelHits {
    pub bookmark: Option<Rect>,
    pub share: Option<Rect>,
    pub previous: Option<Rect>,
    pub next: Option<Rect>,
}

impl RightPanelHits {
    fn hit(rect: Option<Rect>, col: u16, row: u16) -> bool {
        rect.is_some_and(|r| r.contains(ratatui::layout::Position::new(col, row)))
    }

    #[must_use]
    pub fn is_bookmark(&self, col: u16, row: u16) -> bool {
        Self::hit(self.bookmark, col, row)
    }

    #[must_use]
    pub fn is_share(&self, col: u16, row: u16) -> bool {
        Self::hit(self.share, col, row)
    }

    #[must_use]
    pub fn is_previous(&self, col: u16, row: u16) -> bool {
        Self::hit(self.previous, col, row)
    }

    #[must_use]
    pub fn is_next(&self, col: u16, row: u16) -> bool {
        Self::hit(self.next, col, row)
    }
}

const PREVIOUS_LABEL: &str = "[ Previous ]";
const NEXT_LABEL: &str = "[ Next ]";

fn row_rect(x: u16, y: u16, width: u16) -> Rect {
    Rect {
        x,
        y,
        width,
        height: 1,
    }
}

pub fn render_right_sidebar(
    f: &mut Frame,
    area: Rect,
    state: &SidebarState,
    view: &RightPanelView<'_>,
    palette: &Base16Palette,
) -> RightPanelHits {
    let border_style = Style::default().fg(palette.base_03);
    let icon_style = Style::default().fg(palette.base_0a);

    if state.collapsed {
        let lines = vec![
            Line::from(Span::styled(BOOKMARK_ICON, icon_style)),
            Line::from(Span::styled(SHARE_ICON, icon_style)),
        ];
        let block = Block::default()
            .borders(Borders::LEFT)
            .border_style(border_style);
        f.render_widget(
            Paragraph::new(lines).block(block).alignment(Alignment::Center),
            area,
        );
        return RightPanelHits {
            bookmark: Some(row_rect(area.x, area.y, area.width)),
            share: Some(row_rect(area.x, area.y + 1, area.width)),
            ..RightPanelHits::default()
        };
    }

    let block = Block::default()
        .borders(Borders::LEFT)
        .border_style(border_style)
        .style(Style::default().bg(palette.base_00));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.width < 3 || inner.height < 3 {
        return RightPanelHits::default();
    }

    let mut hits = RightPanelHits::default();
    let right_edge = inner.x + inner.width - 1;
    let icons = Line::from(vec![
        Span::styled(BOOKMARK_ICON, icon_style),
        Span::raw(" "),
        Span::styled(SHARE_ICON, icon_style),
    ])
    .right_aligned();
    f.render_widget(Paragraph::new(icons), row_rect(inner.x, inner.y, inner.width));
    hits.bookmark = Some(row_rect(right_edge - 2, inner.y, 1));
    hits.share = Some(row_rect(right_edge, inner.y, 1));

    let mut row = inner.y + 2;
    let bottom = inner.y + inner.height;

    if view.show_results && row + 3 <= bottom {
        let navigator = view.navigator;
        let mut lines = vec![Line::from(Span::styled(
            format!("Found {} results", navigator.len()),
            Style::default().fg(palette.base_05),
        ))];
        if !navigator.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("Result {} of {}", navigator.index() + 1, navigator.len()),
                Style::default().fg(palette.base_04),
            )));
        }
        let height = lines.len() as u16;
        f.render_widget(Paragraph::new(lines), Rect {
            x: inner.x,
            y: row,
            width: inner.width,
            height,
        });
        row += height;

        let enabled = Style::default()
            .fg(palette.base_0d)
            .add_modifier(Modifier::BOLD);
        let disabled = Style::default().fg(palette.base_03);
        let buttons = Line::from(vec![
            Span::styled(
                PREVIOUS_LABEL,
                if navigator.has_previous() { enabled } else { disabled },
            ),
            Span::raw(" "),
            Span::styled(NEXT_LABEL, if navigator.has_next() { enabled } else { disabled }),
        ]);
        f.render_widget(Paragraph::new(buttons), row_rect(inner.x, row, inner.width));

        let previous_width = PREVIOUS_LABEL.len() as u16;
        hits.previous = Some(row_rect(inner.x, row, previous_width.min(inner.width)));
        let next_x = inner.x + previous_width + 1;
        if next_x < inner.x + inner.width {
            let width = (NEXT_LABEL.len() as u16).min(inner.x + inner.width - next_x);
            hits.next = Some(row_rect(next_x, row, width));
        }
        row += 2;
    }

    if row < bottom {
        let mut message = view.message.to_string();
        if view.searching {
            message.push(' ');
            message.push_str(view.ellipsis);
        }
        let paragraph = Paragraph::new(Line::from(Span::styled(
            message,
            Style::default().fg(palette.base_06),
        )))
        .wrap(Wrap { trim: false });
        f.render_widget(paragraph, Rect {
            x: inner.x,
            y: row,
            width: inner.width,
            height: bottom - row,
        });
    }

    hits
}

pub fn render_left_sidebar(f: &mut Frame, area: Rect, palette: &Base16Palette) -> Rect {
    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(Style::default().fg(palette.base_03))
        .style(Style::default().bg(palette.base_00));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let logo = Paragraph::new(Line::from(Span::styled(
        "RAYO",
        Style::default()
            .fg(palette.base_0d)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    f.render_widget(logo, Rect { height: 1, ..inner });

    // Remaining space hosts the command bar
    Rect {
        y: inner.y.saturating_add(2),
        height: inner.height.saturating_sub(2),
        ..inner
    }
}
