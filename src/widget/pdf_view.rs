//! Document viewer widget
//!
//! Pages are painted with half-block cells: each terminal cell shows two
//! vertically stacked pixels, the upper one as foreground of `▀` and the
//! lower one as background.

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use log::debug;
use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::backend::SearchResult;
use crate::pdf::{
    CanvasRect, CoordinateOrigin, DocumentView, EngineFactory, Generation, LoadState,
    NavigationError, PageSlot, RenderService, SelectionPoint, TextSelection, ViewEvent,
    VisiblePage,
};
use crate::settings::Settings;
use crate::theme::Base16Palette;

const UPPER_HALF_BLOCK: &str = "▀";
const TOOLTIP_MAX_WIDTH: u16 = 48;
const TOOLTIP_MAX_LINES: usize = 8;

/// What the coordinator may ask of the viewer once a document is shown
pub trait ViewerControl {
    /// Scroll to a 1-based page, rendering it first if needed
    fn go_to_page(&mut self, page_number: usize) -> Result<(), NavigationError>;

    /// Replace the highlighted boxes with `results`
    fn highlight(&mut self, results: &[SearchResult]);
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewerOptions {
    pub scale: f32,
    pub cache_size: usize,
    pub origin: CoordinateOrigin,
    pub highlight_rgb: (u8, u8, u8),
    pub highlight_opacity: f32,
}

impl From<&Settings> for ViewerOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            scale: settings.render_scale,
            cache_size: settings.page_cache_size,
            origin: settings.coordinate_origin,
            highlight_rgb: settings.highlight_rgb(),
            highlight_opacity: settings.highlight_opacity.clamp(0.0, 1.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tooltip {
    pub text: String,
    /// Screen cell the tooltip is anchored to
    pub col: u16,
    pub row: u16,
}

pub struct PdfViewer {
    view: DocumentView,
    service: RenderService,
    options: ViewerOptions,

    selection: TextSelection,
    tooltip: Option<Tooltip>,
    tooltip_anchor: Option<(u16, u16)>,
    text_in_flight: usize,

    /// Downscaled rasters keyed by page, sized for the last drawn width
    thumbs: HashMap<usize, RgbImage>,
    thumbs_generation: Generation,
    page_area: Rect,
}

impl PdfViewer {
    #[must_use]
    pub fn new(options: ViewerOptions, factory: EngineFactory) -> Self {
        Self {
            view: DocumentView::new(options.scale, options.cache_size, options.origin),
            service: RenderService::new(factory),
            options,
            selection: TextSelection::new(),
            tooltip: None,
            tooltip_anchor: None,
            text_in_flight: 0,
            thumbs: HashMap::new(),
            thumbs_generation: Generation::default(),
            page_area: Rect::default(),
        }
    }

    /// Show a new document, dropping everything about the previous one
    pub fn open(&mut self, path: &Path) {
        self.view.load(path);
        self.selection.clear();
        self.tooltip = None;
        self.tooltip_anchor = None;
        self.text_in_flight = 0;
        self.thumbs.clear();
        self.thumbs_generation = self.view.generation();
        self.forward_requests();
    }

    #[must_use]
    pub fn view(&self) -> &DocumentView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut DocumentView {
        &mut self.view
    }

    #[must_use]
    pub fn has_document(&self) -> bool {
        !matches!(self.view.load_state(), LoadState::Empty)
    }

    #[must_use]
    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    #[must_use]
    pub fn selection(&self) -> &TextSelection {
        &self.selection
    }

    #[must_use]
    pub fn page_area(&self) -> Rect {
        self.page_area
    }

    fn forward_requests(&mut self) {
        for request in self.view.take_requests() {
            self.service.send(request);
        }
    }

    fn apply(&mut self, response: crate::pdf::RenderResponse) -> Option<ViewEvent> {
        let event = self.view.on_response(response)?;
        match &event {
            ViewEvent::PageRendered(page) => {
                self.thumbs.remove(page);
            }
            ViewEvent::TextExtracted { text, .. } => {
                self.text_in_flight = self.text_in_flight.saturating_sub(1);
                // Only the reply to the latest selection opens a tooltip
                let anchor = if self.text_in_flight == 0 {
                    self.tooltip_anchor.take()
                } else {
                    None
                };
                let text = text.trim();
                if let Some((col, row)) = anchor
                    && !text.is_empty()
                {
                    self.tooltip = Some(Tooltip {
                        text: text.to_string(),
                        col,
                        row,
                    });
                }
            }
            _ => {}
        }
        Some(event)
    }

    /// Exchange messages with the render worker without blocking
    pub fn pump(&mut self) -> Vec<ViewEvent> {
        self.forward_requests();
        let events: Vec<_> = self
            .service
            .poll_responses()
            .into_iter()
            .filter_map(|response| self.apply(response))
            .collect();
        self.view.refresh_visible();
        self.forward_requests();
        events
    }

    /// Whether the worker still owes a response
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self.view.load_state(), LoadState::Loading)
            || self.view.in_progress_count() > 0
            || self.view.next_queued().is_some()
            || self.text_in_flight > 0
    }

    /// Block until the worker has nothing left to do or `timeout` passes.
    /// Returns the events applied on the way and whether it went idle.
    pub fn wait_idle(&mut self, timeout: Duration) -> (Vec<ViewEvent>, bool) {
        let deadline = Instant::now() + timeout;
        let mut events = self.pump();
        while self.is_busy() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return (events, false);
            }
            match self.service.response_receiver().recv_timeout(remaining) {
                Ok(response) => events.extend(self.apply(response)),
                Err(_) => return (events, false),
            }
            events.extend(self.pump());
        }
        (events, true)
    }

    /// Advance the scroll animation; true while a redraw is needed
    pub fn tick(&mut self) -> bool {
        self.view.tick()
    }

    pub fn scroll_by(&mut self, rows: i32) {
        self.view.scroll_by(rows);
    }

    pub fn page_down(&mut self) {
        let rows = i32::from(self.page_area.height.max(2)) - 1;
        self.view.scroll_by(rows);
    }

    pub fn page_up(&mut self) {
        let rows = i32::from(self.page_area.height.max(2)) - 1;
        self.view.scroll_by(-rows);
    }

    pub fn dismiss_overlays(&mut self) {
        self.tooltip = None;
        self.selection.clear();
    }

    fn point_at(&self, col: u16, row: u16) -> Option<SelectionPoint> {
        let area = self.page_area;
        if !area.contains(Position::new(col, row)) {
            return None;
        }
        let (rel_col, rel_row) = (col - area.x, row - area.y);
        let hit = self.view.hit_test(rel_col, rel_row)?;
        Some(SelectionPoint {
            col: rel_col,
            row: rel_row,
            hit,
        })
    }

    /// Start a selection; returns true when the press landed on a page
    pub fn mouse_down(&mut self, col: u16, row: u16) -> bool {
        self.tooltip = None;
        self.tooltip_anchor = None;
        match self.point_at(col, row) {
            Some(point) => {
                self.selection.start_at(point);
                true
            }
            None => {
                self.selection.clear();
                false
            }
        }
    }

    pub fn mouse_drag(&mut self, col: u16, row: u16) {
        if let Some(point) = self.point_at(col, row) {
            self.selection.update_end(point);
        }
    }

    /// Finish a selection and ask the worker for the text under it
    pub fn mouse_up(&mut self, col: u16, row: u16) {
        if let Some(point) = self.point_at(col, row) {
            self.selection.update_end(point);
        }
        let Some((start, end)) = self.selection.finish() else {
            return;
        };
        if (start.col, start.row) == (end.col, end.row) {
            self.selection.clear();
            return;
        }

        debug!(
            "Selection on page {} from {:?} to {:?}",
            start.hit.page + 1,
            (start.col, start.row),
            (end.col, end.row)
        );
        if !self.view.request_text(start.hit, end.hit) {
            return;
        }
        self.tooltip_anchor = Some((col, row));
        self.text_in_flight += 1;
        self.forward_requests();
    }

    // --- drawing ------------------------------------------------------------

    pub fn render(&mut self, f: &mut Frame, area: Rect, palette: &Base16Palette, focused: bool) {
        if area.height < 2 || area.width == 0 {
            return;
        }
        if self.thumbs_generation != self.view.generation() {
            self.thumbs.clear();
            self.thumbs_generation = self.view.generation();
        }

        let header = Rect { height: 1, ..area };
        self.render_header(f, header, palette, focused);

        self.page_area = Rect {
            y: area.y + 1,
            height: area.height - 1,
            ..area
        };
        self.view
            .set_viewport(self.page_area.width, self.page_area.height);

        let visible = self.view.visible_pages();
        let cached: Vec<usize> = visible
            .iter()
            .filter(|v| self.view.is_cached(v.page))
            .map(|v| v.page)
            .collect();
        self.thumbs.retain(|page, _| self.view.is_cached(*page));

        let page_area = self.page_area;
        for page in visible {
            if cached.contains(&page.page) {
                self.draw_raster(f.buffer_mut(), page_area, page);
            } else {
                self.draw_placeholder(f, page_area, page, palette);
            }
        }

        if let Some(tooltip) = &self.tooltip {
            render_tooltip(f, page_area, tooltip, palette);
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect, palette: &Base16Palette, focused: bool) {
        let (text_color, _, _) = palette.get_panel_colors(focused);
        let left = match self.view.load_state() {
            LoadState::Empty => String::new(),
            LoadState::Loading => "Loading...".to_string(),
            LoadState::Ready(info) => format!("Total pages: {}", info.page_count),
            LoadState::Failed(_) => "Failed to load document".to_string(),
        };
        let position = match (self.view.current_page(), self.view.page_count()) {
            (Some(page), Some(count)) => format!("Page {} / {count}", page + 1),
            _ => String::new(),
        };

        let left_width = left.width() as u16;
        let padding = area
            .width
            .saturating_sub(left_width + position.width() as u16);
        let line = Line::from(vec![
            Span::styled(
                left,
                Style::default().fg(text_color).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" ".repeat(padding as usize)),
            Span::styled(position, Style::default().fg(palette.base_04)),
        ]);
        f.render_widget(Paragraph::new(line), area);
    }

    fn thumbnail(&mut self, page: usize, cols: u16, rows: u32) -> Option<&RgbImage> {
        let (width, height) = (u32::from(cols), rows * 2);
        let stale = self
            .thumbs
            .get(&page)
            .is_none_or(|t| t.width() != width || t.height() != height);
        if stale {
            let data = self.view.page_data(page)?;
            let thumb = imageops::resize(&data.image, width, height, FilterType::Triangle);
            self.thumbs.insert(page, thumb);
        }
        self.thumbs.get(&page)
    }

    fn draw_raster(&mut self, buf: &mut Buffer, area: Rect, page: VisiblePage) {
        let Some(PageSlot::Rendered(viewport)) = self.view.slots().get(page.page).copied() else {
            return;
        };
        let cols = area.width;
        let rows = page.rows;
        let overlays = scale_overlays(
            self.view.overlays(page.page),
            f32::from(cols) / viewport.width,
            (rows * 2) as f32 / viewport.height,
        );
        let highlight = self.options.highlight_rgb;
        let alpha = self.options.highlight_opacity;
        let selection = self.selection.clone();

        let Some(thumb) = self.thumbnail(page.page, cols, rows) else {
            return;
        };

        for r in 0..rows {
            let y = page.top + i64::from(r);
            if y < 0 || y >= i64::from(area.height) {
                continue;
            }
            let y = y as u16;
            for c in 0..cols {
                let upper = shade(thumb, &overlays, highlight, alpha, u32::from(c), r * 2);
                let lower = shade(thumb, &overlays, highlight, alpha, u32::from(c), r * 2 + 1);
                let mut style = Style::default().fg(to_color(upper)).bg(to_color(lower));
                if selection.contains_cell(c, y) {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                if let Some(cell) = buf.cell_mut(Position::new(area.x + c, area.y + y)) {
                    cell.set_symbol(UPPER_HALF_BLOCK).set_style(style);
                }
            }
        }
    }

    fn draw_placeholder(
        &self,
        f: &mut Frame,
        area: Rect,
        page: VisiblePage,
        palette: &Base16Palette,
    ) {
        let top = page.top.max(0);
        let bottom = (page.top + i64::from(page.rows)).min(i64::from(area.height));
        if bottom <= top {
            return;
        }
        let rect = Rect {
            x: area.x,
            y: area.y + top as u16,
            width: area.width,
            height: (bottom - top) as u16,
        };

        let label = match self.view.slots().get(page.page) {
            Some(PageSlot::Failed) => format!("Failed to render page {}", page.page + 1),
            _ => format!("Rendering page {}...", page.page + 1),
        };
        let middle = page.top + i64::from(page.rows / 2);
        let mut lines = Vec::new();
        for row in top..bottom {
            if row == middle {
                lines.push(Line::from(label.clone()).centered());
            } else {
                lines.push(Line::default());
            }
        }
        let paragraph = Paragraph::new(lines)
            .style(Style::default().bg(palette.base_01).fg(palette.base_04));
        f.render_widget(paragraph, rect);
    }
}

impl ViewerControl for PdfViewer {
    fn go_to_page(&mut self, page_number: usize) -> Result<(), NavigationError> {
        let result = self.view.go_to_page(page_number);
        self.forward_requests();
        result
    }

    fn highlight(&mut self, results: &[SearchResult]) {
        self.view.highlight(results);
        self.forward_requests();
    }
}

/// Overlay rectangles in thumbnail pixels: (x0, y0, x1, y1)
fn scale_overlays(rects: &[CanvasRect], sx: f32, sy: f32) -> Vec<(f32, f32, f32, f32)> {
    rects
        .iter()
        .map(|r| (r.x * sx, r.y * sy, (r.x + r.width) * sx, (r.y + r.height) * sy))
        .collect()
}

fn shade(
    thumb: &RgbImage,
    overlays: &[(f32, f32, f32, f32)],
    highlight: (u8, u8, u8),
    alpha: f32,
    x: u32,
    y: u32,
) -> Rgb<u8> {
    let Some(pixel) = thumb.get_pixel_checked(x, y) else {
        return Rgb([255, 255, 255]);
    };
    // Pixel centre decides membership
    let (cx, cy) = (x as f32 + 0.5, y as f32 + 0.5);
    let covered = overlays
        .iter()
        .any(|&(x0, y0, x1, y1)| cx >= x0 && cx < x1.max(x0 + 1.0) && cy >= y0 && cy < y1.max(y0 + 1.0));
    if covered {
        blend(*pixel, highlight, alpha)
    } else {
        *pixel
    }
}

/// Source-over blend of `over` onto `base`
#[must_use]
pub fn blend(base: Rgb<u8>, over: (u8, u8, u8), alpha: f32) -> Rgb<u8> {
    let mix = |b: u8, o: u8| -> u8 {
        (f32::from(b) * (1.0 - alpha) + f32::from(o) * alpha)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Rgb([
        mix(base[0], over.0),
        mix(base[1], over.1),
        mix(base[2], over.2),
    ])
}

fn to_color(pixel: Rgb<u8>) -> Color {
    Color::Rgb(pixel[0], pixel[1], pixel[2])
}

fn render_tooltip(f: &mut Frame, area: Rect, tooltip: &Tooltip, palette: &Base16Palette) {
    let lines: Vec<&str> = tooltip.text.lines().take(TOOLTIP_MAX_LINES).collect();
    let longest = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16;
    let width = (longest + 2).clamp(8, TOOLTIP_MAX_WIDTH).min(area.width);
    let height = (lines.len() as u16 + 2).min(area.height);
    if width < 3 || height < 3 {
        return;
    }

    let max_x = area.x + area.width - width;
    let x = tooltip.col.clamp(area.x, max_x);
    let below = tooltip.row.saturating_add(1);
    let y = if below + height <= area.y + area.height {
        below
    } else {
        tooltip.row.saturating_sub(height).max(area.y)
    };
    let rect = Rect {
        x,
        y,
        width,
        height,
    };

    f.render_widget(Clear, rect);
    let paragraph = Paragraph::new(lines.into_iter().map(Line::from).collect::<Vec<_>>())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.base_0c))
                .style(Style::default().bg(palette.base_01).fg(palette.base_06)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BoundingBox;
    use crate::test_utils::fakes::FakeEngine;
    use crate::test_utils::test_helpers::{capture_terminal_state, create_test_terminal};
    use crate::theme::current_theme;

    const WAIT: Duration = Duration::from_secs(5);

    fn options() -> ViewerOptions {
        ViewerOptions {
            scale: 0.25,
            cache_size: 8,
            origin: CoordinateOrigin::BottomLeft,
            highlight_rgb: (255, 0, 0),
            highlight_opacity: 1.0,
        }
    }

    fn viewer(engine: &FakeEngine) -> PdfViewer {
        PdfViewer::new(options(), engine.factory())
    }

    #[test]
    fn blend_mixes_by_opacity() {
        assert_eq!(blend(Rgb([0, 0, 0]), (255, 255, 255), 0.0), Rgb([0, 0, 0]));
        assert_eq!(blend(Rgb([0, 0, 0]), (255, 255, 255), 1.0), Rgb([255, 255, 255]));
        assert_eq!(blend(Rgb([100, 0, 200]), (200, 100, 0), 0.5), Rgb([150, 50, 100]));
    }

    #[test]
    fn header_shows_page_total_after_load() {
        let engine = FakeEngine::new(3);
        let mut viewer = viewer(&engine);
        let mut terminal = create_test_terminal(40, 20);

        viewer.open(Path::new("doc.pdf"));
        terminal
            .draw(|f| viewer.render(f, f.area(), current_theme(), true))
            .unwrap();
        assert!(capture_terminal_state(&terminal).starts_with("Loading..."));

        let (_, idle) = viewer.wait_idle(WAIT);
        assert!(idle);
        terminal
            .draw(|f| viewer.render(f, f.area(), current_theme(), true))
            .unwrap();
        let screen = capture_terminal_state(&terminal);
        assert!(screen.starts_with("Total pages: 3"));
        assert!(screen.contains(UPPER_HALF_BLOCK));
        assert_eq!(engine.rendered(), vec![0, 1, 2]);
    }

    #[test]
    fn placeholders_are_labelled_until_painted() {
        let engine = FakeEngine::new(2).failing_on(0);
        let mut viewer = viewer(&engine);
        let mut terminal = create_test_terminal(40, 30);

        viewer.open(Path::new("doc.pdf"));
        viewer.wait_idle(WAIT);
        terminal
            .draw(|f| viewer.render(f, f.area(), current_theme(), true))
            .unwrap();
        assert!(capture_terminal_state(&terminal).contains("Failed to render page 1"));
    }

    #[test]
    fn highlighted_cells_take_the_overlay_color() {
        let engine = FakeEngine::new(1);
        let mut viewer = viewer(&engine);
        let mut terminal = create_test_terminal(40, 40);

        viewer.open(Path::new("doc.pdf"));
        viewer.wait_idle(WAIT);
        // Whole page
        viewer.highlight(&[SearchResult {
            page: 1,
            boxes: vec![BoundingBox::new(0.0, 0.0, 612.0, 792.0)],
        }]);
        terminal
            .draw(|f| viewer.render(f, f.area(), current_theme(), true))
            .unwrap();

        let cell = &terminal.backend().buffer()[(5, 5)];
        assert_eq!(cell.symbol(), UPPER_HALF_BLOCK);
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
    }

    #[test]
    fn drag_selection_shows_extracted_text() {
        let engine = FakeEngine::new(1).with_text("Selected words");
        let mut viewer = viewer(&engine);
        let mut terminal = create_test_terminal(40, 40);

        viewer.open(Path::new("doc.pdf"));
        viewer.wait_idle(WAIT);
        terminal
            .draw(|f| viewer.render(f, f.area(), current_theme(), true))
            .unwrap();

        assert!(viewer.mouse_down(2, 3));
        viewer.mouse_drag(10, 5);
        viewer.mouse_up(10, 5);
        viewer.wait_idle(WAIT);

        let tooltip = viewer.tooltip().expect("tooltip after selection");
        assert_eq!(tooltip.text, "Selected words");
        assert_eq!((tooltip.col, tooltip.row), (10, 5));

        // pressing again hides it
        viewer.mouse_down(2, 3);
        assert!(viewer.tooltip().is_none());
    }

    #[test]
    fn pressing_before_the_text_arrives_keeps_the_tooltip_hidden() {
        let engine = FakeEngine::new(1).with_text("Selected words");
        let mut viewer = viewer(&engine);
        let mut terminal = create_test_terminal(40, 40);

        viewer.open(Path::new("doc.pdf"));
        viewer.wait_idle(WAIT);
        terminal
            .draw(|f| viewer.render(f, f.area(), current_theme(), true))
            .unwrap();

        viewer.mouse_down(2, 3);
        viewer.mouse_drag(10, 5);
        viewer.mouse_up(10, 5);
        viewer.mouse_down(20, 20);
        let (_, idle) = viewer.wait_idle(WAIT);

        assert!(idle);
        assert!(viewer.tooltip().is_none());
    }

    #[test]
    fn empty_extraction_shows_no_tooltip() {
        let engine = FakeEngine::new(1);
        let mut viewer = viewer(&engine);
        let mut terminal = create_test_terminal(40, 40);

        viewer.open(Path::new("doc.pdf"));
        viewer.wait_idle(WAIT);
        terminal
            .draw(|f| viewer.render(f, f.area(), current_theme(), true))
            .unwrap();

        viewer.mouse_down(2, 3);
        viewer.mouse_up(12, 8);
        viewer.wait_idle(WAIT);
        assert!(viewer.tooltip().is_none());
    }
}
