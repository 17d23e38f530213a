//! Document view state: page slots, render bookkeeping, overlays and scroll
//!
//! `DocumentView` never talks to the worker itself. It queues
//! [`RenderRequest`]s for the caller to forward and consumes the
//! [`RenderResponse`]s that come back, so it can be driven synchronously.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info, warn};

use super::cache::PageCache;
use super::queue::RenderQueue;
use super::request::{Generation, RenderRequest, RenderResponse};
use super::types::{
    CanvasRect, CoordinateOrigin, DEFAULT_PAGE_ASPECT, DocumentInfo, PageData, PageRegion,
    Viewport,
};
use crate::backend::{BoundingBox, SearchResult};

/// Blank rows between consecutive pages
pub const PAGE_GAP_ROWS: u32 = 1;
/// Fraction of the remaining distance covered per animation tick
const SCROLL_EASING: f32 = 0.35;

/// Position of a page in document order
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PageSlot {
    /// Reserved spot for a page that has not been painted yet
    Placeholder,
    /// The page was painted with this geometry; the raster may have been evicted
    Rendered(Viewport),
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    Empty,
    Loading,
    Ready(DocumentInfo),
    Failed(String),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("Page {page} not found (document has {page_count} pages)")]
    OutOfRange { page: usize, page_count: usize },

    #[error("no document is loaded")]
    NoDocument,
}

/// What a worker response changed, for the owner to react to
#[derive(Debug, PartialEq)]
pub enum ViewEvent {
    Loaded(DocumentInfo),
    LoadFailed(String),
    PageRendered(usize),
    PageFailed { page: usize, reason: String },
    TextExtracted { page: usize, text: String },
}

/// A terminal cell resolved to canvas pixels on a page
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellHit {
    pub page: usize,
    pub canvas: CanvasRect,
}

/// A page intersecting the visible rows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisiblePage {
    pub page: usize,
    /// First row of the page relative to the top of the viewport (may be negative)
    pub top: i64,
    pub rows: u32,
}

#[derive(Debug, Default)]
struct ScrollState {
    offset: f32,
    target: Option<f32>,
}

pub struct DocumentView {
    generation: Generation,
    path: Option<PathBuf>,
    load_state: LoadState,
    scale: f32,
    origin: CoordinateOrigin,

    slots: Vec<PageSlot>,
    cache: PageCache,
    in_progress: HashSet<usize>,
    queue: RenderQueue,
    outbox: VecDeque<RenderRequest>,

    pending_goto: Option<usize>,
    pending_highlights: HashMap<usize, Vec<BoundingBox>>,
    overlays: HashMap<usize, Vec<CanvasRect>>,

    scroll: ScrollState,
    width_cols: u16,
    height_rows: u16,
}

impl DocumentView {
    #[must_use]
    pub fn new(scale: f32, cache_size: usize, origin: CoordinateOrigin) -> Self {
        Self {
            generation: Generation::default(),
            path: None,
            load_state: LoadState::Empty,
            scale,
            origin,
            slots: Vec::new(),
            cache: PageCache::new(cache_size),
            in_progress: HashSet::new(),
            queue: RenderQueue::new(),
            outbox: VecDeque::new(),
            pending_goto: None,
            pending_highlights: HashMap::new(),
            overlays: HashMap::new(),
            scroll: ScrollState::default(),
            width_cols: 0,
            height_rows: 0,
        }
    }

    /// Start showing `path`, discarding everything about the previous document
    pub fn load(&mut self, path: &Path) {
        self.generation = self.generation.next();
        self.path = Some(path.to_path_buf());
        self.load_state = LoadState::Loading;

        self.slots.clear();
        self.cache.invalidate_all();
        self.in_progress.clear();
        self.queue.clear();
        self.outbox.clear();
        self.pending_goto = None;
        self.pending_highlights.clear();
        self.overlays.clear();
        self.scroll = ScrollState::default();

        info!(
            "Loading {} (generation {})",
            path.display(),
            self.generation.0
        );
        self.outbox.push_back(RenderRequest::Load {
            generation: self.generation,
            path: path.to_path_buf(),
        });
    }

    /// Requests ready for the worker.
    ///
    /// At most one page render is outstanding at any time; the next page is
    /// only handed out after the previous one has completed.
    pub fn take_requests(&mut self) -> Vec<RenderRequest> {
        let mut requests: Vec<_> = self.outbox.drain(..).collect();

        if !matches!(self.load_state, LoadState::Ready(_)) || !self.in_progress.is_empty() {
            return requests;
        }

        while let Some(page) = self.queue.pop_next() {
            if self.cache.contains(page) {
                continue;
            }
            self.in_progress.insert(page);
            requests.push(RenderRequest::Page {
                generation: self.generation,
                page,
                scale: self.scale,
            });
            break;
        }

        requests
    }

    /// Apply a worker response; responses for older loads are ignored
    pub fn on_response(&mut self, response: RenderResponse) -> Option<ViewEvent> {
        if response.generation() != self.generation {
            debug!(
                "Discarding response for generation {} (current {})",
                response.generation().0,
                self.generation.0
            );
            return None;
        }

        match response {
            RenderResponse::Loaded { info, .. } => {
                let count = info.page_count;
                self.slots = vec![PageSlot::Placeholder; count];
                self.load_state = LoadState::Ready(info.clone());
                self.resolve_pending_after_load(count);
                self.queue.extend_in_order(0..count);
                Some(ViewEvent::Loaded(info))
            }

            RenderResponse::LoadFailed { error, .. } => {
                error!("Error loading PDF: {error}");
                let reason = error.to_string();
                self.load_state = LoadState::Failed(reason.clone());
                self.pending_goto = None;
                self.pending_highlights.clear();
                Some(ViewEvent::LoadFailed(reason))
            }

            RenderResponse::Page { page, data, .. } => {
                self.in_progress.remove(&page);
                if page >= self.slots.len() {
                    warn!("Worker rendered page {page} outside the document");
                    return None;
                }
                self.place_page(page, data);
                Some(ViewEvent::PageRendered(page))
            }

            RenderResponse::PageFailed { page, error, .. } => {
                self.in_progress.remove(&page);
                error!("Failed to render page {}: {error}", page + 1);
                if let Some(slot) = self.slots.get_mut(page) {
                    *slot = PageSlot::Failed;
                }
                if self.pending_highlights.remove(&page).is_some() {
                    warn!("Skipping highlights on page {}", page + 1);
                }
                if self.pending_goto == Some(page) {
                    self.pending_goto = None;
                }
                Some(ViewEvent::PageFailed {
                    page,
                    reason: error.to_string(),
                })
            }

            RenderResponse::ExtractedText { page, text, .. } => {
                Some(ViewEvent::TextExtracted { page, text })
            }
        }
    }

    fn resolve_pending_after_load(&mut self, count: usize) {
        if let Some(page) = self.pending_goto
            && page >= count
        {
            error!("Page {} not found", page + 1);
            self.pending_goto = None;
        }
        if let Some(page) = self.pending_goto {
            self.queue.prioritize(page);
        }

        let out_of_range: Vec<usize> = self
            .pending_highlights
            .keys()
            .copied()
            .filter(|&page| page >= count)
            .collect();
        for page in out_of_range {
            warn!("Skipping highlights on missing page {}", page + 1);
            self.pending_highlights.remove(&page);
        }
        let mut pages: Vec<usize> = self.pending_highlights.keys().copied().collect();
        pages.sort_unstable();
        for page in pages.into_iter().rev() {
            self.queue.prioritize(page);
        }
    }

    /// Replace the placeholder in place and resolve work waiting on the page
    fn place_page(&mut self, page: usize, data: Arc<PageData>) {
        let viewport = data.viewport;
        self.slots[page] = PageSlot::Rendered(viewport);
        if let Some(evicted) = self.cache.insert(data) {
            debug!("Evicted raster of page {}", evicted + 1);
        }

        if let Some(boxes) = self.pending_highlights.remove(&page) {
            self.paint_boxes(page, &viewport, &boxes);
        }
        if self.pending_goto == Some(page) {
            self.pending_goto = None;
            self.scroll_to_center(page);
        }
    }

    /// Queue `page` ahead of the sequential pass unless it is already
    /// cached, being rendered or queued first
    pub fn ensure_rendered(&mut self, page: usize) {
        if self.cache.contains(page) || self.in_progress.contains(&page) {
            return;
        }
        self.queue.prioritize(page);
    }

    /// Scroll to a 1-based page once it is rendered
    pub fn go_to_page(&mut self, page_number: usize) -> Result<(), NavigationError> {
        let page_count = match &self.load_state {
            LoadState::Ready(info) => info.page_count,
            LoadState::Loading => {
                if page_number == 0 {
                    error!("Page {page_number} not found");
                    return Err(NavigationError::OutOfRange {
                        page: page_number,
                        page_count: 0,
                    });
                }
                self.pending_goto = Some(page_number - 1);
                return Ok(());
            }
            LoadState::Empty | LoadState::Failed(_) => return Err(NavigationError::NoDocument),
        };

        if page_number == 0 || page_number > page_count {
            error!("Page {page_number} not found");
            return Err(NavigationError::OutOfRange {
                page: page_number,
                page_count,
            });
        }

        let page = page_number - 1;
        if self.cache.contains(page) {
            self.pending_goto = None;
            self.scroll_to_center(page);
        } else {
            self.pending_goto = Some(page);
            self.ensure_rendered(page);
        }
        Ok(())
    }

    /// Replace all overlays with boxes for `results`.
    ///
    /// A result on a page that does not exist or fails to render is skipped;
    /// the rest of the batch is still painted.
    pub fn highlight(&mut self, results: &[SearchResult]) {
        self.overlays.clear();
        self.pending_highlights.clear();

        let page_count = match &self.load_state {
            LoadState::Ready(info) => Some(info.page_count),
            LoadState::Loading => None,
            LoadState::Empty | LoadState::Failed(_) => {
                warn!("Ignoring {} highlights without a document", results.len());
                return;
            }
        };

        let mut to_render = Vec::new();
        for result in results {
            if result.page == 0 || page_count.is_some_and(|count| result.page > count) {
                warn!("Skipping highlight on missing page {}", result.page);
                continue;
            }
            let page = result.page - 1;

            match (self.slots.get(page), self.cache.contains(page)) {
                (Some(PageSlot::Rendered(viewport)), true) => {
                    let viewport = *viewport;
                    self.paint_boxes(page, &viewport, &result.boxes);
                }
                _ => {
                    self.pending_highlights
                        .entry(page)
                        .or_default()
                        .extend_from_slice(&result.boxes);
                    if !to_render.contains(&page) {
                        to_render.push(page);
                    }
                }
            }
        }

        if page_count.is_some() {
            for page in to_render.into_iter().rev() {
                self.ensure_rendered(page);
            }
        }
    }

    fn paint_boxes(&mut self, page: usize, viewport: &Viewport, boxes: &[BoundingBox]) {
        let origin = self.origin;
        self.overlays
            .entry(page)
            .or_default()
            .extend(boxes.iter().map(|b| viewport.to_canvas_rect(b, origin)));
    }

    /// Queue text extraction for the canvas rectangle spanned by two cells.
    /// Returns false when the start page has no raster to select from.
    pub fn request_text(&mut self, start: CellHit, end: CellHit) -> bool {
        let Some(PageSlot::Rendered(viewport)) = self.slots.get(start.page).copied() else {
            return false;
        };

        let (ex0, ey0, ex1, ey1) = if end.page == start.page {
            (
                end.canvas.x,
                end.canvas.y,
                end.canvas.x + end.canvas.width,
                end.canvas.y + end.canvas.height,
            )
        } else if end.page > start.page {
            (viewport.width, viewport.height, viewport.width, viewport.height)
        } else {
            (0.0, 0.0, 0.0, 0.0)
        };
        let sx0 = start.canvas.x;
        let sy0 = start.canvas.y;
        let sx1 = start.canvas.x + start.canvas.width;
        let sy1 = start.canvas.y + start.canvas.height;

        let (x0, y0) = viewport.to_page_point(sx0.min(ex0), sy0.min(ey0));
        let (x1, y1) = viewport.to_page_point(sx1.max(ex1), sy1.max(ey1));

        self.outbox.push_back(RenderRequest::ExtractText {
            generation: self.generation,
            page: start.page,
            region: PageRegion { x0, y0, x1, y1 },
        });
        true
    }

    // --- layout and scrolling -------------------------------------------

    /// Update the size of the page area in cells
    pub fn set_viewport(&mut self, width_cols: u16, height_rows: u16) {
        self.width_cols = width_cols;
        self.height_rows = height_rows;
        self.scroll.offset = self.scroll.offset.min(self.max_offset() as f32);
    }

    fn default_aspect(&self) -> f32 {
        self.slots
            .iter()
            .find_map(|slot| match slot {
                PageSlot::Rendered(viewport) => Some(viewport.aspect()),
                _ => None,
            })
            .unwrap_or(DEFAULT_PAGE_ASPECT)
    }

    /// Height of a page in rows; each row shows two pixel rows
    #[must_use]
    pub fn page_rows(&self, page: usize) -> u32 {
        let aspect = match self.slots.get(page) {
            Some(PageSlot::Rendered(viewport)) => viewport.aspect(),
            _ => self.default_aspect(),
        };
        ((f32::from(self.width_cols) * aspect / 2.0).round() as u32).max(1)
    }

    /// First row of a page measured from the top of the document
    #[must_use]
    pub fn page_top(&self, page: usize) -> u32 {
        (0..page.min(self.slots.len()))
            .map(|p| self.page_rows(p) + PAGE_GAP_ROWS)
            .sum()
    }

    #[must_use]
    pub fn total_rows(&self) -> u32 {
        let count = self.slots.len();
        if count == 0 {
            return 0;
        }
        self.page_top(count - 1) + self.page_rows(count - 1)
    }

    fn max_offset(&self) -> u32 {
        self.total_rows().saturating_sub(u32::from(self.height_rows))
    }

    /// Start an animated scroll that centres `page` in the viewport
    pub fn scroll_to_center(&mut self, page: usize) {
        let center = self.page_top(page) as f32 + self.page_rows(page) as f32 / 2.0;
        let target = (center - f32::from(self.height_rows) / 2.0).clamp(0.0, self.max_offset() as f32);
        debug!("Scrolling to page {} (row {target})", page + 1);
        self.scroll.target = Some(target.round());
    }

    /// Immediate scroll by `delta` rows; cancels any animation
    pub fn scroll_by(&mut self, delta: i32) {
        self.scroll.target = None;
        let next = self.scroll.offset + delta as f32;
        self.scroll.offset = next.clamp(0.0, self.max_offset() as f32).round();
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll.target = None;
        self.scroll.offset = 0.0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll.target = None;
        self.scroll.offset = self.max_offset() as f32;
    }

    /// Advance the scroll animation; returns true while still moving
    pub fn tick(&mut self) -> bool {
        let Some(target) = self.scroll.target else {
            return false;
        };
        let remaining = target - self.scroll.offset;
        if remaining.abs() < 0.5 {
            self.scroll.offset = target;
            self.scroll.target = None;
            return false;
        }
        self.scroll.offset += remaining * SCROLL_EASING;
        true
    }

    #[must_use]
    pub fn scroll_offset(&self) -> u32 {
        self.scroll.offset.round() as u32
    }

    #[must_use]
    pub fn scroll_target(&self) -> Option<u32> {
        self.scroll.target.map(|t| t.round() as u32)
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.scroll.target.is_some()
    }

    /// Pages intersecting the viewport, in document order
    #[must_use]
    pub fn visible_pages(&self) -> Vec<VisiblePage> {
        let offset = i64::from(self.scroll_offset());
        let bottom = offset + i64::from(self.height_rows);
        let mut visible = Vec::new();
        let mut top = 0i64;

        for page in 0..self.slots.len() {
            let rows = self.page_rows(page);
            let end = top + i64::from(rows);
            if end > offset && top < bottom {
                visible.push(VisiblePage {
                    page,
                    top: top - offset,
                    rows,
                });
            }
            if top >= bottom {
                break;
            }
            top = end + i64::from(PAGE_GAP_ROWS);
        }
        visible
    }

    /// Mark visible rasters as recently used and re-request the ones that
    /// were evicted from the cache
    pub fn refresh_visible(&mut self) {
        for visible in self.visible_pages() {
            if self.cache.get(visible.page).is_some() {
                continue;
            }
            if matches!(self.slots.get(visible.page), Some(PageSlot::Rendered(_))) {
                self.ensure_rendered(visible.page);
            }
        }
    }

    /// Page shown at the middle row of the viewport (0-based)
    #[must_use]
    pub fn current_page(&self) -> Option<usize> {
        let middle = i64::from(self.height_rows / 2);
        let visible = self.visible_pages();
        visible
            .iter()
            .find(|v| v.top <= middle && v.top + i64::from(v.rows) > middle)
            .or(visible.first())
            .map(|v| v.page)
    }

    /// Resolve a cell of the page area to the canvas pixels it covers
    #[must_use]
    pub fn hit_test(&self, col: u16, row: u16) -> Option<CellHit> {
        if col >= self.width_cols || row >= self.height_rows {
            return None;
        }
        let visible = self.visible_pages();
        let row = i64::from(row);
        let hit = visible
            .iter()
            .find(|v| row >= v.top && row < v.top + i64::from(v.rows))?;
        let PageSlot::Rendered(viewport) = self.slots.get(hit.page)? else {
            return None;
        };

        let col_px = viewport.width / f32::from(self.width_cols);
        let row_px = viewport.height / hit.rows as f32;
        Some(CellHit {
            page: hit.page,
            canvas: CanvasRect {
                x: f32::from(col) * col_px,
                y: (row - hit.top) as f32 * row_px,
                width: col_px,
                height: row_px,
            },
        })
    }

    // --- accessors --------------------------------------------------------

    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    #[must_use]
    pub fn page_count(&self) -> Option<usize> {
        match &self.load_state {
            LoadState::Ready(info) => Some(info.page_count),
            _ => None,
        }
    }

    #[must_use]
    pub fn slots(&self) -> &[PageSlot] {
        &self.slots
    }

    /// Raster of a cached page, marking it as recently used
    pub fn page_data(&mut self, page: usize) -> Option<Arc<PageData>> {
        self.cache.get(page)
    }

    #[must_use]
    pub fn is_cached(&self, page: usize) -> bool {
        self.cache.contains(page)
    }

    #[must_use]
    pub fn is_in_progress(&self, page: usize) -> bool {
        self.in_progress.contains(&page)
    }

    #[must_use]
    pub fn in_progress_count(&self) -> usize {
        self.in_progress.len()
    }

    #[must_use]
    pub fn next_queued(&self) -> Option<usize> {
        self.queue.peek_next()
    }

    #[must_use]
    pub fn overlays(&self, page: usize) -> &[CanvasRect] {
        self.overlays.get(&page).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn overlay_count(&self) -> usize {
        self.overlays.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn has_pending_highlights(&self, page: usize) -> bool {
        self.pending_highlights.contains_key(&page)
    }

    #[must_use]
    pub fn pending_goto(&self) -> Option<usize> {
        self.pending_goto
    }

    #[must_use]
    pub fn rendered_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, PageSlot::Rendered(_)))
            .count()
    }
}
