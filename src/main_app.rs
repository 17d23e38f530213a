use crate::backend::{
    Backend, BackendResponse, BackendService, DocumentRef, HttpBackend, RequestSeq, SearchResult,
};
use crate::command::{CommandBar, CommandKind, Interpretation, SubmitOutcome};
use crate::event_source::EventSource;
use crate::notification::NotificationManager;
use crate::pdf::{EngineFactory, NavigationError, ViewEvent, mupdf_engine_factory};
use crate::settings::Settings;
use crate::theme::current_theme;
use crate::upload::{DropZone, PendingUpload};
use crate::widget::alert_popup::{AlertPopup, AlertPopupAction};
use crate::widget::command_bar::render_command_bar;
use crate::widget::drop_zone::render_drop_zone;
use crate::widget::hud_message::render_hud;
use crate::widget::pdf_view::{PdfViewer, ViewerControl, ViewerOptions};
use crate::widget::sidebar::{
    Ellipsis, ResultNavigator, RightPanelHits, RightPanelView, SidebarState, render_left_sidebar,
    render_right_sidebar,
};

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use log::{debug, error, info, warn};
use ratatui::{
    Frame, Terminal,
    layout::{Position, Rect},
    style::Style,
    widgets::Block,
};

pub const NO_DOCUMENT_MESSAGE: &str = "No document loaded. Upload a PDF before searching.";
pub const BOOKMARK_NOTICE: &str = "Bookmark added!";
pub const SHARE_NOTICE: &str = "Share link copied!";

const TICK_RATE: Duration = Duration::from_millis(50);
const COMMAND_BAR_HEIGHT: u16 = 3;
const WHEEL_STEP: i32 = 3;
const KEY_STEP: i32 = 2;
const RESIZE_STEP: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum FocusedPanel {
    CommandBar,
    /// Drop zone while no document is open, the viewer afterwards
    Content,
}

/// Screen regions from the last draw; mouse handling hit-tests against them
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AppLayout {
    pub left: Option<Rect>,
    pub right: Option<Rect>,
    pub command_bar: Rect,
    pub content: Rect,
}

impl AppLayout {
    #[must_use]
    pub fn compute(area: Rect, left: &SidebarState, right: &SidebarState) -> Self {
        let left_width = left.occupied_width().min(area.width);
        let right_width = right
            .occupied_width()
            .min(area.width.saturating_sub(left_width));
        let main = Rect {
            x: area.x + left_width,
            width: area.width - left_width - right_width,
            ..area
        };

        let left_rect = (left_width > 0).then_some(Rect {
            width: left_width,
            ..area
        });
        let right_rect = (right_width > 0).then_some(Rect {
            x: area.x + area.width - right_width,
            width: right_width,
            ..area
        });

        let (command_bar, content) = match left_rect {
            // Under the logo, inside the panel border
            Some(panel) => (
                Rect {
                    x: panel.x,
                    y: panel.y.saturating_add(2),
                    width: panel.width.saturating_sub(1),
                    height: COMMAND_BAR_HEIGHT.min(panel.height.saturating_sub(2)),
                },
                main,
            ),
            None => {
                let bar_height = COMMAND_BAR_HEIGHT.min(main.height);
                (
                    Rect {
                        height: bar_height,
                        ..main
                    },
                    Rect {
                        y: main.y + bar_height,
                        height: main.height - bar_height,
                        ..main
                    },
                )
            }
        };

        Self {
            left: left_rect,
            right: right_rect,
            command_bar,
            content,
        }
    }

    /// Column of the divider next to the left panel
    #[must_use]
    pub fn left_divider(&self) -> Option<u16> {
        self.left.map(|r| r.x + r.width - 1)
    }

    #[must_use]
    pub fn right_divider(&self) -> Option<u16> {
        self.right.map(|r| r.x)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DividerDrag {
    Left { last_col: u16 },
    Right { last_col: u16 },
}

#[derive(Debug)]
struct InFlightSearch {
    seq: RequestSeq,
    term: String,
    remote_path: String,
}

#[derive(Debug)]
struct InFlightUpload {
    seq: RequestSeq,
    upload: PendingUpload,
}

pub struct App {
    pub focused_panel: FocusedPanel,
    pub command_bar: CommandBar,
    pub drop_zone: DropZone,
    pub viewer: PdfViewer,
    pub notifications: NotificationManager,
    pub left_sidebar: SidebarState,
    pub right_sidebar: SidebarState,

    backend: BackendService,
    document: Option<DocumentRef>,
    alert: Option<AlertPopup>,

    interaction_message: String,
    ellipsis: Ellipsis,
    navigator: ResultNavigator,
    /// A search has completed for the open document
    searched: bool,
    search: Option<InFlightSearch>,
    upload: Option<InFlightUpload>,

    layout: AppLayout,
    right_hits: RightPanelHits,
    divider_drag: Option<DividerDrag>,
}

impl App {
    /// App wired to the HTTP backend and the MuPDF renderer
    pub fn new(settings: Settings) -> Result<Self> {
        let backend = HttpBackend::new(&settings.backend_url, settings.request_timeout_secs)?;
        info!("Using backend at {}", backend.base_url());
        Ok(Self::with_services(
            settings,
            Arc::new(backend),
            mupdf_engine_factory(),
        ))
    }

    #[must_use]
    pub fn with_services(
        settings: Settings,
        backend: Arc<dyn Backend>,
        engine_factory: EngineFactory,
    ) -> Self {
        Self {
            focused_panel: FocusedPanel::CommandBar,
            command_bar: CommandBar::new(Duration::from_millis(settings.command_cooldown_ms)),
            drop_zone: DropZone::new(),
            viewer: PdfViewer::new(ViewerOptions::from(&settings), engine_factory),
            notifications: NotificationManager::new(),
            left_sidebar: SidebarState::left(settings.left_sidebar_width),
            right_sidebar: SidebarState::right(settings.right_sidebar_width),
            backend: BackendService::new(backend),
            document: None,
            alert: None,
            interaction_message: String::new(),
            ellipsis: Ellipsis::default(),
            navigator: ResultNavigator::default(),
            searched: false,
            search: None,
            upload: None,
            layout: AppLayout::default(),
            right_hits: RightPanelHits::default(),
            divider_drag: None,
        }
    }

    // --- state accessors ----------------------------------------------------

    #[must_use]
    pub fn document(&self) -> Option<&DocumentRef> {
        self.document.as_ref()
    }

    #[must_use]
    pub fn alert_message(&self) -> Option<&str> {
        self.alert.as_ref().map(AlertPopup::message)
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    #[must_use]
    pub fn interaction_message(&self) -> &str {
        &self.interaction_message
    }

    #[must_use]
    pub fn results(&self) -> &ResultNavigator {
        &self.navigator
    }

    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    #[must_use]
    pub fn layout(&self) -> AppLayout {
        self.layout
    }

    #[must_use]
    pub fn right_panel_hits(&self) -> RightPanelHits {
        self.right_hits
    }

    /// Whether any background work is outstanding
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.search.is_some() || self.upload.is_some() || self.viewer.is_busy()
    }

    fn show_alert(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("Alert: {message}");
        self.alert = Some(AlertPopup::new(message));
    }

    fn has_document(&self) -> bool {
        self.viewer.has_document()
    }

    // --- commands -----------------------------------------------------------

    pub fn submit_command(&mut self) {
        let interpretation = match self.command_bar.submit() {
            SubmitOutcome::Ignored => return,
            SubmitOutcome::Interpreted(interpretation) => interpretation,
        };

        match interpretation {
            Interpretation::Command(command) => {
                self.interaction_message = command.message;
                match command.kind {
                    CommandKind::GoToPage(page) => self.go_to_page(page),
                    CommandKind::Search(term) => self.dispatch_search(term),
                }
            }
            Interpretation::Url(_) => {
                if let Some(notice) = interpretation.notice() {
                    self.notifications.info(notice);
                }
            }
            Interpretation::Invalid => {
                if let Some(notice) = interpretation.notice() {
                    self.show_alert(notice);
                }
            }
        }
    }

    fn go_to_page(&mut self, page: usize) {
        match self.viewer.go_to_page(page) {
            Ok(()) => debug!("Navigating to page {page}"),
            Err(NavigationError::NoDocument) => warn!("Cannot go to page {page}: no document"),
            Err(e) => error!("{e}"),
        }
    }

    pub fn dispatch_search(&mut self, term: String) {
        let Some(document) = &self.document else {
            self.interaction_message = NO_DOCUMENT_MESSAGE.to_string();
            return;
        };

        let remote_path = document.remote_path.clone();
        info!("Searching {remote_path} for {term:?}");
        let seq = self.backend.search(remote_path.clone(), term.clone());
        if let Some(previous) = self.search.replace(InFlightSearch {
            seq,
            term,
            remote_path,
        }) {
            debug!("Search {:?} superseded by {seq:?}", previous.seq);
        }
        self.ellipsis.reset();
    }

    /// Accept a file from any upload source and send it to the backend
    pub fn request_upload(&mut self, path: &Path) {
        match self.drop_zone.accept(path) {
            Ok(pending) => self.start_upload(pending),
            Err(alert) => self.show_alert(alert),
        }
    }

    fn handle_drop(&mut self, text: &str) {
        match self.drop_zone.accept_paste(text) {
            Ok(pending) => self.start_upload(pending),
            Err(alert) => self.show_alert(alert),
        }
    }

    fn start_upload(&mut self, pending: PendingUpload) {
        let seq = self
            .backend
            .upload(pending.path.clone(), pending.file_name.clone());
        if let Some(previous) = self.upload.replace(InFlightUpload {
            seq,
            upload: pending,
        }) {
            debug!("Upload {:?} superseded by {seq:?}", previous.seq);
        }
    }

    fn select_result(&mut self, result: Option<SearchResult>) {
        if let Some(result) = result {
            self.go_to_page(result.page);
        }
    }

    pub fn next_result(&mut self) {
        let result = self.navigator.next().cloned();
        self.select_result(result);
    }

    pub fn previous_result(&mut self) {
        let result = self.navigator.previous().cloned();
        self.select_result(result);
    }

    pub fn add_bookmark(&mut self) {
        self.notifications.info(BOOKMARK_NOTICE);
    }

    pub fn share(&mut self) {
        self.notifications.info(SHARE_NOTICE);
    }

    // --- background completions --------------------------------------------

    fn apply_backend_response(&mut self, response: BackendResponse) {
        match response {
            BackendResponse::Uploaded { seq, result } => {
                let Some(in_flight) = self.upload.take_if(|u| u.seq == seq) else {
                    debug!("Discarding stale upload response {seq:?}");
                    return;
                };
                match result {
                    Ok(remote_path) => {
                        info!("Uploaded {} as {remote_path}", in_flight.upload.file_name);
                        self.open_document(DocumentRef {
                            remote_path,
                            local_path: in_flight.upload.path,
                            file_name: in_flight.upload.file_name,
                        });
                    }
                    Err(e) => {
                        error!("Upload failed: {e}");
                        self.show_alert(e.upload_message());
                    }
                }
            }
            BackendResponse::Searched { seq, result } => {
                let Some(in_flight) = self.search.take_if(|s| s.seq == seq) else {
                    debug!("Discarding stale search response {seq:?}");
                    return;
                };
                if self.document.as_ref().map(|d| d.remote_path.as_str())
                    != Some(in_flight.remote_path.as_str())
                {
                    debug!("Discarding search results for a replaced document");
                    return;
                }
                match result {
                    Ok(results) => {
                        info!("Search for {:?} found {} results", in_flight.term, results.len());
                        self.interaction_message =
                            format!("Found {} results for \"{}\"", results.len(), in_flight.term);
                        self.viewer.highlight(&results);
                        self.navigator.replace(results);
                        self.searched = true;
                    }
                    Err(e) => {
                        error!("Search failed: {e}");
                        self.interaction_message = e.search_message();
                    }
                }
            }
        }
    }

    fn open_document(&mut self, document: DocumentRef) {
        self.viewer.open(&document.local_path);
        self.navigator.replace(Vec::new());
        self.searched = false;
        self.search = None;
        self.document = Some(document);
        self.focused_panel = FocusedPanel::Content;
    }

    fn apply_view_event(&mut self, event: &ViewEvent) {
        match event {
            ViewEvent::Loaded(info) => info!("Document loaded with {} pages", info.page_count),
            ViewEvent::LoadFailed(reason) => {
                self.notifications.error(format!("Failed to load document: {reason}"));
            }
            ViewEvent::PageFailed { page, reason } => {
                debug!("Page {} failed: {reason}", page + 1);
            }
            ViewEvent::PageRendered(_) | ViewEvent::TextExtracted { .. } => {}
        }
    }

    /// Periodic work: drain background responses and advance animations.
    /// Returns true when something visible changed.
    pub fn tick(&mut self) -> bool {
        let mut changed = false;

        for response in self.backend.poll_responses() {
            self.apply_backend_response(response);
            changed = true;
        }

        let events = self.viewer.pump();
        for event in &events {
            self.apply_view_event(event);
        }
        changed |= !events.is_empty();
        changed |= self.viewer.tick();
        changed |= self.notifications.update();
        if self.search.is_some() {
            changed |= self.ellipsis.tick_at(Instant::now());
        }
        changed
    }

    /// Tick until background work is done or `timeout` passes
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.tick();
            if !self.is_busy() {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            if self.search.is_some() || self.upload.is_some() {
                if let Ok(response) = self
                    .backend
                    .response_receiver()
                    .recv_timeout(remaining.min(Duration::from_millis(10)))
                {
                    self.apply_backend_response(response);
                }
            } else {
                let (events, _) = self.viewer.wait_idle(remaining);
                for event in &events {
                    self.apply_view_event(event);
                }
            }
        }
    }

    // --- input --------------------------------------------------------------

    pub fn handle_event(&mut self, event: &Event) -> Option<AppAction> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key_event(*key),
            Event::Paste(text) => {
                self.handle_paste(text);
                None
            }
            Event::Mouse(mouse) => {
                self.handle_mouse_event(*mouse);
                None
            }
            _ => None,
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<AppAction> {
        if let Some(alert) = &self.alert {
            if let Some(AlertPopupAction::Dismiss) = alert.handle_key(key) {
                self.alert = None;
            }
            return None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => return Some(AppAction::Quit),
                KeyCode::Char('l') => {
                    self.left_sidebar.toggle();
                    return None;
                }
                KeyCode::Char('r') => {
                    self.right_sidebar.toggle();
                    return None;
                }
                _ => {}
            }
        }

        if key.code == KeyCode::Tab && !self.drop_zone.is_prompting() {
            self.focused_panel = match self.focused_panel {
                FocusedPanel::CommandBar => FocusedPanel::Content,
                FocusedPanel::Content => FocusedPanel::CommandBar,
            };
            return None;
        }

        match self.focused_panel {
            FocusedPanel::CommandBar => {
                self.handle_command_bar_key(key);
                None
            }
            FocusedPanel::Content if self.has_document() => self.handle_viewer_key(key),
            FocusedPanel::Content => {
                self.handle_drop_zone_key(key);
                None
            }
        }
    }

    fn handle_command_bar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit_command(),
            KeyCode::Esc => self.focused_panel = FocusedPanel::Content,
            KeyCode::Backspace => self.command_bar.backspace(),
            KeyCode::Delete => self.command_bar.delete(),
            KeyCode::Left => self.command_bar.move_left(),
            KeyCode::Right => self.command_bar.move_right(),
            KeyCode::Home => self.command_bar.move_home(),
            KeyCode::End => self.command_bar.move_end(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.command_bar.insert_char(c);
            }
            _ => {}
        }
    }

    fn handle_drop_zone_key(&mut self, key: KeyEvent) {
        if !self.drop_zone.is_prompting() {
            if key.code == KeyCode::Enter {
                self.drop_zone.open_prompt();
            }
            return;
        }

        match key.code {
            KeyCode::Enter => match self.drop_zone.submit_prompt() {
                Some(Ok(pending)) => self.start_upload(pending),
                Some(Err(alert)) => self.show_alert(alert),
                None => {}
            },
            KeyCode::Esc => self.drop_zone.cancel_prompt(),
            KeyCode::Backspace => self.drop_zone.prompt_backspace(),
            KeyCode::Char(c) => self.drop_zone.prompt_insert(c.encode_utf8(&mut [0; 4])),
            _ => {}
        }
    }

    fn handle_viewer_key(&mut self, key: KeyEvent) -> Option<AppAction> {
        match key.code {
            KeyCode::Char('q') => return Some(AppAction::Quit),
            KeyCode::Char('j') | KeyCode::Down => self.viewer.scroll_by(KEY_STEP),
            KeyCode::Char('k') | KeyCode::Up => self.viewer.scroll_by(-KEY_STEP),
            KeyCode::PageDown | KeyCode::Char(' ') => self.viewer.page_down(),
            KeyCode::PageUp => self.viewer.page_up(),
            KeyCode::Char('g') | KeyCode::Home => self.viewer.view_mut().scroll_to_top(),
            KeyCode::Char('G') | KeyCode::End => self.viewer.view_mut().scroll_to_bottom(),
            KeyCode::Char('n') => self.next_result(),
            KeyCode::Char('p') => self.previous_result(),
            KeyCode::Char('b') => self.add_bookmark(),
            KeyCode::Char('s') => self.share(),
            KeyCode::Char('{') => self.left_sidebar.resize_by(-RESIZE_STEP),
            KeyCode::Char('}') => self.left_sidebar.resize_by(RESIZE_STEP),
            KeyCode::Char('<') => self.right_sidebar.resize_by(RESIZE_STEP),
            KeyCode::Char('>') => self.right_sidebar.resize_by(-RESIZE_STEP),
            KeyCode::Char('/') => self.focused_panel = FocusedPanel::CommandBar,
            KeyCode::Esc => self.viewer.dismiss_overlays(),
            _ => {}
        }
        None
    }

    fn handle_paste(&mut self, text: &str) {
        if self.alert.is_some() {
            return;
        }
        if self.focused_panel == FocusedPanel::CommandBar {
            self.command_bar.insert_str(text);
        } else if self.drop_zone.is_prompting() {
            self.drop_zone.prompt_insert(text.trim());
        } else {
            self.handle_drop(text);
        }
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        if self.alert.is_some() {
            return;
        }
        let (col, row) = (mouse.column, mouse.row);
        let in_content = self.layout.content.contains(Position::new(col, row));

        match mouse.kind {
            MouseEventKind::ScrollDown if in_content => self.viewer.scroll_by(WHEEL_STEP),
            MouseEventKind::ScrollUp if in_content => self.viewer.scroll_by(-WHEEL_STEP),
            MouseEventKind::Down(MouseButton::Left) => self.handle_click(col, row, in_content),
            MouseEventKind::Drag(MouseButton::Left) => match self.divider_drag {
                Some(DividerDrag::Left { last_col }) => {
                    self.left_sidebar.drag(i32::from(col) - i32::from(last_col));
                    self.divider_drag = Some(DividerDrag::Left { last_col: col });
                }
                Some(DividerDrag::Right { last_col }) => {
                    self.right_sidebar.drag(i32::from(col) - i32::from(last_col));
                    self.divider_drag = Some(DividerDrag::Right { last_col: col });
                }
                None => self.viewer.mouse_drag(col, row),
            },
            MouseEventKind::Up(MouseButton::Left) => {
                if self.divider_drag.take().is_none() {
                    self.viewer.mouse_up(col, row);
                }
            }
            _ => {}
        }
    }

    fn handle_click(&mut self, col: u16, row: u16, in_content: bool) {
        if self.layout.left_divider() == Some(col) {
            self.divider_drag = Some(DividerDrag::Left { last_col: col });
            return;
        }
        if self.right_hits.is_bookmark(col, row) {
            self.add_bookmark();
            return;
        }
        if self.right_hits.is_share(col, row) {
            self.share();
            return;
        }
        if self.right_hits.is_previous(col, row) {
            self.previous_result();
            return;
        }
        if self.right_hits.is_next(col, row) {
            self.next_result();
            return;
        }
        if self.layout.right_divider() == Some(col) && !self.right_sidebar.collapsed {
            self.divider_drag = Some(DividerDrag::Right { last_col: col });
            return;
        }

        if self.layout.command_bar.contains(Position::new(col, row)) {
            self.focused_panel = FocusedPanel::CommandBar;
        } else if in_content {
            self.focused_panel = FocusedPanel::Content;
            if self.has_document() {
                self.viewer.mouse_down(col, row);
            } else if !self.drop_zone.is_prompting() {
                self.drop_zone.open_prompt();
            }
        }
    }

    // --- drawing ------------------------------------------------------------

    pub fn draw(&mut self, f: &mut Frame) {
        let palette = current_theme();
        let area = f.area();
        f.render_widget(Block::default().style(Style::default().bg(palette.base_00)), area);

        self.layout = AppLayout::compute(area, &self.left_sidebar, &self.right_sidebar);
        let layout = self.layout;

        if let Some(left) = layout.left {
            render_left_sidebar(f, left, palette);
        }
        render_command_bar(
            f,
            layout.command_bar,
            &self.command_bar,
            self.focused_panel == FocusedPanel::CommandBar && self.alert.is_none(),
            palette,
        );

        let content_focused = self.focused_panel == FocusedPanel::Content;
        if self.has_document() {
            self.viewer.render(f, layout.content, palette, content_focused);
        } else {
            render_drop_zone(f, layout.content, &self.drop_zone, content_focused, palette);
        }

        self.right_hits = match layout.right {
            Some(right) => {
                let view = RightPanelView {
                    message: &self.interaction_message,
                    searching: self.search.is_some(),
                    ellipsis: self.ellipsis.as_str(),
                    navigator: &self.navigator,
                    show_results: self.searched,
                };
                render_right_sidebar(f, right, &self.right_sidebar, &view, palette)
            }
            None => RightPanelHits::default(),
        };

        if let Some(notification) = self.notifications.current() {
            render_hud(f, area, notification, palette);
        }
        if let Some(alert) = &self.alert {
            alert.render(f, area, palette);
        }
    }

    pub fn shutdown(&self) {
        self.backend.shutdown();
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let mut last_tick = Instant::now();
    let mut first_render = true;

    loop {
        let mut events_processed = 0;
        let mut should_quit = false;

        while event_source.poll(Duration::from_millis(0))? && events_processed < 50 {
            let event = event_source.read()?;
            events_processed += 1;
            if app.handle_event(&event) == Some(AppAction::Quit) {
                should_quit = true;
                break;
            }
        }

        let mut needs_redraw = events_processed > 0 || first_render;
        first_render = false;

        if last_tick.elapsed() >= TICK_RATE {
            needs_redraw |= app.tick();
            last_tick = Instant::now();
        } else if app.viewer.view().is_animating() {
            needs_redraw |= app.viewer.tick();
        }

        if needs_redraw {
            terminal.draw(|f| app.draw(f))?;
        }

        if should_quit {
            app.shutdown();
            return Ok(());
        }

        if events_processed == 0 {
            let timeout = TICK_RATE
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));
            let _ = event_source.poll(timeout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::sidebar::{LEFT_MIN_WIDTH, RIGHT_COLLAPSED_WIDTH};

    #[test]
    fn layout_puts_command_bar_above_content_when_left_panel_is_collapsed() {
        let left = SidebarState::left(24);
        let right = SidebarState::right(30);
        let layout = AppLayout::compute(Rect::new(0, 0, 100, 40), &left, &right);

        assert_eq!(layout.left, None);
        assert_eq!(layout.right, Some(Rect::new(70, 0, 30, 40)));
        assert_eq!(layout.command_bar, Rect::new(0, 0, 70, 3));
        assert_eq!(layout.content, Rect::new(0, 3, 70, 37));
        assert_eq!(layout.right_divider(), Some(70));
    }

    #[test]
    fn layout_moves_command_bar_into_expanded_left_panel() {
        let mut left = SidebarState::left(LEFT_MIN_WIDTH);
        left.toggle();
        let mut right = SidebarState::right(30);
        right.toggle();
        let layout = AppLayout::compute(Rect::new(0, 0, 100, 40), &left, &right);

        assert_eq!(layout.left, Some(Rect::new(0, 0, LEFT_MIN_WIDTH, 40)));
        assert_eq!(layout.left_divider(), Some(LEFT_MIN_WIDTH - 1));
        assert_eq!(layout.command_bar, Rect::new(0, 2, LEFT_MIN_WIDTH - 1, 3));
        assert_eq!(
            layout.content,
            Rect::new(LEFT_MIN_WIDTH, 0, 100 - LEFT_MIN_WIDTH - RIGHT_COLLAPSED_WIDTH, 40)
        );
    }
}
