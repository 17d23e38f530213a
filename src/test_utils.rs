pub mod test_helpers {
    use crate::event_source::{
        Event, KeyCode, KeyModifiers, MouseButton, MouseEventKind, SimulatedEventSource,
    };
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    /// Builder for creating test scenarios with simulated user input
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl Default for TestScenarioBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self { events: Vec::new() }
        }

        /// Add a character key press
        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        /// Add a Ctrl+character key press
        pub fn press_ctrl_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::ctrl_char_key(c));
            self
        }

        /// Type each character of `text`
        pub fn type_text(mut self, text: &str) -> Self {
            for c in text.chars() {
                self.events.push(SimulatedEventSource::char_key(c));
            }
            self
        }

        pub fn press_enter(self) -> Self {
            self.press(KeyCode::Enter)
        }

        pub fn press_tab(self) -> Self {
            self.press(KeyCode::Tab)
        }

        pub fn press_esc(self) -> Self {
            self.press(KeyCode::Esc)
        }

        pub fn press(mut self, code: KeyCode) -> Self {
            self.events
                .push(SimulatedEventSource::key_event(code, KeyModifiers::empty()));
            self
        }

        /// Paste text, the way a terminal delivers a dropped file
        pub fn paste(mut self, text: &str) -> Self {
            self.events.push(SimulatedEventSource::paste(text));
            self
        }

        /// Mouse press and release at the given cells
        pub fn drag(mut self, from: (u16, u16), to: (u16, u16)) -> Self {
            let left = MouseButton::Left;
            self.events.push(SimulatedEventSource::mouse(
                MouseEventKind::Down(left),
                from.0,
                from.1,
            ));
            self.events.push(SimulatedEventSource::mouse(
                MouseEventKind::Drag(left),
                to.0,
                to.1,
            ));
            self.events.push(SimulatedEventSource::mouse(
                MouseEventKind::Up(left),
                to.0,
                to.1,
            ));
            self
        }

        /// Quit the application (Ctrl+q works from any focus)
        pub fn quit(self) -> Self {
            self.press_ctrl_char('q')
        }

        /// Build the simulated event source
        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    /// Create a test terminal for snapshot testing
    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// Capture the current terminal buffer as a string
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            // Trim trailing whitespace from each line
            lines.push(line.trim_end().to_string());
        }

        // Remove trailing empty lines
        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }

        lines.join("\n")
    }
}

/// In-memory stand-ins for the PDF engine and the REST backend
pub mod fakes {
    use std::collections::{HashMap, HashSet};
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex, PoisonError};
    use std::time::Duration;

    use image::{Rgb, RgbImage};

    use crate::backend::{Backend, BackendError, SearchResult, parse_search_response};
    use crate::pdf::{
        DocumentInfo, EngineFactory, PageData, PageRegion, RenderEngine, RenderFault, Viewport,
    };

    /// US Letter in points
    pub const FAKE_PAGE_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

    #[derive(Default)]
    struct EngineLog {
        opened: Vec<PathBuf>,
        rendered: Vec<usize>,
    }

    /// Engine that paints flat gray pages
    #[derive(Clone)]
    pub struct FakeEngine {
        page_count: usize,
        failing_pages: HashSet<usize>,
        fail_open: bool,
        text: String,
        log: Arc<Mutex<EngineLog>>,
        open: bool,
    }

    impl FakeEngine {
        pub fn new(page_count: usize) -> Self {
            Self {
                page_count,
                failing_pages: HashSet::new(),
                fail_open: false,
                text: String::new(),
                log: Arc::new(Mutex::new(EngineLog::default())),
                open: false,
            }
        }

        /// Rendering this 0-based page fails
        pub fn failing_on(mut self, page: usize) -> Self {
            self.failing_pages.insert(page);
            self
        }

        pub fn failing_to_open(mut self) -> Self {
            self.fail_open = true;
            self
        }

        /// Text returned for every extraction
        pub fn with_text(mut self, text: &str) -> Self {
            self.text = text.to_string();
            self
        }

        /// Factory handing out clones that share this engine's log
        pub fn factory(&self) -> EngineFactory {
            let engine = self.clone();
            Arc::new(move || Box::new(engine.clone()))
        }

        /// Pages rendered so far, in order
        pub fn rendered(&self) -> Vec<usize> {
            self.log
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .rendered
                .clone()
        }

        pub fn opened(&self) -> Vec<PathBuf> {
            self.log
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .opened
                .clone()
        }
    }

    impl RenderEngine for FakeEngine {
        fn open(&mut self, path: &Path) -> Result<DocumentInfo, RenderFault> {
            self.log
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .opened
                .push(path.to_path_buf());
            if self.fail_open {
                self.open = false;
                return Err(RenderFault::generic("cannot open document"));
            }
            self.open = true;
            Ok(DocumentInfo {
                page_count: self.page_count,
                title: None,
            })
        }

        fn render_page(&mut self, page: usize, scale: f32) -> Result<PageData, RenderFault> {
            if !self.open {
                return Err(RenderFault::NoDocument);
            }
            if page >= self.page_count {
                return Err(RenderFault::PageOutOfRange {
                    page,
                    page_count: self.page_count,
                });
            }
            self.log
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .rendered
                .push(page);
            if self.failing_pages.contains(&page) {
                return Err(RenderFault::generic(format!("page {page} is corrupt")));
            }

            let viewport = Viewport::new(FAKE_PAGE_BOX, scale);
            let image = RgbImage::from_pixel(
                viewport.width as u32,
                viewport.height as u32,
                Rgb([200, 200, 200]),
            );
            Ok(PageData {
                page_num: page,
                image,
                viewport,
            })
        }

        fn extract_text(&mut self, _page: usize, _region: PageRegion) -> Result<String, RenderFault> {
            Ok(self.text.clone())
        }
    }

    /// Ways the fake search endpoint can fail
    #[derive(Clone, Copy, Debug)]
    pub enum SearchFailure {
        Status(u16),
        NotJson,
        NoResults,
        Malformed,
        Unreachable,
    }

    impl SearchFailure {
        fn to_error(self) -> BackendError {
            let parsed = match self {
                SearchFailure::Status(status) => parse_search_response(status, "error"),
                SearchFailure::NotJson => parse_search_response(200, "<html>"),
                SearchFailure::NoResults => parse_search_response(200, "{}"),
                SearchFailure::Malformed => {
                    parse_search_response(200, r#"{"results": [{"page": "one"}]}"#)
                }
                SearchFailure::Unreachable => {
                    return BackendError::Io {
                        path: "/keyword".to_string(),
                        source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
                    };
                }
            };
            match parsed {
                Err(e) => e,
                Ok(_) => BackendError::MissingField("results"),
            }
        }
    }

    #[derive(Default)]
    struct BackendState {
        uploads: Vec<(PathBuf, String)>,
        searches: Vec<(String, String)>,
        upload_status: Option<u16>,
        results: HashMap<String, Vec<SearchResult>>,
        failure: Option<SearchFailure>,
        delays: HashMap<String, Duration>,
    }

    /// Backend that records requests and answers from canned data.
    ///
    /// Uploads succeed with `uploads/{file_name}` unless a failing status is set.
    #[derive(Default)]
    pub struct FakeBackend {
        state: Mutex<BackendState>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        fn state(&self) -> std::sync::MutexGuard<'_, BackendState> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }

        pub fn with_results(self, keyword: &str, results: Vec<SearchResult>) -> Self {
            self.state().results.insert(keyword.to_string(), results);
            self
        }

        /// Delay the answer for `keyword`
        pub fn with_delay(self, keyword: &str, delay: Duration) -> Self {
            self.state().delays.insert(keyword.to_string(), delay);
            self
        }

        pub fn failing_search(self, failure: SearchFailure) -> Self {
            self.state().failure = Some(failure);
            self
        }

        pub fn failing_upload(self, status: u16) -> Self {
            self.state().upload_status = Some(status);
            self
        }

        pub fn uploads(&self) -> Vec<(PathBuf, String)> {
            self.state().uploads.clone()
        }

        pub fn searches(&self) -> Vec<(String, String)> {
            self.state().searches.clone()
        }
    }

    impl Backend for FakeBackend {
        fn upload(&self, local_path: &Path, file_name: &str) -> Result<String, BackendError> {
            let mut state = self.state();
            state
                .uploads
                .push((local_path.to_path_buf(), file_name.to_string()));
            match state.upload_status {
                Some(status) => Err(BackendError::Status {
                    status,
                    message: "upload rejected".to_string(),
                }),
                None => Ok(format!("uploads/{file_name}")),
            }
        }

        fn keyword_search(
            &self,
            pdf_path: &str,
            keyword: &str,
        ) -> Result<Vec<SearchResult>, BackendError> {
            let (delay, outcome) = {
                let mut state = self.state();
                state
                    .searches
                    .push((pdf_path.to_string(), keyword.to_string()));
                let outcome = match state.failure {
                    Some(failure) => Err(failure),
                    None => Ok(state.results.get(keyword).cloned().unwrap_or_default()),
                };
                (state.delays.get(keyword).copied(), outcome)
            };

            if let Some(delay) = delay {
                std::thread::sleep(delay);
            }
            outcome.map_err(SearchFailure::to_error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::test_helpers::*;
    use crate::backend::Backend;
    use crate::pdf::RenderEngine;
    use std::path::Path;

    #[test]
    fn test_scenario_builder() {
        let scenario = TestScenarioBuilder::new()
            .type_text("go")
            .press_enter()
            .press_tab()
            .drag((1, 1), (2, 2))
            .quit()
            .build();

        // Verify the events were created correctly
        let events = scenario.events;
        assert_eq!(events.len(), 8);
    }

    #[test]
    fn fake_engine_shares_its_log_with_factory_clones() {
        let engine = FakeEngine::new(2);
        let factory = engine.factory();
        let mut worker_copy = factory();
        worker_copy.open(Path::new("a.pdf")).unwrap();
        worker_copy.render_page(1, 1.0).unwrap();
        assert_eq!(engine.rendered(), vec![1]);
        assert_eq!(engine.opened().len(), 1);
    }

    #[test]
    fn fake_backend_failures_use_real_error_variants() {
        let backend = FakeBackend::new().failing_search(SearchFailure::NoResults);
        let err = backend.keyword_search("uploads/a.pdf", "x").unwrap_err();
        assert_eq!(
            err.search_message(),
            "Search failed: the server response had no results."
        );
    }
}
