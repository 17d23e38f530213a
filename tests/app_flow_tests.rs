use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rayo::backend::{BoundingBox, SearchResult};
use rayo::command::INVALID_INPUT_ALERT;
use rayo::event_source::{EventSource, SimulatedEventSource};
use rayo::main_app::{BOOKMARK_NOTICE, NO_DOCUMENT_MESSAGE, SHARE_NOTICE};
use rayo::settings::Settings;
use rayo::test_utils::fakes::{FakeBackend, FakeEngine, SearchFailure};
use rayo::test_utils::test_helpers::{
    TestScenarioBuilder, capture_terminal_state, create_test_terminal,
};
use rayo::upload::INVALID_FILE_ALERT;
use rayo::widget::sidebar::RIGHT_COLLAPSED_WIDTH;
use rayo::{App, FocusedPanel, run_app_with_event_source};

const SETTLE: Duration = Duration::from_secs(5);

fn settings() -> Settings {
    Settings {
        command_cooldown_ms: 0,
        render_scale: 0.5,
        ..Settings::default()
    }
}

fn result(page: usize) -> SearchResult {
    SearchResult {
        page,
        boxes: vec![BoundingBox::new(72.0, 700.0, 200.0, 720.0)],
    }
}

fn make_app(backend: &Arc<FakeBackend>, engine: &FakeEngine) -> App {
    App::with_services(settings(), backend.clone(), engine.factory())
}

/// Feed every scripted event through the app without running the loop
fn feed(app: &mut App, mut source: SimulatedEventSource) {
    while source.poll(Duration::ZERO).unwrap() {
        let event = source.read().unwrap();
        app.handle_event(&event);
    }
}

fn type_command(app: &mut App, text: &str) {
    app.focused_panel = FocusedPanel::CommandBar;
    feed(app, TestScenarioBuilder::new().type_text(text).press_enter().build());
}

/// Upload `paper.pdf` through a drop and wait for the document to render
fn open_paper(app: &mut App) -> PathBuf {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("paper.pdf");
    std::fs::write(&path, b"%PDF-1.4").unwrap();

    app.focused_panel = FocusedPanel::Content;
    feed(
        app,
        TestScenarioBuilder::new()
            .paste(&format!("'{}'", path.display()))
            .build(),
    );
    assert!(app.settle(SETTLE), "upload and render should finish");
    path
}

#[test]
fn search_without_document_never_reaches_backend() {
    let backend = Arc::new(FakeBackend::new());
    let engine = FakeEngine::new(2);
    let mut app = make_app(&backend, &engine);

    type_command(&mut app, "search for lorem");

    assert_eq!(app.interaction_message(), NO_DOCUMENT_MESSAGE);
    assert!(backend.searches().is_empty());
    assert!(!app.is_searching());
}

#[test]
fn dropping_a_non_pdf_alerts_without_uploading() {
    let backend = Arc::new(FakeBackend::new());
    let engine = FakeEngine::new(2);
    let mut app = make_app(&backend, &engine);

    feed(
        &mut app,
        TestScenarioBuilder::new()
            .press_tab()
            .paste("/home/me/notes.txt")
            .build(),
    );

    assert_eq!(app.alert_message(), Some(INVALID_FILE_ALERT));
    assert!(backend.uploads().is_empty());
    assert!(app.document().is_none());

    feed(&mut app, TestScenarioBuilder::new().press_enter().build());
    assert_eq!(app.alert_message(), None);
}

#[test]
fn upload_then_search_highlights_results() {
    let backend =
        Arc::new(FakeBackend::new().with_results("lorem", vec![result(1), result(3)]));
    let engine = FakeEngine::new(3);
    let mut app = make_app(&backend, &engine);

    let path = open_paper(&mut app);

    let document = app.document().expect("document after upload");
    assert_eq!(document.remote_path, "uploads/paper.pdf");
    assert_eq!(document.local_path, path);
    assert_eq!(app.viewer.view().page_count(), Some(3));
    assert_eq!(engine.rendered(), vec![0, 1, 2]);
    assert_eq!(app.drop_zone.status_line().as_deref(), Some("Uploaded file: paper.pdf"));

    type_command(&mut app, "search for lorem");
    assert_eq!(
        app.interaction_message(),
        "Searching for term \"lorem\" within the document."
    );
    assert!(app.settle(SETTLE));

    assert_eq!(app.interaction_message(), "Found 2 results for \"lorem\"");
    assert_eq!(
        backend.searches(),
        vec![("uploads/paper.pdf".to_string(), "lorem".to_string())]
    );
    assert_eq!(app.results().len(), 2);
    assert_eq!(app.viewer.view().overlays(0).len(), 1);
    assert_eq!(app.viewer.view().overlays(1).len(), 0);
    assert_eq!(app.viewer.view().overlays(2).len(), 1);
}

#[test]
fn search_without_matches_still_shows_the_result_count() {
    let backend = Arc::new(FakeBackend::new());
    let engine = FakeEngine::new(1);
    let mut app = make_app(&backend, &engine);
    let mut terminal = create_test_terminal(120, 30);
    open_paper(&mut app);

    terminal.draw(|f| app.draw(f)).unwrap();
    assert!(!capture_terminal_state(&terminal).contains("Found 0 results"));

    type_command(&mut app, "search for nothing");
    assert!(app.settle(SETTLE));
    terminal.draw(|f| app.draw(f)).unwrap();

    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains("Found 0 results"));
    assert!(screen.contains("[ Previous ]"));
    assert!(app.results().is_empty());
}

#[test]
fn result_navigation_clamps_at_both_ends() {
    let backend =
        Arc::new(FakeBackend::new().with_results("term", vec![result(1), result(2)]));
    let engine = FakeEngine::new(2);
    let mut app = make_app(&backend, &engine);
    open_paper(&mut app);
    type_command(&mut app, "search for term");
    assert!(app.settle(SETTLE));

    assert_eq!(app.results().index(), 0);
    assert!(!app.results().has_previous());

    app.previous_result();
    assert_eq!(app.results().index(), 0);

    app.next_result();
    assert_eq!(app.results().index(), 1);
    assert!(!app.results().has_next());

    app.next_result();
    assert_eq!(app.results().index(), 1);

    app.previous_result();
    assert_eq!(app.results().index(), 0);
}

#[test]
fn only_the_latest_search_is_applied() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_results("slow", vec![result(1)])
            .with_delay("slow", Duration::from_millis(300))
            .with_results("fast", vec![result(1), result(2)]),
    );
    let engine = FakeEngine::new(2);
    let mut app = make_app(&backend, &engine);
    open_paper(&mut app);

    type_command(&mut app, "search for slow");
    type_command(&mut app, "search for fast");
    assert!(app.settle(SETTLE));
    assert_eq!(app.interaction_message(), "Found 2 results for \"fast\"");

    // the slow answer arrives afterwards and is dropped
    std::thread::sleep(Duration::from_millis(400));
    app.tick();
    assert_eq!(app.interaction_message(), "Found 2 results for \"fast\"");
    assert_eq!(app.results().len(), 2);
}

#[test]
fn search_errors_become_the_interaction_message() {
    let backend = Arc::new(FakeBackend::new().failing_search(SearchFailure::Status(503)));
    let engine = FakeEngine::new(1);
    let mut app = make_app(&backend, &engine);
    open_paper(&mut app);

    type_command(&mut app, "search for anything");
    assert!(app.settle(SETTLE));

    assert_eq!(
        app.interaction_message(),
        "Search failed: server responded with status 503."
    );
    assert!(app.results().is_empty());
}

#[test]
fn failed_upload_alerts_and_keeps_no_document() {
    let backend = Arc::new(FakeBackend::new().failing_upload(500));
    let engine = FakeEngine::new(1);
    let mut app = make_app(&backend, &engine);

    app.request_upload(std::path::Path::new("/tmp/paper.pdf"));
    assert!(app.settle(SETTLE));

    assert_eq!(
        app.alert_message(),
        Some("Failed to upload the file. Please try again.")
    );
    assert!(app.document().is_none());
    assert!(engine.opened().is_empty());
}

#[test]
fn resubmitting_inside_the_cooldown_is_ignored() {
    let backend = Arc::new(FakeBackend::new());
    let engine = FakeEngine::new(1);
    let mut app = App::with_services(
        Settings {
            command_cooldown_ms: 10_000,
            ..settings()
        },
        backend.clone(),
        engine.factory(),
    );

    type_command(&mut app, "go to page 2");
    assert_eq!(app.interaction_message(), "Navigating to page 2.");

    type_command(&mut app, "search for x");
    assert_eq!(app.interaction_message(), "Navigating to page 2.");
    assert_eq!(app.command_bar.input(), "search for x");
}

#[test]
fn go_to_page_scrolls_once_the_page_is_rendered() {
    let backend = Arc::new(FakeBackend::new());
    let engine = FakeEngine::new(5);
    let mut app = make_app(&backend, &engine);
    let mut terminal = create_test_terminal(100, 30);
    open_paper(&mut app);
    terminal.draw(|f| app.draw(f)).unwrap();

    type_command(&mut app, "Go To Page 4");
    assert_eq!(app.interaction_message(), "Navigating to page 4.");
    assert!(app.settle(SETTLE));

    let view = app.viewer.view();
    assert!(view.scroll_target().is_some() || view.scroll_offset() > 0);
    while app.viewer.tick() {}
    assert_eq!(app.viewer.view().current_page(), Some(3));
}

#[test]
fn unrecognised_input_alerts_and_urls_are_noticed() {
    let backend = Arc::new(FakeBackend::new());
    let engine = FakeEngine::new(1);
    let mut app = make_app(&backend, &engine);

    type_command(&mut app, "hello there");
    assert_eq!(app.alert_message(), Some(INVALID_INPUT_ALERT));
    app.dismiss_alert();

    type_command(&mut app, "https://example.com/paper");
    assert_eq!(app.alert_message(), None);
    assert_eq!(
        app.notifications.current().map(|n| n.message.as_str()),
        Some("Detected as URL: https://example.com/paper")
    );
}

#[test]
fn right_panel_icons_raise_notices() {
    let backend = Arc::new(FakeBackend::new());
    let engine = FakeEngine::new(1);
    let mut app = make_app(&backend, &engine);
    let mut terminal = create_test_terminal(100, 30);
    terminal.draw(|f| app.draw(f)).unwrap();

    let hits = app.right_panel_hits();
    let bookmark = hits.bookmark.expect("bookmark icon drawn");
    feed(
        &mut app,
        TestScenarioBuilder::new()
            .drag((bookmark.x, bookmark.y), (bookmark.x, bookmark.y))
            .build(),
    );
    assert_eq!(
        app.notifications.current().map(|n| n.message.as_str()),
        Some(BOOKMARK_NOTICE)
    );

    // collapsed panel keeps the icons
    app.right_sidebar.toggle();
    terminal.draw(|f| app.draw(f)).unwrap();
    let share = app.right_panel_hits().share.expect("share icon drawn");
    assert_eq!(share.x, 100 - RIGHT_COLLAPSED_WIDTH);
    feed(
        &mut app,
        TestScenarioBuilder::new()
            .drag((share.x, share.y), (share.x, share.y))
            .build(),
    );
    assert_eq!(
        app.notifications.current().map(|n| n.message.as_str()),
        Some(SHARE_NOTICE)
    );
}

#[test]
fn dragging_the_right_divider_resizes_the_panel() {
    let backend = Arc::new(FakeBackend::new());
    let engine = FakeEngine::new(1);
    let mut app = make_app(&backend, &engine);
    let mut terminal = create_test_terminal(120, 30);
    terminal.draw(|f| app.draw(f)).unwrap();

    let before = app.right_sidebar.width();
    let divider = app.layout().right_divider().expect("right panel expanded");
    feed(
        &mut app,
        TestScenarioBuilder::new()
            .drag((divider, 10), (divider - 5, 10))
            .build(),
    );
    assert_eq!(app.right_sidebar.width(), before + 5);
}

#[test]
fn run_loop_draws_the_interaction_message() {
    let backend = Arc::new(FakeBackend::new());
    let engine = FakeEngine::new(1);
    let mut app = make_app(&backend, &engine);
    let mut terminal = create_test_terminal(120, 30);

    let mut events = TestScenarioBuilder::new()
        .type_text("search for lorem")
        .press_enter()
        .quit()
        .build();
    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();

    let screen = capture_terminal_state(&terminal);
    assert!(screen.contains("No document loaded."));
    assert!(screen.contains("Drop a PDF file here"));
}
