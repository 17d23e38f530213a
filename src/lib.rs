// Export modules for use in tests
pub mod backend;
pub mod command;
pub mod event_source;
pub mod main_app;
pub mod notification;
pub mod panic_handler;
pub mod pdf;
pub mod settings;
pub mod theme;
pub mod upload;
pub mod widget;

pub mod test_utils;

// Re-export main app components
pub use main_app::{App, AppAction, FocusedPanel, run_app_with_event_source};
