use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture},
    execute,
    terminal::{LeaveAlternateScreen, disable_raw_mode},
};
use std::io::{self, Write};
use std::panic;

pub fn initialize_panic_handler() {
    #[cfg(debug_assertions)]
    better_panic::install();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();

        if cfg!(debug_assertions) {
            default_hook(panic_info);
        } else {
            let meta = human_panic::metadata!();
            let report = human_panic::handle_dump(&meta, panic_info);
            let _ = human_panic::print_msg(report, &meta);
        }

        std::process::exit(1);
    }));
}

/// Restore terminal to a clean state
///
/// Specifically handles:
/// - Disabling raw mode
/// - Exiting alternate screen
/// - Disabling mouse capture and bracketed paste
/// - Showing the cursor
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    );
    let _ = execute!(io::stderr(), crossterm::cursor::Show);
    let _ = writeln!(io::stderr());
}
