use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use rayo::event_source::TerminalEventSource;
use rayo::panic_handler::initialize_panic_handler;
use rayo::{App, run_app_with_event_source, settings};

#[derive(Parser, Debug)]
#[command(name = "rayo")]
#[command(version, about = "Terminal PDF viewer with backend keyword search", long_about = None)]
struct Cli {
    /// PDF to upload and open on startup
    file: Option<PathBuf>,

    /// Base URL of the upload/search backend (overrides the config file)
    #[arg(long)]
    backend_url: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "rayo.log")]
    log_file: PathBuf,

    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    WriteLogger::init(
        cli.log_level,
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("cannot create log file {}", cli.log_file.display()))?,
    )?;
    initialize_panic_handler();

    info!("Starting rayo");

    settings::load_settings(cli.config.as_deref());
    if let Some(url) = cli.backend_url {
        settings::update(|s| s.backend_url = url);
    }

    let mut app = App::new(settings::snapshot())?;
    if let Some(path) = &cli.file {
        app.request_upload(path);
    }

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app_with_event_source(&mut terminal, &mut app, &mut TerminalEventSource);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down rayo");
    Ok(())
}
