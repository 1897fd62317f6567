use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use ratatui::layout::Rect;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tui_citymap::app::App;
use tui_citymap::config::Config;
use tui_citymap::{data, input, ui};

fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(&config)?;

    let app = match data::load(&config) {
        Ok(dataset) => App::new(dataset),
        Err(e) => {
            // Stay up but inert; the map shows the reason
            error!("failed to load data: {e:#}");
            App::inert(format!("{e:#}"))
        }
    };

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, app, config.paused);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

fn init_logging(config: &Config) -> Result<()> {
    let file = File::create(&config.log_file)
        .with_context(|| format!("creating log file {}", config.log_file.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run(terminal: &mut DefaultTerminal, mut app: App, paused: bool) -> Result<()> {
    app.launch(paused, Instant::now());
    info!("animation {}", if app.clock.is_running() { "started" } else { "paused" });

    // Main loop
    loop {
        let now = Instant::now();
        terminal.draw(|frame| ui::render(frame, &app, now))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            let now = Instant::now();
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(message) = input::key_message(&app, key) {
                        app.update(message, now);
                    }
                }
                Event::Mouse(mouse) => {
                    let size = terminal.size()?;
                    let areas = ui::layout(Rect::new(0, 0, size.width, size.height), &app.dataset.years);
                    for message in input::mouse_messages(&app, &areas, mouse, now) {
                        app.update(message, now);
                    }
                }
                _ => {}
            }
        }

        app.poll_clock(Instant::now());

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
