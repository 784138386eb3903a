//! Terminal User Interface for engagedash
//!
//! Features:
//! - Filter picker with multi-select checkboxes and reset
//! - KPI row, four charts and a scrollable preview
//! - Auto-refresh when the raw data file changes

pub mod app;
pub mod events;
pub mod msg; // TEA message types (what happened)
pub mod state; // Pure state transformations (functional core)
pub mod ui;
pub mod update; // TEA update function (state transitions)
pub mod views;
pub mod widgets;

use std::io;
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{poll, read, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use ratatui::prelude::*;
use tracing::warn;

use crate::config::Config;
use app::App;
use events::{handle_event, handle_mouse};
use msg::Msg;

/// Run the TUI application. The dataset is prepared before the terminal is
/// touched, so a missing raw file is reported on a normal screen.
pub fn run(config: Config) -> anyhow::Result<()> {
    let mut app = App::new(config)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app, ensuring cleanup happens even on error
    let result = run_app_inner(&mut terminal, &mut app);

    // Restore terminal - this MUST run even if app fails
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture);
    let _ = terminal.show_cursor();

    result
}

fn run_app_inner<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    let size = terminal.size()?;
    app.resize(size.width, size.height);

    let (tx, rx) = mpsc::channel();
    // Keep the watcher alive for the whole loop
    let _watcher = watch_raw_file(app.raw_path(), tx);

    run_event_loop(terminal, app, rx)
}

/// Watch the raw file's directory, since editors often replace files
/// rather than writing in place. Failure only disables auto-refresh.
fn watch_raw_file(raw: &Path, tx: mpsc::Sender<()>) -> Option<RecommendedWatcher> {
    let file_name = raw.file_name()?.to_os_string();
    let dir = match raw.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };

    let watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                let touches_raw = event.paths.iter().any(|p| p.file_name() == Some(file_name.as_os_str()));
                if touches_raw && (event.kind.is_modify() || event.kind.is_create()) {
                    let _ = tx.send(());
                }
            }
        },
        notify::Config::default(),
    );

    match watcher {
        Ok(mut watcher) => match watcher.watch(&dir, RecursiveMode::NonRecursive) {
            Ok(()) => Some(watcher),
            Err(e) => {
                warn!(error = %e, dir = %dir.display(), "cannot watch raw data directory");
                None
            }
        },
        Err(e) => {
            warn!(error = %e, "file watcher unavailable");
            None
        }
    }
}

fn run_event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    file_change_rx: mpsc::Receiver<()>,
) -> anyhow::Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if poll(timeout)? {
            match read()? {
                Event::Key(key) => {
                    if handle_event(app, key) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        // Editors fire several events per save; one reload covers them all
        if file_change_rx.try_recv().is_ok() {
            while file_change_rx.try_recv().is_ok() {}
            app.dispatch(Msg::RawChanged);
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }
    }
}
