use std::env;
use std::fs::{self, OpenOptions};
use std::panic;
use std::sync::Mutex;
use std::thread;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::audio::Auditioner;
use crate::config::LogSettings;
use crate::path::{self, AssetPath};
use crate::session::{ScanSummary, Session};

mod event_loop;
mod settings;

/// Environment variable that overrides `log.level` with a full filter directive.
const LOG_ENV: &str = "SAMPLESHELF_LOG";

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, problem) = settings::load_settings();
    init_logging(&settings.log);
    install_panic_hook();
    if let Some(problem) = problem {
        warn!(%problem, "using default settings");
    }

    let dir = env::args().nth(1).unwrap_or_else(|| {
        env::current_dir()
            .ok()
            .and_then(|p| p.to_str().map(|s| s.to_string()))
            .unwrap_or_else(|| ".".to_string())
    });
    // Cache keys hash the path, so they must not depend on the working directory.
    let root = path::normalize(Some(&dir)).to_absolute();

    let auditioner = if settings.audio.audition {
        match Auditioner::new(settings.audio.volume) {
            Ok(a) => Some(a),
            Err(e) => {
                warn!(error = %e, "audition disabled");
                None
            }
        }
    } else {
        None
    };

    let mut session = Session::new(settings);
    let summary = session.scan(&root);
    let mut app = App::new(labels(&session));
    app.set_current_dir(root.to_string());
    app.status = Some(scan_message(&summary));

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::new(auditioner);
        event_loop::run(&mut terminal, &mut session, &mut app, &mut state)
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("shutting down");
    run_result
}

/// Send tracing output to the log file; the terminal belongs to the TUI.
fn init_logging(log: &LogSettings) {
    let Some(file_path) = log.resolved_file() else {
        return;
    };
    if let Some(parent) = file_path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&file_path) else {
        return;
    };

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(&log.level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

/// Route panic messages to the log instead of stderr, which the TUI owns.
///
/// A panic on the main thread also leaves the alternate screen and then
/// reports through the previous hook, since the program is going down.
fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let current = thread::current();
        let name = current.name().unwrap_or("<unnamed>");
        error!(thread = name, "{info}");
        if name == "main" {
            let _ = disable_raw_mode();
            let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
            previous(info);
        }
    }));
}

/// One display label per database record, in database order.
fn labels(session: &Session) -> Vec<String> {
    session
        .database()
        .list()
        .iter()
        .map(|r| session.label(r))
        .collect()
}

fn scan_message(summary: &ScanSummary) -> String {
    if summary.skipped.is_empty() {
        format!("found {} samples", summary.found)
    } else {
        format!(
            "found {} samples, {} unreadable entries skipped",
            summary.found,
            summary.skipped.len()
        )
    }
}

/// Path of the record at `idx`, if it is a local file.
fn asset_at(session: &Session, idx: usize) -> Option<AssetPath> {
    session
        .database()
        .list()
        .get(idx)
        .and_then(|r| r.id.asset_path())
        .cloned()
}
