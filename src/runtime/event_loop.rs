use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, warn};

use crate::app::App;
use crate::audio::Auditioner;
use crate::session::Session;
use crate::ui::{self, Preview, StatusView};

use super::{asset_at, labels, scan_message};

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    /// `None` when no output device could be opened or audition is off.
    pub auditioner: Option<Auditioner>,
}

impl EventLoopState {
    pub fn new(auditioner: Option<Auditioner>) -> Self {
        Self {
            pending_gg: false,
            auditioner,
        }
    }
}

/// Main terminal event loop: collects finished waveform jobs, keeps the rows
/// around the selection warm, draws, and handles input. Returns `Ok(())`
/// when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    session: &mut Session,
    app: &mut App,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        for done in session.waveforms().tick() {
            if let Err(e) = &done.outcome {
                debug!(asset = %done.asset, error = %e, "waveform unavailable");
            }
        }

        let preview = prepare_neighbourhood(session, app);

        if state
            .auditioner
            .as_ref()
            .is_some_and(|a| a.playing().is_none())
        {
            app.auditioning = None;
        }

        let display = app.display_indices();
        let ui_settings = session.settings().ui.clone();
        let cache_available = session.waveforms().storage_available();
        let pending = session.waveforms().pending_count();
        let playing = state
            .auditioner
            .as_ref()
            .and_then(|a| a.playing())
            .and_then(|p| p.file_stem());
        let status = StatusView {
            cache_available,
            pending,
            auditioning: playing,
            selected: session.database().list().get(app.selected),
        };
        terminal.draw(|f| ui::draw(f, app, &display, &preview, &status, &ui_settings))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, session, app, state) {
                    break;
                }
            }
        }
    }

    if let Some(a) = state.auditioner.as_mut() {
        a.stop();
    }
    Ok(())
}

/// Read tags and request waveforms for the rows around the selection.
/// Returns the preview for the selected row.
fn prepare_neighbourhood(session: &mut Session, app: &mut App) -> Preview {
    let radius = session.settings().ui.prefetch_rows;
    for idx in app.neighbourhood(radius) {
        if session.ensure_metadata(idx) {
            if let Some(record) = session.database().list().get(idx) {
                let label = session.label(record);
                app.set_label(idx, label);
            }
        }
        if idx != app.selected {
            if let Some(asset) = asset_at(session, idx) {
                session.waveforms().request(&asset);
            }
        }
    }

    let Some(id) = session
        .database()
        .list()
        .get(app.selected)
        .map(|r| r.id.clone())
    else {
        return Preview::Nothing;
    };
    match session.peaks_for(&id) {
        Some(status) => Preview::from(status),
        None => Preview::Unavailable,
    }
}

fn audition_selected(session: &Session, app: &mut App, state: &mut EventLoopState) {
    let Some(auditioner) = state.auditioner.as_mut() else {
        app.status = Some("audition is off".to_string());
        return;
    };
    let Some(asset) = asset_at(session, app.selected) else {
        app.status = Some("nothing to play for this sample".to_string());
        return;
    };
    match auditioner.play(&asset) {
        Ok(()) => app.auditioning = Some(app.selected),
        Err(e) => {
            warn!(error = %e, "audition failed");
            app.status = Some(e.to_string());
        }
    }
}

fn rescan(session: &mut Session, app: &mut App, state: &mut EventLoopState) {
    if let Some(a) = state.auditioner.as_mut() {
        a.stop();
    }
    if let Some(summary) = session.rescan() {
        app.set_labels(labels(session));
        app.status = Some(scan_message(&summary));
    }
}

/// Handle one key press. Returns `true` when the app should quit.
fn handle_key_event(
    key: KeyEvent,
    session: &mut Session,
    app: &mut App,
    state: &mut EventLoopState,
) -> bool {
    if app.filter_mode {
        state.pending_gg = false;
        match key.code {
            KeyCode::Esc => app.clear_filter(),
            KeyCode::Backspace => app.pop_filter_char(),
            KeyCode::Char('j') | KeyCode::Char('n')
                if key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                app.next()
            }
            KeyCode::Char('k') | KeyCode::Char('p')
                if key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                app.prev()
            }
            KeyCode::Down => app.next(),
            KeyCode::Up => app.prev(),
            KeyCode::Char(c) => {
                if !c.is_control() {
                    app.push_filter_char(c);
                }
            }
            KeyCode::Enter => {
                if !app.display_indices().is_empty() {
                    app.exit_filter_mode();
                    audition_selected(session, app, state);
                }
            }
            _ => {}
        }
        return false;
    }

    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('/') => app.enter_filter_mode(),
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Enter => audition_selected(session, app, state),
        KeyCode::Char('s') => {
            if let Some(a) = state.auditioner.as_mut() {
                a.stop();
            }
            app.auditioning = None;
        }
        KeyCode::Char('K') => app.toggle_metadata_window(),
        KeyCode::Char('r') => rescan(session, app, state),
        KeyCode::Char('R') => {
            if let Some(asset) = asset_at(session, app.selected) {
                session.waveforms().regenerate(&asset);
            }
        }
        _ => {}
    }

    false
}
