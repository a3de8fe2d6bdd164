use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::AudioOutput;
use crate::config;
use crate::sync::{SeekHandle, Session, SessionNotice};
use crate::ui;

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    seek: SeekHandle,
}

impl EventLoopState {
    pub fn new(seek: SeekHandle) -> Self {
        Self {
            pending_gg: false,
            seek,
        }
    }
}

/// Main terminal event loop: applies worker results, advances the clock,
/// draws and handles input. Returns `Ok(())` when the user quits.
pub fn run<O: AudioOutput>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    session: &mut Session<O>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    let poll_interval = Duration::from_millis(settings.clock.tick_ms.clamp(1, 50));

    loop {
        for notice in session.tick(Instant::now()) {
            app.set_message(notice_text(&notice));
        }

        let snap = app.snapshot();
        app.follow(snap.playback.active_line);
        terminal.draw(|f| ui::draw(f, app, &snap, &settings.ui, &settings.controls))?;

        if event::poll(poll_interval)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, session, state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn notice_text(notice: &SessionNotice) -> String {
    match notice {
        SessionNotice::Regenerated(kind) => format!("{kind} regenerated"),
        SessionNotice::RegenerationFailed(e) => format!("{e} (press r to retry)"),
        SessionNotice::SeekRejected(e) => e.to_string(),
    }
}

/// Returns true when the user asked to quit.
fn handle_key_event<O: AudioOutput>(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    session: &mut Session<O>,
    state: &mut EventLoopState,
) -> bool {
    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }
    let scrub = settings.controls.scrub_seconds as f64;
    let coordinator = session.coordinator_mut();

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('p') | KeyCode::Char(' ') => match coordinator.toggle() {
            Ok(()) => {
                app.clear_message();
                app.follow_playback_on();
            }
            Err(e) => app.set_message(e.to_string()),
        },
        KeyCode::Char('L') => {
            if let Err(e) = coordinator.seek_by(scrub) {
                app.set_message(e.to_string());
            }
        }
        KeyCode::Char('H') => {
            if let Err(e) = coordinator.seek_by(-scrub) {
                app.set_message(e.to_string());
            }
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.follow_playback_off();
                app.set_selected(0);
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            app.follow_playback_off();
            app.set_selected(app.lines.len().saturating_sub(1));
        }
        KeyCode::Enter => {
            if app.selected_line().is_some() {
                app.follow_playback_on();
                state.seek.seek_to_line(app.selected);
            }
        }
        KeyCode::Char('0') => {
            state.seek.seek(0.0);
        }
        KeyCode::Char('f') => app.toggle_follow(),
        KeyCode::Tab => app.focus_next(),
        KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Char('-') => {
            let kind = app.focused;
            let step = match key.code {
                KeyCode::Char('-') => -settings.controls.volume_step,
                _ => settings.controls.volume_step,
            };
            let current = coordinator.tracks().volume(kind);
            if let Some(v) = coordinator.set_volume(kind, current + step) {
                app.set_message(format!("{kind} volume {}%", (v * 100.0).round() as u32));
            }
        }
        KeyCode::Char('r') => {
            let kind = app.focused;
            match session.regenerate(kind) {
                Ok(()) => app.set_message(format!("regenerating {kind}...")),
                Err(e) => app.set_message(e.to_string()),
            }
        }
        _ => {}
    }

    false
}
