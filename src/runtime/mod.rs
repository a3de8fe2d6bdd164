use std::env;
use std::sync::Arc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::{RodioOutput, TrackLoader};
use crate::show::{CommandRegenerator, ShowId, ShowStore};
use crate::sync::{Session, SnapshotHandle, SnapshotObserver, SyncCoordinator};

mod event_loop;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let show: ShowId = match env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => return Err("usage: playbill <show-id>".into()),
    };

    let settings = settings::load_settings();
    startup::init_logging(&settings.logging);
    log::info!("opening show {show} from {}", settings.store.root.display());

    let store = Arc::new(ShowStore::new(&settings.store));
    let output = RodioOutput::open_default()?;

    let mut coordinator = SyncCoordinator::new(output, &settings.audio, &settings.clock);
    let snapshot = SnapshotHandle::default();
    coordinator.add_observer(Box::new(SnapshotObserver::new(snapshot.clone())));
    coordinator.set_timing(startup::load_timing(store.as_ref(), show));

    let loader = TrackLoader::new(show, store);
    let regenerator = Arc::new(CommandRegenerator::new(&settings.regeneration));
    let mut session = Session::new(coordinator, loader, regenerator);

    let mut app = App::new(show, session.coordinator().lines().entries().to_vec());
    app.follow_playback = settings.ui.follow_playback;
    app.set_snapshot_handle(snapshot);

    session.load_all();

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::new(session.seek_handle());
        event_loop::run(&mut terminal, &settings, &mut app, &mut session, &mut state)
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    log::info!("closing show {show}");
    run_result
}
