use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Instant;

use crate::audio::{AudioOutput, LoadOutcome, LoadTicket, TrackLoader};
use crate::error::{RegenerationError, TransportRejected};
use crate::show::{Regenerator, TrackKind};

use super::coordinator::SyncCoordinator;

/// Messages posted to the event loop by worker threads and seek handles.
#[derive(Debug)]
pub enum SessionEvent {
    Loaded {
        ticket: LoadTicket,
        outcome: LoadOutcome,
    },
    Regenerated {
        kind: TrackKind,
        result: Result<LoadOutcome, RegenerationError>,
    },
    Seek(f64),
    SeekToLine(usize),
}

/// Something the front-end may want to tell the user about.
#[derive(Debug)]
pub enum SessionNotice {
    Regenerated(TrackKind),
    RegenerationFailed(RegenerationError),
    SeekRejected(TransportRejected),
}

/// Lets another component request a seek, e.g. "jump to this line".
///
/// The seek is applied on the next `Session::pump`.
#[derive(Debug, Clone)]
pub struct SeekHandle {
    tx: Sender<SessionEvent>,
}

impl SeekHandle {
    /// Returns false if the session is gone.
    pub fn seek(&self, time: f64) -> bool {
        self.tx.send(SessionEvent::Seek(time)).is_ok()
    }

    /// Seek to the start of a script line, by timeline index.
    pub fn seek_to_line(&self, index: usize) -> bool {
        self.tx.send(SessionEvent::SeekToLine(index)).is_ok()
    }
}

/// Owns the coordinator and runs the blocking work around it.
///
/// Fetching, decoding and regeneration happen on short-lived threads that
/// only post `SessionEvent`s back; `pump` applies them one at a time on the
/// thread that owns the session.
pub struct Session<O: AudioOutput> {
    coordinator: SyncCoordinator<O>,
    loader: Arc<TrackLoader>,
    regenerator: Arc<dyn Regenerator>,
    tx: Sender<SessionEvent>,
    rx: Receiver<SessionEvent>,
}

impl<O: AudioOutput> Session<O> {
    pub fn new(
        coordinator: SyncCoordinator<O>,
        loader: TrackLoader,
        regenerator: Arc<dyn Regenerator>,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            coordinator,
            loader: Arc::new(loader),
            regenerator,
            tx,
            rx,
        }
    }

    pub fn coordinator(&self) -> &SyncCoordinator<O> {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut SyncCoordinator<O> {
        &mut self.coordinator
    }

    pub fn seek_handle(&self) -> SeekHandle {
        SeekHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn load_all(&mut self) {
        for kind in TrackKind::ALL {
            self.load(kind);
        }
    }

    /// (Re)load one track in the background.
    pub fn load(&mut self, kind: TrackKind) {
        let ticket = self.coordinator.begin_load(kind);
        let loader = Arc::clone(&self.loader);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let outcome = loader.load(kind);
            let _ = tx.send(SessionEvent::Loaded { ticket, outcome });
        });
    }

    /// Ask the regenerator for a new `kind` track, then fetch and decode it.
    pub fn regenerate(&mut self, kind: TrackKind) -> Result<(), RegenerationError> {
        self.coordinator.begin_regeneration(kind)?;
        let loader = Arc::clone(&self.loader);
        let regenerator = Arc::clone(&self.regenerator);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = regenerator
                .regenerate(loader.show(), kind)
                .map(|()| loader.load(kind));
            let _ = tx.send(SessionEvent::Regenerated { kind, result });
        });
        Ok(())
    }

    /// Apply every queued event.
    pub fn pump(&mut self) -> Vec<SessionNotice> {
        let mut notices = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            if let Some(notice) = self.apply(event) {
                notices.push(notice);
            }
        }
        notices
    }

    /// Pump, then advance the clock.
    pub fn tick(&mut self, now: Instant) -> Vec<SessionNotice> {
        let notices = self.pump();
        self.coordinator.tick(now);
        notices
    }

    fn apply(&mut self, event: SessionEvent) -> Option<SessionNotice> {
        match event {
            SessionEvent::Loaded { ticket, outcome } => {
                self.coordinator.finish_load(ticket, outcome);
                None
            }
            SessionEvent::Regenerated { kind, result } => {
                match self.coordinator.complete_regeneration(kind, result) {
                    Ok(_) => Some(SessionNotice::Regenerated(kind)),
                    Err(e) => Some(SessionNotice::RegenerationFailed(e)),
                }
            }
            SessionEvent::Seek(time) => match self.coordinator.seek_to(time) {
                Ok(_) => None,
                Err(e) => {
                    log::debug!("seek to {time:.2}s rejected: {e}");
                    Some(SessionNotice::SeekRejected(e))
                }
            },
            SessionEvent::SeekToLine(index) => match self.coordinator.seek_to_line(index) {
                Ok(_) => None,
                Err(e) => {
                    log::debug!("seek to line {index} rejected: {e}");
                    Some(SessionNotice::SeekRejected(e))
                }
            },
        }
    }
}
