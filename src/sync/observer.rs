use std::sync::{Arc, Mutex};

use crate::audio::TrackState;
use crate::show::TrackKind;

use super::coordinator::SessionState;

/// What observers see after every turn of the coordinator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    pub state: SessionState,
    /// Track the clock follows.
    pub master: Option<TrackKind>,
    /// Global playback time in seconds, taken from the master track.
    pub current_time: f64,
    /// Longest Ready track; the upper bound for seeks.
    pub duration: f64,
    pub is_playing: bool,
    pub finished: bool,
    /// Index into the coordinator's line timeline.
    pub active_line: Option<usize>,
    pub active_character: Option<String>,
    pub active_effect: Option<String>,
}

/// Availability of one track as published to observers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackStatus {
    pub state: TrackState,
    pub volume: f32,
    pub duration: f64,
    pub diagnostic: Option<String>,
}

/// Read-only view of the session.
///
/// Observers never get a handle on the tracks themselves; everything they
/// want to change goes back through the coordinator.
pub trait PlaybackObserver {
    fn on_playback_state(&mut self, state: &PlaybackState);

    fn on_track_availability(&mut self, _kind: TrackKind, _status: &TrackStatus) {}

    fn on_regeneration(&mut self, _kind: TrackKind, _in_flight: bool) {}
}

/// Latest published values, for a front-end that draws on its own schedule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub playback: PlaybackState,
    pub tracks: [TrackStatus; 3],
    pub regenerating: [bool; 3],
}

impl Snapshot {
    pub fn track(&self, kind: TrackKind) -> &TrackStatus {
        &self.tracks[kind.index()]
    }

    pub fn is_regenerating(&self, kind: TrackKind) -> bool {
        self.regenerating[kind.index()]
    }
}

pub type SnapshotHandle = Arc<Mutex<Snapshot>>;

/// Copies every notification into a shared `Snapshot`.
pub struct SnapshotObserver {
    handle: SnapshotHandle,
}

impl SnapshotObserver {
    pub fn new(handle: SnapshotHandle) -> Self {
        Self { handle }
    }
}

impl PlaybackObserver for SnapshotObserver {
    fn on_playback_state(&mut self, state: &PlaybackState) {
        if let Ok(mut snap) = self.handle.lock() {
            snap.playback = state.clone();
        }
    }

    fn on_track_availability(&mut self, kind: TrackKind, status: &TrackStatus) {
        if let Ok(mut snap) = self.handle.lock() {
            snap.tracks[kind.index()] = status.clone();
        }
    }

    fn on_regeneration(&mut self, kind: TrackKind, in_flight: bool) {
        if let Ok(mut snap) = self.handle.lock() {
            snap.regenerating[kind.index()] = in_flight;
        }
    }
}
