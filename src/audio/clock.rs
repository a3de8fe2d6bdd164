//! The transport clock: one playback time for the whole ensemble.

use std::time::{Duration, Instant};

use crate::show::TrackKind;

use super::tracks::TrackSet;
use super::types::{AudioOutput, TrackState};

/// Which track defines global time, highest priority first.
///
/// Dialogue wins because line highlighting is derived from its timing.
pub const MASTER_PRIORITY: [TrackKind; 3] = [TrackKind::Dialogue, TrackKind::Sfx, TrackKind::Music];

/// One clock emission.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClockTick {
    pub time: f64,
    pub finished: bool,
}

#[derive(Debug)]
pub struct TransportClock {
    master: Option<TrackKind>,
    time: f64,
    finished: bool,
    interval: Duration,
    last_emit: Option<Instant>,
}

impl TransportClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            master: None,
            time: 0.0,
            finished: false,
            interval,
            last_emit: None,
        }
    }

    pub fn master(&self) -> Option<TrackKind> {
        self.master
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Pick the first Ready track in `MASTER_PRIORITY` order.
    ///
    /// Callers only do this while the transport is stopped; the master is
    /// never switched during playback.
    pub fn select_master<O: AudioOutput>(&mut self, tracks: &TrackSet<O>) -> Option<TrackKind> {
        let master = MASTER_PRIORITY
            .iter()
            .copied()
            .find(|&k| tracks.state(k) == TrackState::Ready);
        if master != self.master {
            log::info!(
                "master track: {}",
                master.map_or("none", TrackKind::as_str)
            );
        }
        self.master = master;
        master
    }

    /// Jump to `time` after a seek. Clears `finished`.
    pub fn reset_to(&mut self, time: f64) {
        self.time = time;
        self.finished = false;
        self.last_emit = None;
    }

    /// Read the master position now, ignoring the emission interval.
    pub fn capture<O: AudioOutput>(&mut self, tracks: &TrackSet<O>) -> ClockTick {
        if let Some(master) = self.master {
            if tracks.is_finished(master) {
                self.time = tracks.duration(master);
                self.finished = true;
            } else if let Some(pos) = tracks.position(master) {
                self.time = self.time.max(pos);
            }
        }
        ClockTick {
            time: self.time,
            finished: self.finished,
        }
    }

    /// Emit the master position if at least one interval passed since the
    /// previous emission. Time never goes backwards between seeks, and
    /// freezes at the master's duration once it ends.
    pub fn poll<O: AudioOutput>(&mut self, tracks: &TrackSet<O>, now: Instant) -> Option<ClockTick> {
        if self.finished {
            return None;
        }
        if let Some(last) = self.last_emit {
            if now.saturating_duration_since(last) < self.interval {
                return None;
            }
        }
        self.last_emit = Some(now);
        Some(self.capture(tracks))
    }
}
