use std::time::{Duration, Instant};

use crate::audio::{AudioOutput, LoadOutcome, LoadTicket, TrackSet, TrackState, TransportClock};
use crate::config::{AudioSettings, ClockSettings};
use crate::error::{LoadError, RegenerationError, TransportRejected};
use crate::show::{SoundCue, TimingEntry, TimingReport, TrackKind};
use crate::timeline::TimelineIndex;

use super::gate::RegenerationGate;
use super::observer::{PlaybackObserver, PlaybackState, TrackStatus};

/// Where the session is, as seen from the outside.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing playable.
    #[default]
    Idle,
    /// A load or a regeneration is outstanding.
    Loading,
    /// At least one track is Ready and the transport has not started.
    Ready,
    Playing,
    Paused,
    /// The master track reached its end.
    Finished,
}

impl SessionState {
    pub fn label(self) -> &'static str {
        match self {
            SessionState::Idle => "no audio",
            SessionState::Loading => "loading",
            SessionState::Ready => "ready",
            SessionState::Playing => "playing",
            SessionState::Paused => "paused",
            SessionState::Finished => "finished",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Transport {
    Stopped,
    Playing,
    Paused,
    Finished,
}

/// The single place that mutates playback state.
///
/// Every public method is one turn: it applies the change to the tracks,
/// recomputes the derived state and notifies observers before returning.
pub struct SyncCoordinator<O: AudioOutput> {
    tracks: TrackSet<O>,
    clock: TransportClock,
    gate: RegenerationGate,
    lines: TimelineIndex<TimingEntry>,
    cues: TimelineIndex<SoundCue>,
    transport: Transport,
    sync_tolerance: f64,
    load_timeout: Option<Duration>,
    observers: Vec<Box<dyn PlaybackObserver>>,
}

impl<O: AudioOutput> SyncCoordinator<O> {
    pub fn new(output: O, audio: &AudioSettings, clock: &ClockSettings) -> Self {
        let load_timeout = match audio.load_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        Self {
            tracks: TrackSet::new(output, |kind| audio.volume_for(kind)),
            clock: TransportClock::new(Duration::from_millis(clock.tick_ms.max(1))),
            gate: RegenerationGate::default(),
            lines: TimelineIndex::default(),
            cues: TimelineIndex::default(),
            transport: Transport::Stopped,
            sync_tolerance: audio.sync_tolerance_ms as f64 / 1000.0,
            load_timeout,
            observers: Vec::new(),
        }
    }

    /// Register an observer and bring it up to date immediately.
    pub fn add_observer(&mut self, mut observer: Box<dyn PlaybackObserver>) {
        for kind in TrackKind::ALL {
            observer.on_track_availability(kind, &self.track_status(kind));
            observer.on_regeneration(kind, self.gate.is_regenerating(kind));
        }
        observer.on_playback_state(&self.playback_state());
        self.observers.push(observer);
    }

    pub fn state(&self) -> SessionState {
        if self.gate.is_busy() || self.tracks.is_loading() {
            return SessionState::Loading;
        }
        if self.tracks.ready_count() == 0 {
            return SessionState::Idle;
        }
        match self.transport {
            Transport::Stopped => SessionState::Ready,
            Transport::Playing => SessionState::Playing,
            Transport::Paused => SessionState::Paused,
            Transport::Finished => SessionState::Finished,
        }
    }

    pub fn tracks(&self) -> &TrackSet<O> {
        &self.tracks
    }

    pub fn lines(&self) -> &TimelineIndex<TimingEntry> {
        &self.lines
    }

    pub fn master(&self) -> Option<TrackKind> {
        self.clock.master()
    }

    pub fn current_time(&self) -> f64 {
        self.clock.time()
    }

    pub fn track_status(&self, kind: TrackKind) -> TrackStatus {
        TrackStatus {
            state: self.tracks.state(kind),
            volume: self.tracks.volume(kind),
            duration: self.tracks.duration(kind),
            diagnostic: self.tracks.diagnostic(kind).map(str::to_string),
        }
    }

    /// Derive the published state from the clock and the timelines.
    pub fn playback_state(&self) -> PlaybackState {
        let time = self.clock.time();
        let line = self.lines.lookup(time);
        PlaybackState {
            state: self.state(),
            master: self.master(),
            current_time: time,
            duration: self.tracks.max_duration(),
            is_playing: self.transport == Transport::Playing,
            finished: self.transport == Transport::Finished,
            active_line: line,
            active_character: line
                .and_then(|i| self.lines.get(i))
                .map(|e| e.character.clone())
                .filter(|c| !c.is_empty()),
            active_effect: self.cues.entry_at(time).map(|c| c.effect.clone()),
        }
    }

    /// Start a load for `kind`. Active playback is paused first.
    pub fn begin_load(&mut self, kind: TrackKind) -> LoadTicket {
        self.halt();
        let ticket = self.tracks.begin_load(kind);
        self.notify_track(kind);
        self.publish();
        ticket
    }

    /// Install a load result. Stale tickets are ignored and yield `None`.
    pub fn finish_load(&mut self, ticket: LoadTicket, outcome: LoadOutcome) -> Option<TrackState> {
        let state = self
            .tracks
            .finish_load(ticket, outcome, self.clock.time())?;
        self.notify_track(ticket.kind);
        self.settle();
        Some(state)
    }

    /// Replace the timing data. `None` clears both timelines.
    pub fn set_timing(&mut self, report: Option<TimingReport>) {
        let report = report.unwrap_or_default();
        self.lines = TimelineIndex::new(report.dialogue_timing);
        self.cues = TimelineIndex::new(report.sound_effect_timing);
        if self.lines.is_empty() {
            log::info!("timeline: no script lines, {} sound cues", self.cues.len());
        } else {
            log::info!(
                "timeline: {} lines, {} sound cues",
                self.lines.len(),
                self.cues.len()
            );
        }
        self.publish();
    }

    pub fn play(&mut self) -> Result<(), TransportRejected> {
        self.check_transport()?;
        match self.transport {
            Transport::Playing => return Ok(()),
            Transport::Finished => {
                let time = self.tracks.seek(0.0);
                self.clock.reset_to(time);
            }
            Transport::Stopped | Transport::Paused => {}
        }
        let started = self.tracks.play();
        self.transport = Transport::Playing;
        log::debug!("play: {started} tracks from {:.2}s", self.clock.time());
        self.publish();
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), TransportRejected> {
        self.check_transport()?;
        self.halt();
        self.publish();
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<(), TransportRejected> {
        if self.transport == Transport::Playing {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Move every track to `time` (clamped) and publish right away.
    /// Returns the time actually sought to.
    pub fn seek_to(&mut self, time: f64) -> Result<f64, TransportRejected> {
        self.check_transport()?;
        let time = self.tracks.seek(time);
        self.clock.reset_to(time);
        if self.transport == Transport::Finished {
            self.transport = Transport::Paused;
        }
        log::debug!("seek to {time:.2}s");
        self.publish();
        Ok(time)
    }

    pub fn seek_by(&mut self, delta: f64) -> Result<f64, TransportRejected> {
        self.check_transport()?;
        if self.transport == Transport::Playing {
            self.clock.capture(&self.tracks);
        }
        self.seek_to(self.current_time() + delta)
    }

    /// Jump to the start of a script line.
    pub fn seek_to_line(&mut self, index: usize) -> Result<f64, TransportRejected> {
        self.check_transport()?;
        let start = self
            .lines
            .get(index)
            .map(|e| e.start_time)
            .ok_or(TransportRejected::NoSuchLine(index))?;
        self.seek_to(start)
    }

    /// Not a transport action: allowed in every state.
    pub fn set_volume(&mut self, kind: TrackKind, volume: f32) -> Option<f32> {
        let applied = self.tracks.set_volume(kind, volume)?;
        self.notify_track(kind);
        Some(applied)
    }

    /// Mark `kind` as regenerating. Playback pauses and transport stays
    /// disabled until every regeneration completed.
    pub fn begin_regeneration(&mut self, kind: TrackKind) -> Result<(), RegenerationError> {
        if !self.gate.begin(kind) {
            return Err(RegenerationError::AlreadyRunning(kind));
        }
        self.halt();
        log::info!("{kind} regeneration started");
        self.notify_regeneration(kind);
        self.publish();
        Ok(())
    }

    /// Finish a regeneration with the new audio, already decoded through
    /// `decode_payload` by the worker (or the regenerator's error).
    ///
    /// Only playable audio supersedes the track, together with any
    /// outstanding load for `kind`. A missing or undecodable result is a
    /// failed regeneration: the previous track stays in place and the
    /// error is handed back.
    pub fn complete_regeneration(
        &mut self,
        kind: TrackKind,
        result: Result<LoadOutcome, RegenerationError>,
    ) -> Result<Option<TrackState>, RegenerationError> {
        if !self.gate.complete(kind) {
            log::warn!("ignoring {kind} regeneration result: none in flight");
            return Ok(None);
        }
        self.notify_regeneration(kind);

        let result = result.and_then(|outcome| match outcome {
            LoadOutcome::Ready(_) => Ok(outcome),
            LoadOutcome::Empty => Err(RegenerationError::Missing(kind)),
            LoadOutcome::Failed(e) => Err(RegenerationError::Unusable(e)),
        });
        match result {
            Ok(outcome) => {
                log::info!("{kind} regenerated");
                let ticket = self.tracks.begin_load(kind);
                Ok(self.finish_load(ticket, outcome))
            }
            Err(e) => {
                log::warn!("{e}");
                self.publish();
                Err(e)
            }
        }
    }

    /// Advance the session to `now`: expire stalled loads, follow the
    /// master clock, keep the other tracks aligned and detect the end.
    pub fn tick(&mut self, now: Instant) {
        self.expire_stalled(now);
        if self.transport != Transport::Playing {
            return;
        }
        let Some(tick) = self.clock.poll(&self.tracks, now) else {
            return;
        };
        if tick.finished {
            self.tracks.pause();
            self.transport = Transport::Finished;
            log::info!("finished at {:.2}s", tick.time);
        } else if let Some(master) = self.clock.master() {
            self.tracks.realign(master, tick.time, self.sync_tolerance);
        }
        self.publish();
    }

    fn check_transport(&self) -> Result<(), TransportRejected> {
        if let Some(kind) = self.gate.first_busy() {
            return Err(TransportRejected::Regenerating(kind));
        }
        if self.tracks.is_loading() {
            return Err(TransportRejected::Loading);
        }
        if self.tracks.ready_count() == 0 {
            return Err(TransportRejected::NoReadyTracks);
        }
        Ok(())
    }

    /// Pause if playing, keeping the exact position.
    fn halt(&mut self) {
        if self.transport != Transport::Playing {
            return;
        }
        let tick = self.clock.capture(&self.tracks);
        self.tracks.pause();
        self.transport = if tick.finished {
            Transport::Finished
        } else {
            Transport::Paused
        };
    }

    /// Recompute derived state once nothing is outstanding.
    fn settle(&mut self) {
        if !self.tracks.is_loading() {
            let master_ready = self
                .clock
                .master()
                .is_some_and(|m| self.tracks.state(m) == TrackState::Ready);
            if !master_ready {
                self.clock.select_master(&self.tracks);
            }
            let time = self.tracks.clamp_time(self.clock.time());
            if time != self.clock.time() {
                self.clock.reset_to(time);
            }
            if self.tracks.ready_count() == 0 {
                self.transport = Transport::Stopped;
            }
        }
        self.publish();
    }

    fn expire_stalled(&mut self, now: Instant) {
        let Some(timeout) = self.load_timeout else {
            return;
        };
        let stalled = self.tracks.stalled(now, timeout);
        if stalled.is_empty() {
            return;
        }
        for ticket in stalled {
            let reason = LoadError::TimedOut {
                kind: ticket.kind,
                after: timeout,
            };
            if self.tracks.expire(ticket, reason) {
                self.notify_track(ticket.kind);
            }
        }
        self.settle();
    }

    fn publish(&mut self) {
        let state = self.playback_state();
        for observer in &mut self.observers {
            observer.on_playback_state(&state);
        }
    }

    fn notify_track(&mut self, kind: TrackKind) {
        let status = self.track_status(kind);
        for observer in &mut self.observers {
            observer.on_track_availability(kind, &status);
        }
    }

    fn notify_regeneration(&mut self, kind: TrackKind) {
        let in_flight = self.gate.is_regenerating(kind);
        for observer in &mut self.observers {
            observer.on_regeneration(kind, in_flight);
        }
    }
}
