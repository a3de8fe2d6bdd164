//! The ensemble of named tracks and its transport fan-out.
//!
//! `TrackSet` is the only owner of the sinks. Every transport call walks the
//! tracks in `TrackKind::ALL` order and instructs the Ready ones; Empty and
//! Failed tracks are skipped so a show without music still plays.

use std::time::{Duration, Instant};

use crate::error::LoadError;
use crate::show::TrackKind;

use super::loader::LoadOutcome;
use super::types::{AudioOutput, PlaybackSink, TrackState, secs_to_duration};

/// Identifies one `begin_load` call. Results carrying an older generation
/// are discarded.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub kind: TrackKind,
    pub generation: u64,
}

pub struct Track<S> {
    kind: TrackKind,
    sink: Option<S>,
    duration: f64,
    volume: f32,
    state: TrackState,
    generation: u64,
    loading_since: Option<Instant>,
    diagnostic: Option<String>,
}

impl<S: PlaybackSink> Track<S> {
    fn new(kind: TrackKind, volume: f32) -> Self {
        Self {
            kind,
            sink: None,
            duration: 0.0,
            volume: volume.clamp(0.0, 1.0),
            state: TrackState::Unloaded,
            generation: 0,
            loading_since: None,
            diagnostic: None,
        }
    }

    /// The sink, only while the track is Ready.
    fn ready_sink(&self) -> Option<&S> {
        match self.state {
            TrackState::Ready => self.sink.as_ref(),
            _ => None,
        }
    }

    fn release(&mut self) {
        self.sink = None;
        self.duration = 0.0;
    }
}

pub struct TrackSet<O: AudioOutput> {
    output: O,
    tracks: Vec<Track<O::Sink>>,
}

impl<O: AudioOutput> TrackSet<O> {
    /// Build an empty set; `volume_for` gives each track's initial volume.
    pub fn new(output: O, volume_for: impl Fn(TrackKind) -> f32) -> Self {
        let tracks = TrackKind::ALL
            .iter()
            .map(|&kind| Track::new(kind, volume_for(kind)))
            .collect();
        Self { output, tracks }
    }

    fn track(&self, kind: TrackKind) -> &Track<O::Sink> {
        &self.tracks[kind.index()]
    }

    fn track_mut(&mut self, kind: TrackKind) -> &mut Track<O::Sink> {
        &mut self.tracks[kind.index()]
    }

    fn ready(&self) -> impl Iterator<Item = (&Track<O::Sink>, &O::Sink)> {
        self.tracks
            .iter()
            .filter_map(|t| t.ready_sink().map(|s| (t, s)))
    }

    /// Start (or restart) a load for `kind`, superseding any outstanding one.
    pub fn begin_load(&mut self, kind: TrackKind) -> LoadTicket {
        let track = self.track_mut(kind);
        // The old buffer stays attached until the replacement arrives, but silent.
        if let Some(sink) = track.sink.as_ref() {
            sink.pause();
        }
        track.generation += 1;
        track.state = TrackState::Loading;
        track.loading_since = Some(Instant::now());
        log::debug!("{kind} load #{} started", track.generation);
        LoadTicket {
            kind,
            generation: track.generation,
        }
    }

    /// Install the outcome of `ticket`, positioning a new sink at `at`.
    ///
    /// Returns the new state, or `None` if the ticket was superseded.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        outcome: LoadOutcome,
        at: f64,
    ) -> Option<TrackState> {
        let current = self.track(ticket.kind).generation;
        if ticket.generation != current {
            log::debug!(
                "discarding stale {} load #{} (current #{current})",
                ticket.kind,
                ticket.generation
            );
            return None;
        }

        let track = &mut self.tracks[ticket.kind.index()];
        track.loading_since = None;
        // Drops (and stops) the previous sink, if any.
        track.release();
        track.state = outcome.state();
        match outcome {
            LoadOutcome::Ready(audio) => {
                track.duration = audio.duration_secs();
                track.diagnostic = None;
                let sink = self.output.open(ticket.kind, audio);
                sink.set_volume(track.volume);
                sink.seek(secs_to_duration(at.min(track.duration)));
                track.sink = Some(sink);
            }
            LoadOutcome::Empty => {
                track.diagnostic = None;
            }
            LoadOutcome::Failed(err) => {
                track.diagnostic = Some(err.to_string());
            }
        }
        Some(track.state)
    }

    /// Give up on `ticket` if it is still the current load of its track.
    pub fn expire(&mut self, ticket: LoadTicket, reason: LoadError) -> bool {
        let track = self.track_mut(ticket.kind);
        if track.generation != ticket.generation || track.state != TrackState::Loading {
            return false;
        }
        log::warn!("{reason}");
        // Bump so the late result is thrown away.
        track.generation += 1;
        track.loading_since = None;
        track.release();
        track.state = TrackState::Failed;
        track.diagnostic = Some(reason.to_string());
        true
    }

    /// Loads that have been outstanding for longer than `timeout` at `now`.
    pub fn stalled(&self, now: Instant, timeout: Duration) -> Vec<LoadTicket> {
        self.tracks
            .iter()
            .filter(|t| t.state == TrackState::Loading)
            .filter(|t| {
                t.loading_since
                    .is_some_and(|since| now.saturating_duration_since(since) >= timeout)
            })
            .map(|t| LoadTicket {
                kind: t.kind,
                generation: t.generation,
            })
            .collect()
    }

    /// Play every Ready track. Returns how many were instructed.
    pub fn play(&self) -> usize {
        let mut instructed = 0;
        for (_, sink) in self.ready() {
            sink.play();
            instructed += 1;
        }
        instructed
    }

    /// Pause every Ready track. Returns how many were instructed.
    pub fn pause(&self) -> usize {
        let mut instructed = 0;
        for (_, sink) in self.ready() {
            sink.pause();
            instructed += 1;
        }
        instructed
    }

    /// Clamp `time` to `[0, max_duration]` and move every Ready track there.
    ///
    /// A track shorter than the target is parked at its own end.
    pub fn seek(&self, time: f64) -> f64 {
        let target = self.clamp_time(time);
        for (track, sink) in self.ready() {
            sink.seek(secs_to_duration(target.min(track.duration)));
        }
        target
    }

    pub fn clamp_time(&self, time: f64) -> f64 {
        if time.is_nan() {
            return 0.0;
        }
        time.clamp(0.0, self.max_duration())
    }

    /// Set one track's volume, clamped to [0, 1]. NaN is ignored.
    pub fn set_volume(&mut self, kind: TrackKind, volume: f32) -> Option<f32> {
        if volume.is_nan() {
            return None;
        }
        let track = self.track_mut(kind);
        track.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = track.sink.as_ref() {
            sink.set_volume(track.volume);
        }
        Some(track.volume)
    }

    /// Re-seek Ready tracks that drifted more than `tolerance` away from the
    /// master's time `at`. Returns how many were corrected.
    pub fn realign(&self, master: TrackKind, at: f64, tolerance: f64) -> usize {
        let mut corrected = 0;
        for (track, sink) in self.ready() {
            if track.kind == master || at >= track.duration {
                continue;
            }
            let drift = (sink.position().as_secs_f64() - at).abs();
            if drift > tolerance {
                log::debug!("{} drifted {:.0} ms, realigning", track.kind, drift * 1000.0);
                sink.seek(secs_to_duration(at));
                corrected += 1;
            }
        }
        corrected
    }

    pub fn max_duration(&self) -> f64 {
        self.ready()
            .map(|(t, _)| t.duration)
            .fold(0.0, f64::max)
    }

    pub fn ready_count(&self) -> usize {
        self.ready().count()
    }

    pub fn is_loading(&self) -> bool {
        self.tracks.iter().any(|t| t.state == TrackState::Loading)
    }

    pub fn state(&self, kind: TrackKind) -> TrackState {
        self.track(kind).state
    }

    pub fn volume(&self, kind: TrackKind) -> f32 {
        self.track(kind).volume
    }

    pub fn duration(&self, kind: TrackKind) -> f64 {
        self.track(kind).duration
    }

    pub fn diagnostic(&self, kind: TrackKind) -> Option<&str> {
        self.track(kind).diagnostic.as_deref()
    }

    /// Current position of a Ready track, in seconds.
    pub fn position(&self, kind: TrackKind) -> Option<f64> {
        self.track(kind)
            .ready_sink()
            .map(|s| s.position().as_secs_f64())
    }

    /// Whether a Ready track has played to its end.
    pub fn is_finished(&self, kind: TrackKind) -> bool {
        let track = self.track(kind);
        track.ready_sink().is_some_and(|s| {
            s.is_finished() || s.position().as_secs_f64() >= track.duration
        })
    }
}
