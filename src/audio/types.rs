//! Audio-related small types and the seams to the playback engine.
//!
//! `AudioOutput` and `PlaybackSink` are implemented by `rodio` in
//! production and by an in-memory fake in tests.

use std::time::Duration;

use crate::show::TrackKind;

/// Availability of one track.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Never requested.
    #[default]
    Unloaded,
    /// A fetch/decode is outstanding.
    Loading,
    /// Decoded and attached to a sink.
    Ready,
    /// Malformed audio or a stalled load.
    Failed,
    /// The show has no such track (missing or zero-length payload).
    Empty,
}

impl TrackState {
    pub fn label(self) -> &'static str {
        match self {
            TrackState::Unloaded => "unloaded",
            TrackState::Loading => "loading",
            TrackState::Ready => "ready",
            TrackState::Failed => "failed",
            TrackState::Empty => "absent",
        }
    }
}

/// Fully decoded interleaved PCM.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// A playable handle for one decoded track.
///
/// All calls are fire-and-forget. Dropping the sink releases it.
pub trait PlaybackSink {
    fn play(&self);
    fn pause(&self);
    fn seek(&self, position: Duration);
    fn set_volume(&self, volume: f32);
    fn position(&self) -> Duration;
    /// True once the sink has played its whole buffer.
    fn is_finished(&self) -> bool;
}

/// The audio engine that turns decoded buffers into paused sinks.
pub trait AudioOutput {
    type Sink: PlaybackSink;

    fn open(&self, kind: TrackKind, audio: DecodedAudio) -> Self::Sink;
}

pub(crate) fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}
