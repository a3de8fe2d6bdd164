//! Test doubles for the audio seams: an output that records what the
//! ensemble told each sink, an in-memory audio source and a WAV encoder.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::FetchError;
use crate::show::{AudioPayload, AudioSource, ShowId, TrackKind};

use super::types::{AudioOutput, DecodedAudio, PlaybackSink};

#[derive(Debug, Default)]
pub(crate) struct FakeSinkState {
    pub playing: bool,
    pub position: f64,
    pub duration: f64,
    pub volume: f32,
    pub finished: bool,
    pub released: bool,
    pub plays: usize,
    pub seeks: Vec<f64>,
}

pub(crate) type SinkProbe = Rc<RefCell<FakeSinkState>>;

/// Let playback time pass on one sink.
pub(crate) fn advance(probe: &SinkProbe, secs: f64) {
    let mut s = probe.borrow_mut();
    s.position += secs;
    if s.position >= s.duration {
        s.position = s.duration;
        s.finished = true;
        s.playing = false;
    }
}

#[derive(Clone, Default)]
pub(crate) struct FakeOutput {
    sinks: Rc<RefCell<HashMap<TrackKind, SinkProbe>>>,
    opened: Rc<Cell<usize>>,
}

impl FakeOutput {
    /// The most recently opened sink for `kind`.
    pub fn probe(&self, kind: TrackKind) -> SinkProbe {
        self.sinks
            .borrow()
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| panic!("no sink opened for {kind}"))
    }

    pub fn opened(&self) -> usize {
        self.opened.get()
    }
}

impl AudioOutput for FakeOutput {
    type Sink = FakeSink;

    fn open(&self, kind: TrackKind, audio: DecodedAudio) -> FakeSink {
        let probe = Rc::new(RefCell::new(FakeSinkState {
            duration: audio.duration_secs(),
            volume: 1.0,
            ..FakeSinkState::default()
        }));
        self.sinks.borrow_mut().insert(kind, probe.clone());
        self.opened.set(self.opened.get() + 1);
        FakeSink { probe }
    }
}

pub(crate) struct FakeSink {
    probe: SinkProbe,
}

impl PlaybackSink for FakeSink {
    fn play(&self) {
        let mut s = self.probe.borrow_mut();
        s.playing = true;
        s.plays += 1;
    }

    fn pause(&self) {
        self.probe.borrow_mut().playing = false;
    }

    fn seek(&self, position: Duration) {
        let mut s = self.probe.borrow_mut();
        s.position = position.as_secs_f64().min(s.duration);
        s.finished = false;
        let pos = s.position;
        s.seeks.push(pos);
    }

    fn set_volume(&self, volume: f32) {
        self.probe.borrow_mut().volume = volume;
    }

    fn position(&self) -> Duration {
        Duration::from_secs_f64(self.probe.borrow().position)
    }

    fn is_finished(&self) -> bool {
        self.probe.borrow().finished
    }
}

impl Drop for FakeSink {
    fn drop(&mut self) {
        self.probe.borrow_mut().released = true;
    }
}

/// Silent mono audio lasting `secs` (100 Hz, so cheap to build).
pub(crate) fn seconds(secs: f64) -> DecodedAudio {
    DecodedAudio {
        channels: 1,
        sample_rate: 100,
        samples: vec![0.0; (secs * 100.0).round() as usize],
    }
}

/// A 16-bit PCM mono WAV file of `secs` seconds of silence.
pub(crate) fn wav_bytes(secs: f64) -> Vec<u8> {
    let sample_rate: u32 = 8_000;
    let frames = (secs * sample_rate as f64).round() as u32;
    let data_len = frames * 2;

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + data_len as usize, 0);
    out
}

pub(crate) fn wav_payload(secs: f64) -> AudioPayload {
    AudioPayload {
        bytes: wav_bytes(secs),
        content_type: "audio/wav".to_string(),
    }
}

/// Audio source backed by a map; missing kinds are "not found".
#[derive(Default)]
pub(crate) struct MemorySource {
    payloads: Mutex<HashMap<TrackKind, AudioPayload>>,
}

impl MemorySource {
    pub fn with(tracks: &[(TrackKind, AudioPayload)]) -> Self {
        Self {
            payloads: Mutex::new(tracks.iter().cloned().collect()),
        }
    }

    pub fn set(&self, kind: TrackKind, payload: AudioPayload) {
        self.payloads.lock().unwrap().insert(kind, payload);
    }
}

impl AudioSource for MemorySource {
    fn fetch_audio(&self, _show: ShowId, kind: TrackKind) -> Result<Option<AudioPayload>, FetchError> {
        Ok(self.payloads.lock().unwrap().get(&kind).cloned())
    }
}
