//! Fetching and decoding a single track.
//!
//! The loader runs on worker threads; it only produces a `LoadOutcome`.
//! Sinks are opened later by the `TrackSet` on the event loop thread, so a
//! decode failure never leaves a half-built playable resource behind.

use std::io::Cursor;
use std::sync::Arc;

use rodio::{Decoder, Source};

use crate::error::LoadError;
use crate::show::{AudioPayload, AudioSource, ShowId, TrackKind};

use super::types::{DecodedAudio, TrackState};

/// Result of one load attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Ready(DecodedAudio),
    Empty,
    Failed(LoadError),
}

impl LoadOutcome {
    pub fn state(&self) -> TrackState {
        match self {
            LoadOutcome::Ready(_) => TrackState::Ready,
            LoadOutcome::Empty => TrackState::Empty,
            LoadOutcome::Failed(_) => TrackState::Failed,
        }
    }
}

pub struct TrackLoader {
    show: ShowId,
    source: Arc<dyn AudioSource>,
}

impl TrackLoader {
    pub fn new(show: ShowId, source: Arc<dyn AudioSource>) -> Self {
        Self { show, source }
    }

    pub fn show(&self) -> ShowId {
        self.show
    }

    /// Fetch the raw payload. Retrieval errors count as "not present".
    pub fn fetch(&self, kind: TrackKind) -> Option<AudioPayload> {
        match self.source.fetch_audio(self.show, kind) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("show {}: {kind} unavailable: {e}", self.show);
                None
            }
        }
    }

    /// Fetch and decode. Blocks; call from a worker thread.
    pub fn load(&self, kind: TrackKind) -> LoadOutcome {
        decode_payload(kind, self.fetch(kind))
    }
}

/// Decode a fetched payload into a playable buffer.
pub fn decode_payload(kind: TrackKind, payload: Option<AudioPayload>) -> LoadOutcome {
    let Some(payload) = payload else {
        log::info!("no {kind} track");
        return LoadOutcome::Empty;
    };
    if payload.bytes.is_empty() {
        log::info!("empty {kind} payload");
        return LoadOutcome::Empty;
    }

    match decode_bytes(payload.bytes) {
        Ok(audio) if audio.frames() == 0 => {
            log::info!("{kind} decoded to silence of zero length");
            LoadOutcome::Empty
        }
        Ok(audio) => {
            log::info!("{kind} ready: {:.2}s", audio.duration_secs());
            LoadOutcome::Ready(audio)
        }
        Err(message) => {
            let err = LoadError::Decode { kind, message };
            log::warn!("{err} (content type {})", payload.content_type);
            LoadOutcome::Failed(err)
        }
    }
}

fn decode_bytes(bytes: Vec<u8>) -> Result<DecodedAudio, String> {
    let decoder = Decoder::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    if channels == 0 || sample_rate == 0 {
        return Err(format!("invalid stream layout ({channels} ch, {sample_rate} Hz)"));
    }
    let samples: Vec<f32> = decoder.collect();
    Ok(DecodedAudio {
        channels,
        sample_rate,
        samples,
    })
}
