//! `rodio` implementation of the playback seams.
//!
//! Each track gets its own `Sink` on the shared output mixer, fed from an
//! in-memory `SamplesBuffer` so seeking never touches the disk.

use std::time::Duration;

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::error::OutputError;
use crate::show::TrackKind;

use super::types::{AudioOutput, DecodedAudio, PlaybackSink, secs_to_duration};

pub struct RodioOutput {
    stream: OutputStream,
}

impl RodioOutput {
    /// Open the default output device.
    pub fn open_default() -> Result<Self, OutputError> {
        let mut stream =
            OutputStreamBuilder::open_default_stream().map_err(|e| OutputError(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped, which would land on the TUI.
        stream.log_on_drop(false);
        Ok(Self { stream })
    }
}

impl AudioOutput for RodioOutput {
    type Sink = RodioSink;

    /// Create a paused `Sink` for `audio`, positioned at the start.
    fn open(&self, kind: TrackKind, audio: DecodedAudio) -> RodioSink {
        log::debug!(
            "opening {kind} sink: {} ch, {} Hz, {:.2}s",
            audio.channels,
            audio.sample_rate,
            audio.duration_secs()
        );
        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();
        let track = RodioSink {
            kind,
            duration: secs_to_duration(audio.duration_secs()),
            audio,
            sink,
        };
        track.sink.append(track.buffer());
        track
    }
}

pub struct RodioSink {
    kind: TrackKind,
    duration: Duration,
    /// Kept so the track can be queued again after it played out.
    audio: DecodedAudio,
    sink: Sink,
}

impl RodioSink {
    fn buffer(&self) -> SamplesBuffer {
        SamplesBuffer::new(
            self.audio.channels,
            self.audio.sample_rate,
            self.audio.samples.clone(),
        )
    }
}

impl PlaybackSink for RodioSink {
    fn play(&self) {
        self.sink.play();
    }

    fn pause(&self) {
        self.sink.pause();
    }

    fn seek(&self, position: Duration) {
        // A finished sink has dropped its source; seeking back needs it again.
        if self.sink.empty() {
            if position >= self.duration {
                return;
            }
            self.sink.append(self.buffer());
        }
        if let Err(e) = self.sink.try_seek(position) {
            log::warn!("{} seek to {:.2}s failed: {e}", self.kind, position.as_secs_f64());
        }
    }

    fn set_volume(&self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }
}

impl Drop for RodioSink {
    fn drop(&mut self) {
        self.sink.stop();
    }
}
