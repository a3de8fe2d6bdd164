//! Audio engine: loading, the track ensemble and the transport clock.
//!
//! Tracks are fetched and decoded off the event loop (`loader`), owned by a
//! `TrackSet` (`tracks`) that fans transport commands out to `rodio` sinks
//! (`sink`), and timed by a `TransportClock` (`clock`) bound to one master
//! track.

mod clock;
mod loader;
mod sink;
mod tracks;
mod types;

pub use clock::{ClockTick, MASTER_PRIORITY, TransportClock};
pub use loader::{LoadOutcome, TrackLoader, decode_payload};
pub use sink::{RodioOutput, RodioSink};
pub use tracks::{LoadTicket, TrackSet};
pub use types::{AudioOutput, DecodedAudio, PlaybackSink, TrackState};

#[cfg(test)]
pub(crate) mod testing;
