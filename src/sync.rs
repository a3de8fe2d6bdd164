//! Synchronization of the track ensemble with the script.
//!
//! `SyncCoordinator` is the state machine; `RegenerationGate` blocks the
//! transport while tracks are being recreated; `Session` drives both from
//! worker-thread events; observers receive read-only `PlaybackState`s.

mod coordinator;
mod gate;
mod observer;
mod session;

pub use coordinator::{SessionState, SyncCoordinator};
pub use gate::RegenerationGate;
pub use observer::{
    PlaybackObserver, PlaybackState, Snapshot, SnapshotHandle, SnapshotObserver, TrackStatus,
};
pub use session::{SeekHandle, Session, SessionEvent, SessionNotice};

#[cfg(test)]
mod tests;
