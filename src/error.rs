//! Error types shared across the crate.
//!
//! Per-track problems (fetch, decode, timeout) never cross the transport
//! fan-out: they end up as a `TrackState` plus a diagnostic string. The
//! enums here are what the individual components report to their callers.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::show::TrackKind;

/// Failure to read a track payload from an `AudioSource`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why a track ended up `Failed`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("{kind} audio could not be decoded: {message}")]
    Decode { kind: TrackKind, message: String },
    #[error("{kind} audio did not load within {}s", .after.as_secs())]
    TimedOut { kind: TrackKind, after: Duration },
}

#[derive(Debug, Error)]
pub enum TimingError {
    #[error("failed to read timing data {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed timing data in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum RegenerationError {
    #[error("no regeneration command configured")]
    NotConfigured,
    #[error("{0} is already regenerating")]
    AlreadyRunning(TrackKind),
    #[error("failed to start regeneration for {kind}: {source}")]
    Spawn {
        kind: TrackKind,
        #[source]
        source: io::Error,
    },
    #[error("regeneration of {kind} failed: {message}")]
    Failed { kind: TrackKind, message: String },
    #[error("regenerated {0} audio is missing")]
    Missing(TrackKind),
    #[error("regenerated audio is unusable: {0}")]
    Unusable(#[source] LoadError),
}

/// A transport request (`play`, `pause`, `seek`) that was refused without
/// touching any track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportRejected {
    #[error("controls are disabled while {0} is regenerating")]
    Regenerating(TrackKind),
    #[error("controls are disabled while tracks are loading")]
    Loading,
    #[error("no playable tracks")]
    NoReadyTracks,
    #[error("script line {0} does not exist")]
    NoSuchLine(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("show id must be a positive integer, got {0:?}")]
    ShowId(String),
    #[error("unknown track {0:?} (expected dialogue, sfx or music)")]
    TrackKind(String),
}

#[derive(Debug, Error)]
#[error("audio output unavailable: {0}")]
pub struct OutputError(pub String);
