use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ParseError;

/// Identifier of a show in the store. Always positive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ShowId(NonZeroU32);

impl ShowId {
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl FromStr for ShowId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| ParseError::ShowId(s.to_string()))
    }
}

impl fmt::Display for ShowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the three independently generated tracks of a show.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Dialogue,
    Sfx,
    Music,
}

impl TrackKind {
    /// Fixed iteration order for every fan-out.
    pub const ALL: [TrackKind; 3] = [TrackKind::Dialogue, TrackKind::Sfx, TrackKind::Music];

    pub fn as_str(self) -> &'static str {
        match self {
            TrackKind::Dialogue => "dialogue",
            TrackKind::Sfx => "sfx",
            TrackKind::Music => "music",
        }
    }

    /// Position of this kind in `TrackKind::ALL`.
    pub fn index(self) -> usize {
        match self {
            TrackKind::Dialogue => 0,
            TrackKind::Sfx => 1,
            TrackKind::Music => 2,
        }
    }

    /// The kind after this one in `ALL`, wrapping around.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

impl FromStr for TrackKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dialogue" => Ok(TrackKind::Dialogue),
            "sfx" => Ok(TrackKind::Sfx),
            "music" => Ok(TrackKind::Music),
            _ => Err(ParseError::TrackKind(s.to_string())),
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One spoken line with its position in the dialogue track.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimingEntry {
    pub character: String,
    pub line: String,
    #[serde(default)]
    pub emotion: String,
    pub start_time: f64,
    pub end_time: f64,
}

/// A sound effect and the span of the show it covers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SoundCue {
    pub effect: String,
    pub start_time: f64,
    pub end_time: f64,
}

/// Output of the timing analysis for one show.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimingReport {
    pub dialogue_timing: Vec<TimingEntry>,
    pub sound_effect_timing: Vec<SoundCue>,
}
