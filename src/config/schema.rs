use std::path::PathBuf;

use serde::Deserialize;

use crate::show::TrackKind;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/playbill/config.toml` or `~/.config/playbill/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `PLAYBILL__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub store: StoreSettings,
    pub audio: AudioSettings,
    pub clock: ClockSettings,
    pub controls: ControlsSettings,
    pub regeneration: RegenerationSettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Directory holding `show_<id>_<track>.<ext>` and `show_<id>_timing.json`.
    pub root: PathBuf,
    /// Audio extensions to try, in order (case-insensitive, without dot).
    pub extensions: Vec<String>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/shows"),
            extensions: vec!["mp3".into(), "wav".into(), "ogg".into(), "flac".into()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Initial volumes, each in [0, 1].
    pub dialogue_volume: f32,
    pub sfx_volume: f32,
    pub music_volume: f32,
    /// Maximum drift between a track and the master before it is re-seeked.
    pub sync_tolerance_ms: u64,
    /// A load still outstanding after this long is marked failed.
    /// Set to 0 to wait forever.
    pub load_timeout_ms: u64,
}

impl AudioSettings {
    pub fn volume_for(&self, kind: TrackKind) -> f32 {
        match kind {
            TrackKind::Dialogue => self.dialogue_volume,
            TrackKind::Sfx => self.sfx_volume,
            TrackKind::Music => self.music_volume,
        }
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            dialogue_volume: 0.6,
            sfx_volume: 1.0,
            music_volume: 0.8,
            sync_tolerance_ms: 40,
            load_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    /// Minimum interval between two published playback states (milliseconds).
    pub tick_ms: u64,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self { tick_ms: 50 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
    /// Volume change per `+` / `-` press.
    pub volume_step: f32,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            scrub_seconds: 5,
            volume_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegenerationSettings {
    /// Program and arguments run to regenerate a track. `{show}` and
    /// `{track}` are substituted. Empty disables regeneration.
    ///
    /// Example: ["python", "backend/regenerate.py", "{show}", "{track}"]
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Whether the script cursor starts in "follow playback" mode.
    pub follow_playback: bool,

    /// The text rendered inside the top header box.
    pub header_text: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            follow_playback: true,
            header_text: " ~ curtain up ~ ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `env_logger` filter, e.g. "info" or "playbill=debug". `RUST_LOG` wins.
    pub level: String,
    /// Log file. Defaults to `$XDG_STATE_HOME/playbill/playbill.log`.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
