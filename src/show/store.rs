use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{RegenerationSettings, StoreSettings};
use crate::error::{FetchError, RegenerationError, TimingError};

use super::model::{ShowId, TimingReport, TrackKind};

/// Raw bytes of one track as handed out by the retrieval collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Audio retrieval. `Ok(None)` means the show has no such track.
pub trait AudioSource: Send + Sync {
    fn fetch_audio(&self, show: ShowId, kind: TrackKind) -> Result<Option<AudioPayload>, FetchError>;
}

/// Timing provider. `Ok(None)` means timing analysis has not been run.
pub trait TimingProvider {
    fn timing_data(&self, show: ShowId) -> Result<Option<TimingReport>, TimingError>;
}

/// Server-side recreation of one track. Blocks until the new audio exists.
pub trait Regenerator: Send + Sync {
    fn regenerate(&self, show: ShowId, kind: TrackKind) -> Result<(), RegenerationError>;
}

/// A directory of generated show files.
///
/// Layout: `show_<id>_<track>.<ext>` for audio (first matching extension in
/// the configured order wins) and `show_<id>_timing.json` for the timing report.
#[derive(Debug, Clone)]
pub struct ShowStore {
    root: PathBuf,
    extensions: Vec<String>,
}

impl ShowStore {
    pub fn new(settings: &StoreSettings) -> Self {
        let extensions = settings
            .extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            root: settings.root.clone(),
            extensions,
        }
    }

    /// Path of the first existing audio file for `kind`, if any.
    pub fn audio_path(&self, show: ShowId, kind: TrackKind) -> Option<PathBuf> {
        self.extensions
            .iter()
            .map(|ext| self.root.join(format!("show_{show}_{kind}.{ext}")))
            .find(|p| p.is_file())
    }

    pub fn timing_path(&self, show: ShowId) -> PathBuf {
        self.root.join(format!("show_{show}_timing.json"))
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}

impl AudioSource for ShowStore {
    fn fetch_audio(&self, show: ShowId, kind: TrackKind) -> Result<Option<AudioPayload>, FetchError> {
        let Some(path) = self.audio_path(show, kind) else {
            return Ok(None);
        };
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(AudioPayload {
                bytes,
                content_type: content_type_for(&path).to_string(),
            })),
            // Removed between the lookup and the read.
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FetchError::Io { path, source }),
        }
    }
}

impl TimingProvider for ShowStore {
    fn timing_data(&self, show: ShowId) -> Result<Option<TimingReport>, TimingError> {
        let path = self.timing_path(show);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(TimingError::Io { path, source }),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| TimingError::Malformed { path, source })
    }
}

/// Runs an external generator command, e.g. the audio generation script.
///
/// `{show}` and `{track}` in any argument are replaced with the show id and
/// track name.
#[derive(Debug, Clone)]
pub struct CommandRegenerator {
    command: Vec<String>,
}

impl CommandRegenerator {
    pub fn new(settings: &RegenerationSettings) -> Self {
        Self {
            command: settings.command.clone(),
        }
    }

    fn build(&self, show: ShowId, kind: TrackKind) -> Option<Command> {
        let (program, args) = self.command.split_first()?;
        let show = show.to_string();
        let mut cmd = Command::new(program);
        for arg in args {
            cmd.arg(arg.replace("{show}", &show).replace("{track}", kind.as_str()));
        }
        Some(cmd)
    }
}

impl Regenerator for CommandRegenerator {
    fn regenerate(&self, show: ShowId, kind: TrackKind) -> Result<(), RegenerationError> {
        let mut cmd = self.build(show, kind).ok_or(RegenerationError::NotConfigured)?;
        log::info!("regenerating {kind} for show {show}: {cmd:?}");

        let output = cmd
            .output()
            .map_err(|source| RegenerationError::Spawn { kind, source })?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match stderr.trim() {
            "" => output.status.to_string(),
            s => s.lines().last().unwrap_or(s).to_string(),
        };
        Err(RegenerationError::Failed { kind, message })
    }
}
