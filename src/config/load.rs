use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `PLAYBILL__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("PLAYBILL")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.clock.tick_ms == 0 {
            return Err("clock.tick_ms must be >= 1".to_string());
        }
        for (name, v) in [
            ("audio.dialogue_volume", self.audio.dialogue_volume),
            ("audio.sfx_volume", self.audio.sfx_volume),
            ("audio.music_volume", self.audio.music_volume),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(format!("{name} must be within 0.0..=1.0, got {v}"));
            }
        }
        if !(self.controls.volume_step > 0.0 && self.controls.volume_step <= 1.0) {
            return Err("controls.volume_step must be within (0.0, 1.0]".to_string());
        }
        if self.store.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err("store.extensions must name at least one extension".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `PLAYBILL_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("PLAYBILL_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/playbill/config.toml`
/// or `~/.config/playbill/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("playbill").join("config.toml"))
}

/// Default log file under `$XDG_STATE_HOME/playbill/playbill.log` or
/// `~/.local/state/playbill/playbill.log`.
pub fn default_log_path() -> Option<PathBuf> {
    let state_home = if let Some(xdg) = env::var_os("XDG_STATE_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("state"))
    };

    state_home.map(|d| d.join("playbill").join("playbill.log"))
}
