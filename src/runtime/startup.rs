use std::fs::{self, OpenOptions};
use std::path::Path;

use env_logger::{Env, Target};

use crate::config::{self, LoggingSettings};
use crate::show::{ShowId, TimingProvider, TimingReport};

/// Route `log` output to a file so it never lands on the TUI.
///
/// `RUST_LOG` overrides the configured filter. If no log file can be
/// opened, logging stays disabled.
pub fn init_logging(settings: &LoggingSettings) {
    let Some(path) = settings.file.clone().or_else(config::default_log_path) else {
        return;
    };
    let file = match open_log_file(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("playbill: cannot open log file {}: {e}", path.display());
            return;
        }
    };

    let env = Env::default().default_filter_or(settings.level.as_str());
    let result = env_logger::Builder::from_env(env)
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init();
    if let Err(e) = result {
        eprintln!("playbill: logger already initialised: {e}");
    }
}

fn open_log_file(path: &Path) -> std::io::Result<fs::File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Fetch timing data; any problem just leaves the script empty.
pub fn load_timing(provider: &dyn TimingProvider, show: ShowId) -> Option<TimingReport> {
    match provider.timing_data(show) {
        Ok(Some(report)) => Some(report),
        Ok(None) => {
            log::info!("show {show} has no timing data");
            None
        }
        Err(e) => {
            log::warn!("{e}");
            None
        }
    }
}
