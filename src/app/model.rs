//! Application model: the script cursor, the focused track and the latest
//! published session snapshot.

use crate::show::{ShowId, TimingEntry, TrackKind};
use crate::sync::{SessionState, Snapshot, SnapshotHandle};

/// The main application model.
pub struct App {
    pub show: ShowId,
    /// Script lines in timeline order; `PlaybackState::active_line` indexes this.
    pub lines: Vec<TimingEntry>,
    pub selected: usize,
    pub follow_playback: bool,
    /// Track targeted by volume and regeneration keys.
    pub focused: TrackKind,
    pub snapshot_handle: Option<SnapshotHandle>,
    /// One-line message shown in the status box until replaced.
    pub message: Option<String>,
}

impl App {
    pub fn new(show: ShowId, lines: Vec<TimingEntry>) -> Self {
        Self {
            show,
            lines,
            selected: 0,
            follow_playback: true,
            focused: TrackKind::Dialogue,
            snapshot_handle: None,
            message: None,
        }
    }

    pub fn set_snapshot_handle(&mut self, h: SnapshotHandle) {
        self.snapshot_handle = Some(h);
    }

    /// Copy of the latest published snapshot (default if none is attached).
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_handle
            .as_ref()
            .and_then(|h| h.lock().ok().map(|s| s.clone()))
            .unwrap_or_default()
    }

    pub fn has_lines(&self) -> bool {
        !self.lines.is_empty()
    }

    /// Every speaking character, in order of first appearance.
    pub fn cast(&self) -> Vec<&str> {
        let mut cast: Vec<&str> = Vec::new();
        for entry in &self.lines {
            let name = entry.character.trim();
            if !name.is_empty() && !cast.contains(&name) {
                cast.push(name);
            }
        }
        cast
    }

    pub fn selected_line(&self) -> Option<&TimingEntry> {
        self.lines.get(self.selected)
    }

    pub fn set_selected(&mut self, idx: usize) {
        if self.lines.is_empty() {
            self.selected = 0;
        } else {
            self.selected = idx.min(self.lines.len() - 1);
        }
    }

    /// Move the cursor down, wrapping to the first line.
    pub fn next(&mut self) {
        if self.has_lines() {
            self.selected = (self.selected + 1) % self.lines.len();
        }
    }

    /// Move the cursor up, wrapping to the last line.
    pub fn prev(&mut self) {
        if self.has_lines() {
            self.selected = match self.selected {
                0 => self.lines.len() - 1,
                i => i - 1,
            };
        }
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    pub fn toggle_follow(&mut self) {
        self.follow_playback = !self.follow_playback;
    }

    /// In follow mode, move the cursor onto the line being spoken.
    pub fn follow(&mut self, active_line: Option<usize>) {
        if !self.follow_playback {
            return;
        }
        if let Some(idx) = active_line.filter(|&i| i < self.lines.len()) {
            self.selected = idx;
        }
    }

    pub fn focus_next(&mut self) {
        self.focused = self.focused.next();
    }

    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    /// Window `[start, end)` of lines that fits in `height` rows with the
    /// selection centered when possible, plus the selection's row in it.
    pub fn visible_window(&self, height: usize) -> (usize, usize, usize) {
        let total = self.lines.len();
        let sel = self.selected.min(total.saturating_sub(1));
        if total <= height || height == 0 {
            return (0, total, sel);
        }
        let half = height / 2;
        let mut start = sel.saturating_sub(half);
        if start + height > total {
            start = total - height;
        }
        (start, start + height, sel - start)
    }
}

/// Short description of what the session is doing.
pub fn transport_label(snap: &Snapshot) -> String {
    let state = snap.playback.state;
    if state == SessionState::Loading {
        if let Some(kind) = TrackKind::ALL
            .into_iter()
            .find(|&k| snap.is_regenerating(k))
        {
            return format!("regenerating {kind}");
        }
    }
    state.label().to_string()
}

/// Format seconds as `MM:SS`. Negative and non-finite values show as zero.
pub fn format_clock(secs: f64) -> String {
    let secs = if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    };
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
