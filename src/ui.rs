//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, format_clock, transport_label};
use crate::audio::TrackState;
use crate::config::{ControlsSettings, UiSettings};
use crate::show::{TimingEntry, TrackKind};
use crate::sync::Snapshot;

const PADDED: Padding = Padding {
    left: 1,
    right: 0,
    top: 0,
    bottom: 0,
};

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(controls: &ControlsSettings) -> String {
    let step = (controls.volume_step * 100.0).round() as u32;
    [
        "[space/p] play/pause".to_string(),
        format!("[H/L] scrub -/+{}s", controls.scrub_seconds),
        "[j/k] up/down".to_string(),
        "[gg/G] top/bottom".to_string(),
        "[enter] jump to line".to_string(),
        "[0] to start".to_string(),
        "[f] follow".to_string(),
        "[tab] focus track".to_string(),
        format!("[+/-] volume ±{step}%"),
        "[r] regenerate".to_string(),
        "[q] quit".to_string(),
    ]
    .join(" | ")
}

fn track_text(kind: TrackKind, snap: &Snapshot, focused: bool) -> String {
    let status = snap.track(kind);
    let marker = if focused { ">" } else { " " };
    let mut text = format!(
        "{marker} {:<9}{:<10}vol {:>3}%",
        kind.as_str(),
        status.state.label(),
        (status.volume * 100.0).round() as u32
    );
    if status.state == TrackState::Ready {
        text.push_str(&format!("  {}", format_clock(status.duration)));
    }
    if snap.playback.master == Some(kind) {
        text.push_str("  [clock]");
    }
    if snap.is_regenerating(kind) {
        text.push_str("  [regenerating]");
    }
    if let Some(diag) = &status.diagnostic {
        text.push_str(&format!("  ({diag})"));
    }
    text
}

/// The cast as one line, with whoever is speaking highlighted.
fn cast_line<'a>(cast: &[&'a str], speaking: Option<&str>) -> Line<'a> {
    let mut spans = Vec::with_capacity(cast.len() * 2);
    for (i, &name) in cast.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        if speaking.is_some_and(|s| s.trim() == name) {
            spans.push(Span::styled(
                name,
                Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED).cyan(),
            ));
        } else {
            spans.push(Span::raw(name).dim());
        }
    }
    Line::from(spans)
}

fn script_text(entry: &TimingEntry) -> String {
    let mut text = format!("{}  {}: {}", format_clock(entry.start_time), entry.character, entry.line);
    if !entry.emotion.trim().is_empty() {
        text.push_str(&format!(" ({})", entry.emotion.trim()));
    }
    text
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    snap: &Snapshot,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" playbill · show {} ", app.show))
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Status box
    let status = {
        let p = &snap.playback;
        let mut parts: Vec<String> = vec![
            transport_label(snap),
            format!("{} / {}", format_clock(p.current_time), format_clock(p.duration)),
        ];
        if app.follow_playback {
            parts.push("CURSOR: Follow".to_string());
        } else {
            parts.push("CURSOR: Free-roam".to_string());
        }
        if let Some(e) = &p.active_effect {
            parts.push(format!("SFX: {e}"));
        }
        if let Some(msg) = &app.message {
            parts.push(msg.clone());
        }
        parts.join(" • ")
    };
    let status_par = Paragraph::new(status)
        .block(Block::bordered().padding(PADDED).title(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    // Cast
    let cast = app.cast();
    let cast_par = if cast.is_empty() {
        Paragraph::new("no script".dim())
    } else {
        Paragraph::new(cast_line(&cast, snap.playback.active_character.as_deref()))
    };
    frame.render_widget(
        cast_par.block(Block::bordered().padding(PADDED).title(" cast ")),
        chunks[2],
    );

    // Tracks
    let track_items: Vec<ListItem> = TrackKind::ALL
        .into_iter()
        .map(|kind| {
            let item = ListItem::new(track_text(kind, snap, kind == app.focused));
            match snap.track(kind).state {
                TrackState::Failed => item.red(),
                TrackState::Empty | TrackState::Unloaded => item.dim(),
                _ => item,
            }
        })
        .collect();
    let tracks = List::new(track_items).block(Block::bordered().title(" tracks "));
    frame.render_widget(tracks, chunks[3]);

    // Script
    {
        let area = chunks[4];
        let height = area.height.saturating_sub(2) as usize;
        let (start, end, selected_pos) = app.visible_window(height);
        let active = snap.playback.active_line;

        let items: Vec<ListItem> = app.lines[start..end]
            .iter()
            .enumerate()
            .map(|(offset, entry)| {
                let item = ListItem::new(script_text(entry));
                if active == Some(start + offset) {
                    item.style(Style::default().add_modifier(Modifier::BOLD)).cyan()
                } else {
                    item
                }
            })
            .collect();

        let title = if app.has_lines() {
            format!(" script ({} lines) ", app.lines.len())
        } else {
            " script (no timing data) ".to_string()
        };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if app.has_lines() {
            state.select(Some(selected_pos));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    let footer = Paragraph::new(controls_text(controls_settings))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(PADDED),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[5]);
}
