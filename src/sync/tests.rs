use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::*;
use crate::audio::testing::{FakeOutput, MemorySource, advance, seconds, wav_payload};
use crate::audio::{AudioOutput, LoadOutcome, TrackLoader, TrackState, decode_payload};
use crate::config::{AudioSettings, ClockSettings};
use crate::error::{LoadError, RegenerationError, TransportRejected};
use crate::show::{
    AudioPayload, Regenerator, ShowId, SoundCue, TimingEntry, TimingReport, TrackKind,
};

use TrackKind::{Dialogue, Music, Sfx};

#[derive(Default)]
struct Recorded {
    states: Vec<PlaybackState>,
    tracks: Vec<(TrackKind, TrackStatus)>,
    regenerations: Vec<(TrackKind, bool)>,
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Recorded>>);

impl PlaybackObserver for Recorder {
    fn on_playback_state(&mut self, state: &PlaybackState) {
        self.0.borrow_mut().states.push(state.clone());
    }

    fn on_track_availability(&mut self, kind: TrackKind, status: &TrackStatus) {
        self.0.borrow_mut().tracks.push((kind, status.clone()));
    }

    fn on_regeneration(&mut self, kind: TrackKind, in_flight: bool) {
        self.0.borrow_mut().regenerations.push((kind, in_flight));
    }
}

impl Recorder {
    fn last(&self) -> PlaybackState {
        self.0.borrow().states.last().cloned().unwrap_or_default()
    }

    fn publishes(&self) -> usize {
        self.0.borrow().states.len()
    }
}

fn coordinator(output: &FakeOutput) -> SyncCoordinator<FakeOutput> {
    SyncCoordinator::new(output.clone(), &AudioSettings::default(), &ClockSettings::default())
}

fn install(c: &mut SyncCoordinator<FakeOutput>, kind: TrackKind, outcome: LoadOutcome) {
    let ticket = c.begin_load(kind);
    c.finish_load(ticket, outcome);
}

fn ready(c: &mut SyncCoordinator<FakeOutput>, kind: TrackKind, secs: f64) {
    install(c, kind, LoadOutcome::Ready(seconds(secs)));
}

/// Complete a regeneration the way the session worker does: decode first.
fn regenerated(
    c: &mut SyncCoordinator<FakeOutput>,
    kind: TrackKind,
    result: Result<Option<AudioPayload>, RegenerationError>,
) -> Result<Option<TrackState>, RegenerationError> {
    c.complete_regeneration(kind, result.map(|payload| decode_payload(kind, payload)))
}

fn line(character: &str, start: f64, end: f64) -> TimingEntry {
    TimingEntry {
        character: character.to_string(),
        line: format!("{character} speaks"),
        emotion: String::new(),
        start_time: start,
        end_time: end,
    }
}

fn two_line_script() -> TimingReport {
    TimingReport {
        dialogue_timing: vec![line("A", 0.0, 2.0), line("B", 2.0, 5.0)],
        ..TimingReport::default()
    }
}

#[test]
fn transport_is_a_no_op_without_ready_tracks() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    assert_eq!(c.state(), SessionState::Idle);
    assert_eq!(c.play(), Err(TransportRejected::NoReadyTracks));
    assert_eq!(c.pause(), Err(TransportRejected::NoReadyTracks));
    assert_eq!(c.seek_to(3.0), Err(TransportRejected::NoReadyTracks));

    install(&mut c, Dialogue, LoadOutcome::Empty);
    install(&mut c, Music, LoadOutcome::Empty);
    assert_eq!(c.play(), Err(TransportRejected::NoReadyTracks));
    assert!(!c.playback_state().is_playing);
    assert_eq!(c.state(), SessionState::Idle);
    assert_eq!(output.opened(), 0);
}

#[test]
fn seeking_maps_time_to_the_spoken_line() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    let recorder = Recorder::default();
    c.add_observer(Box::new(recorder.clone()));
    ready(&mut c, Dialogue, 12.0);
    c.set_timing(Some(two_line_script()));

    c.seek_to(1.0).unwrap();
    let state = recorder.last();
    assert_eq!(state.active_line, Some(0));
    assert_eq!(state.active_character.as_deref(), Some("A"));

    c.seek_to(3.0).unwrap();
    let state = recorder.last();
    assert_eq!(state.active_line, Some(1));
    assert_eq!(state.active_character.as_deref(), Some("B"));

    c.seek_to(10.0).unwrap();
    let state = recorder.last();
    assert_eq!(state.current_time, 10.0);
    assert_eq!(state.active_line, None);
    assert_eq!(state.active_character, None);
}

#[test]
fn partial_ensemble_plays_what_it_has() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    ready(&mut c, Dialogue, 10.0);
    install(&mut c, Sfx, LoadOutcome::Empty);
    install(
        &mut c,
        Music,
        LoadOutcome::Failed(LoadError::Decode {
            kind: Music,
            message: "bad header".to_string(),
        }),
    );

    assert_eq!(c.state(), SessionState::Ready);
    c.play().unwrap();
    assert_eq!(output.opened(), 1);
    assert!(output.probe(Dialogue).borrow().playing);
    assert_eq!(c.state(), SessionState::Playing);

    assert_eq!(c.seek_to(5.0), Ok(5.0));
    assert_eq!(output.probe(Dialogue).borrow().position, 5.0);
    assert_eq!(c.playback_state().duration, 10.0);
    assert_eq!(c.track_status(Music).state, TrackState::Failed);
    assert!(c.track_status(Music).diagnostic.unwrap().contains("bad header"));
}

#[test]
fn regeneration_blocks_transport_until_complete() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    ready(&mut c, Dialogue, 10.0);
    install(&mut c, Music, LoadOutcome::Empty);

    c.begin_regeneration(Music).unwrap();
    assert_eq!(c.state(), SessionState::Loading);
    assert_eq!(c.play(), Err(TransportRejected::Regenerating(Music)));
    assert_eq!(c.pause(), Err(TransportRejected::Regenerating(Music)));
    assert_eq!(c.seek_to(2.0), Err(TransportRejected::Regenerating(Music)));
    assert!(!output.probe(Dialogue).borrow().playing);
    assert_eq!(c.current_time(), 0.0);

    let state = regenerated(&mut c, Music, Ok(Some(wav_payload(2.0)))).unwrap();
    assert_eq!(state, Some(TrackState::Ready));
    assert_eq!(c.state(), SessionState::Ready);

    c.play().unwrap();
    assert!(output.probe(Dialogue).borrow().playing);
    assert!(output.probe(Music).borrow().playing);
}

#[test]
fn failed_regeneration_keeps_the_previous_track() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    ready(&mut c, Music, 3.0);
    let old = output.probe(Music);

    c.begin_regeneration(Music).unwrap();
    let err = regenerated(
        &mut c,
        Music,
        Err(RegenerationError::Failed {
            kind: Music,
            message: "synth offline".to_string(),
        }),
    )
    .unwrap_err();
    assert!(err.to_string().contains("synth offline"));

    assert_eq!(c.tracks().state(Music), TrackState::Ready);
    assert!(!old.borrow().released);
    assert_ne!(c.state(), SessionState::Loading);
    c.play().unwrap();
    assert!(old.borrow().playing);
}

#[test]
fn missing_regenerated_audio_keeps_the_previous_track() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    ready(&mut c, Music, 8.0);
    let old = output.probe(Music);

    c.begin_regeneration(Music).unwrap();
    let err = regenerated(&mut c, Music, Ok(None)).unwrap_err();
    assert!(matches!(err, RegenerationError::Missing(Music)));

    assert_eq!(c.tracks().state(Music), TrackState::Ready);
    assert_eq!(c.tracks().duration(Music), 8.0);
    assert!(!old.borrow().released);
    assert_eq!(output.opened(), 1);
    c.play().unwrap();
    assert!(old.borrow().playing);
}

#[test]
fn undecodable_regenerated_audio_keeps_the_previous_track() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    ready(&mut c, Music, 8.0);
    let old = output.probe(Music);

    c.begin_regeneration(Music).unwrap();
    let garbage = AudioPayload {
        bytes: b"definitely not audio".to_vec(),
        content_type: "audio/wav".to_string(),
    };
    let err = regenerated(&mut c, Music, Ok(Some(garbage))).unwrap_err();
    assert!(matches!(err, RegenerationError::Unusable(LoadError::Decode { kind: Music, .. })));

    assert_eq!(c.tracks().state(Music), TrackState::Ready);
    assert_eq!(c.track_status(Music).diagnostic, None);
    assert!(!old.borrow().released);
    assert_eq!(c.state(), SessionState::Ready);
    c.play().unwrap();
    assert!(old.borrow().playing);
}

#[test]
fn missing_regenerated_audio_leaves_an_absent_track_absent() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    ready(&mut c, Dialogue, 4.0);
    install(&mut c, Sfx, LoadOutcome::Empty);

    c.begin_regeneration(Sfx).unwrap();
    assert!(regenerated(&mut c, Sfx, Ok(None)).is_err());
    assert_eq!(c.tracks().state(Sfx), TrackState::Empty);
    assert_eq!(c.play(), Ok(()));
}

#[test]
fn transport_returns_only_when_every_regeneration_completed() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    ready(&mut c, Dialogue, 10.0);

    c.begin_regeneration(Sfx).unwrap();
    c.begin_regeneration(Music).unwrap();
    assert!(matches!(
        c.begin_regeneration(Music),
        Err(RegenerationError::AlreadyRunning(Music))
    ));
    assert_eq!(c.play(), Err(TransportRejected::Regenerating(Sfx)));

    regenerated(&mut c, Sfx, Ok(Some(wav_payload(2.0)))).unwrap();
    assert_eq!(c.tracks().state(Sfx), TrackState::Ready);
    assert_eq!(c.play(), Err(TransportRejected::Regenerating(Music)));

    regenerated(&mut c, Music, Ok(Some(wav_payload(1.0)))).unwrap();
    assert_eq!(c.play(), Ok(()));
}

#[test]
fn stray_regeneration_result_is_ignored() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    assert_eq!(regenerated(&mut c, Sfx, Ok(Some(wav_payload(1.0)))).unwrap(), None);
    assert_eq!(c.tracks().state(Sfx), TrackState::Unloaded);
}

#[test]
fn regeneration_pauses_active_playback() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    ready(&mut c, Dialogue, 10.0);
    c.play().unwrap();
    advance(&output.probe(Dialogue), 2.5);

    c.begin_regeneration(Dialogue).unwrap();
    assert!(!output.probe(Dialogue).borrow().playing);
    assert_eq!(c.current_time(), 2.5);

    // The replacement joins at the paused position.
    regenerated(&mut c, Dialogue, Ok(Some(wav_payload(4.0)))).unwrap();
    assert!((output.probe(Dialogue).borrow().position - 2.5).abs() < 1e-9);
    assert_eq!(c.state(), SessionState::Paused);
}

#[test]
fn seek_clamps_and_is_idempotent() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    ready(&mut c, Dialogue, 10.0);
    c.set_timing(Some(two_line_script()));

    assert_eq!(c.seek_to(-4.0), Ok(0.0));
    assert_eq!(c.seek_to(99.0), Ok(10.0));
    assert_eq!(c.seek_to(f64::NAN), Ok(0.0));

    c.seek_to(3.5).unwrap();
    let once = c.playback_state();
    c.seek_to(3.5).unwrap();
    assert_eq!(c.playback_state(), once);
}

#[test]
fn relative_and_line_seeks() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    ready(&mut c, Dialogue, 10.0);
    c.set_timing(Some(two_line_script()));

    assert_eq!(c.seek_by(4.0), Ok(4.0));
    assert_eq!(c.seek_by(-1.5), Ok(2.5));
    assert_eq!(c.seek_by(-10.0), Ok(0.0));

    assert_eq!(c.seek_to_line(1), Ok(2.0));
    assert_eq!(c.playback_state().active_character.as_deref(), Some("A"));
    assert_eq!(c.seek_to_line(7), Err(TransportRejected::NoSuchLine(7)));
    assert_eq!(c.current_time(), 2.0);
}

#[test]
fn loading_pauses_and_rejects_transport() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    ready(&mut c, Dialogue, 10.0);
    ready(&mut c, Sfx, 10.0);
    c.play().unwrap();
    advance(&output.probe(Dialogue), 1.0);

    let ticket = c.begin_load(Sfx);
    assert_eq!(c.state(), SessionState::Loading);
    assert!(!output.probe(Dialogue).borrow().playing);
    assert_eq!(c.play(), Err(TransportRejected::Loading));
    assert_eq!(c.seek_to(0.0), Err(TransportRejected::Loading));

    c.finish_load(ticket, LoadOutcome::Ready(seconds(6.0)));
    assert_eq!(c.state(), SessionState::Paused);
    assert_eq!(output.probe(Sfx).borrow().position, 1.0);
    assert_eq!(c.play(), Ok(()));
}

#[test]
fn only_the_latest_load_is_installed() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    let first = c.begin_load(Dialogue);
    let second = c.begin_load(Dialogue);

    assert_eq!(c.finish_load(second, LoadOutcome::Ready(seconds(8.0))), Some(TrackState::Ready));
    assert_eq!(c.finish_load(first, LoadOutcome::Empty), None);
    assert_eq!(c.tracks().state(Dialogue), TrackState::Ready);
    assert_eq!(c.playback_state().duration, 8.0);
}

#[test]
fn stalled_load_times_out() {
    let output = FakeOutput::default();
    let audio = AudioSettings {
        load_timeout_ms: 1_000,
        ..AudioSettings::default()
    };
    let mut c = SyncCoordinator::new(output.clone(), &audio, &ClockSettings::default());
    ready(&mut c, Music, 5.0);

    let ticket = c.begin_load(Dialogue);
    c.tick(Instant::now());
    assert_eq!(c.tracks().state(Dialogue), TrackState::Loading);

    c.tick(Instant::now() + Duration::from_secs(2));
    assert_eq!(c.tracks().state(Dialogue), TrackState::Failed);
    assert!(
        c.track_status(Dialogue)
            .diagnostic
            .unwrap()
            .contains("did not load")
    );
    assert_eq!(c.state(), SessionState::Ready);
    assert_eq!(c.master(), Some(Music));

    assert_eq!(c.finish_load(ticket, LoadOutcome::Ready(seconds(5.0))), None);
    assert_eq!(c.tracks().state(Dialogue), TrackState::Failed);
}

#[test]
fn zero_timeout_waits_forever() {
    let output = FakeOutput::default();
    let audio = AudioSettings {
        load_timeout_ms: 0,
        ..AudioSettings::default()
    };
    let mut c = SyncCoordinator::new(output, &audio, &ClockSettings::default());
    c.begin_load(Sfx);
    c.tick(Instant::now() + Duration::from_secs(3600));
    assert_eq!(c.tracks().state(Sfx), TrackState::Loading);
}

#[test]
fn end_of_master_finishes_the_show() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    let recorder = Recorder::default();
    c.add_observer(Box::new(recorder.clone()));
    ready(&mut c, Dialogue, 4.0);
    ready(&mut c, Music, 9.0);
    c.play().unwrap();

    advance(&output.probe(Dialogue), 5.0);
    advance(&output.probe(Music), 5.0);
    c.tick(Instant::now());

    let state = recorder.last();
    assert!(state.finished);
    assert!(!state.is_playing);
    assert_eq!(state.current_time, 4.0);
    assert_eq!(c.state(), SessionState::Finished);
    assert!(!output.probe(Music).borrow().playing);

    // Play again starts over.
    c.play().unwrap();
    assert_eq!(c.current_time(), 0.0);
    assert_eq!(output.probe(Dialogue).borrow().position, 0.0);
    assert!(output.probe(Dialogue).borrow().playing);
    assert!(output.probe(Music).borrow().playing);
}

#[test]
fn seeking_after_the_end_leaves_the_session_paused() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    ready(&mut c, Dialogue, 3.0);
    c.play().unwrap();
    advance(&output.probe(Dialogue), 3.0);
    c.tick(Instant::now());
    assert_eq!(c.state(), SessionState::Finished);

    assert_eq!(c.seek_to(1.0), Ok(1.0));
    assert_eq!(c.state(), SessionState::Paused);
    assert!(!c.playback_state().finished);
}

#[test]
fn ticks_publish_at_the_clock_rate_and_realign() {
    let output = FakeOutput::default();
    let mut c = SyncCoordinator::new(
        output.clone(),
        &AudioSettings::default(),
        &ClockSettings { tick_ms: 100 },
    );
    let recorder = Recorder::default();
    ready(&mut c, Dialogue, 10.0);
    ready(&mut c, Sfx, 10.0);
    c.add_observer(Box::new(recorder.clone()));
    c.play().unwrap();
    let before = recorder.publishes();

    let t0 = Instant::now();
    advance(&output.probe(Dialogue), 1.0);
    advance(&output.probe(Sfx), 1.5);
    c.tick(t0);
    assert_eq!(recorder.publishes(), before + 1);
    assert_eq!(recorder.last().current_time, 1.0);
    assert_eq!(output.probe(Sfx).borrow().position, 1.0);

    c.tick(t0 + Duration::from_millis(30));
    c.tick(t0 + Duration::from_millis(60));
    assert_eq!(recorder.publishes(), before + 1);
    c.tick(t0 + Duration::from_millis(110));
    assert_eq!(recorder.publishes(), before + 2);
}

#[test]
fn paused_session_does_not_tick() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    let recorder = Recorder::default();
    ready(&mut c, Dialogue, 10.0);
    c.add_observer(Box::new(recorder.clone()));
    let before = recorder.publishes();
    c.tick(Instant::now());
    assert_eq!(recorder.publishes(), before);
}

#[test]
fn master_is_picked_by_priority_once_loading_settles() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    let d = c.begin_load(Dialogue);
    let s = c.begin_load(Sfx);
    let m = c.begin_load(Music);

    c.finish_load(m, LoadOutcome::Ready(seconds(7.0)));
    assert_eq!(c.master(), None);
    c.finish_load(s, LoadOutcome::Ready(seconds(7.0)));
    c.finish_load(d, LoadOutcome::Empty);
    assert_eq!(c.master(), Some(Sfx));
}

#[test]
fn volume_is_never_gated() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    let recorder = Recorder::default();
    c.add_observer(Box::new(recorder.clone()));
    ready(&mut c, Music, 5.0);
    c.begin_regeneration(Music).unwrap();

    assert_eq!(c.set_volume(Music, 0.25), Some(0.25));
    assert_eq!(output.probe(Music).borrow().volume, 0.25);
    assert_eq!(c.set_volume(Dialogue, f32::NAN), None);
    let recorded = recorder.0.borrow();
    let last = recorded.tracks.last().map(|(k, s)| (*k, s.volume));
    assert_eq!(last, Some((Music, 0.25)));
}

#[test]
fn new_observers_are_brought_up_to_date() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    ready(&mut c, Dialogue, 10.0);
    c.begin_regeneration(Sfx).unwrap();

    let recorder = Recorder::default();
    c.add_observer(Box::new(recorder.clone()));
    let recorded = recorder.0.borrow();
    assert_eq!(recorded.states.len(), 1);
    assert_eq!(recorded.tracks.len(), 3);
    assert_eq!(recorded.tracks[0].1.state, TrackState::Ready);
    assert!(recorded.regenerations.contains(&(Sfx, true)));
    assert!(recorded.regenerations.contains(&(Music, false)));
}

#[test]
fn snapshot_observer_mirrors_the_session() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    let handle = SnapshotHandle::default();
    c.add_observer(Box::new(SnapshotObserver::new(handle.clone())));

    ready(&mut c, Dialogue, 10.0);
    c.set_timing(Some(two_line_script()));
    c.seek_to(3.0).unwrap();
    c.begin_regeneration(Music).unwrap();

    let snap = handle.lock().unwrap().clone();
    assert_eq!(snap.playback.active_character.as_deref(), Some("B"));
    assert_eq!(snap.track(Dialogue).state, TrackState::Ready);
    assert_eq!(snap.track(Dialogue).duration, 10.0);
    assert!(snap.is_regenerating(Music));
    assert_eq!(snap.playback.state, SessionState::Loading);
    assert_eq!(snap.playback.master, Some(Dialogue));
}

#[test]
fn timing_replacement_rebuilds_both_timelines() {
    let output = FakeOutput::default();
    let mut c = coordinator(&output);
    ready(&mut c, Dialogue, 10.0);
    c.set_timing(Some(TimingReport {
        dialogue_timing: vec![line("A", 0.0, 2.0)],
        sound_effect_timing: vec![SoundCue {
            effect: "thunder".to_string(),
            start_time: 1.0,
            end_time: 4.0,
        }],
    }));
    c.seek_to(1.5).unwrap();
    let state = c.playback_state();
    assert_eq!(state.active_line, Some(0));
    assert_eq!(state.active_effect.as_deref(), Some("thunder"));

    c.set_timing(None);
    let state = c.playback_state();
    assert!(c.lines().is_empty());
    assert_eq!(state.active_line, None);
    assert_eq!(state.active_effect, None);
}

#[test]
fn gate_flags_are_per_track() {
    let mut gate = RegenerationGate::default();
    assert!(!gate.is_busy());
    assert!(gate.begin(Music));
    assert!(!gate.begin(Music));
    assert!(gate.begin(Dialogue));
    assert_eq!(gate.first_busy(), Some(Dialogue));
    assert!(gate.complete(Dialogue));
    assert!(!gate.complete(Dialogue));
    assert_eq!(gate.first_busy(), Some(Music));
    assert!(gate.complete(Music));
    assert!(!gate.is_busy());
}

struct ScriptedRegenerator {
    source: Arc<MemorySource>,
    result: Mutex<Option<AudioPayload>>,
}

impl Regenerator for ScriptedRegenerator {
    fn regenerate(&self, _show: ShowId, kind: TrackKind) -> Result<(), RegenerationError> {
        match self.result.lock().unwrap().clone() {
            Some(payload) => {
                self.source.set(kind, payload);
                Ok(())
            }
            None => Err(RegenerationError::Failed {
                kind,
                message: "exit status: 1".to_string(),
            }),
        }
    }
}

fn session_with(
    output: &FakeOutput,
    source: Arc<MemorySource>,
    regenerated: Option<AudioPayload>,
) -> Session<FakeOutput> {
    let show = ShowId::new(7).unwrap();
    let loader = TrackLoader::new(show, source.clone());
    let regenerator = ScriptedRegenerator {
        source,
        result: Mutex::new(regenerated),
    };
    Session::new(coordinator(output), loader, Arc::new(regenerator))
}

/// Pump until `done` holds, collecting notices.
fn pump_until<O: AudioOutput>(
    session: &mut Session<O>,
    mut done: impl FnMut(&Session<O>, &[SessionNotice]) -> bool,
) -> Vec<SessionNotice> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut notices = Vec::new();
    loop {
        notices.extend(session.pump());
        if done(session, &notices) {
            return notices;
        }
        assert!(Instant::now() < deadline, "session did not settle");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn session_loads_in_the_background() {
    let output = FakeOutput::default();
    let source = Arc::new(MemorySource::with(&[(Dialogue, wav_payload(1.0))]));
    let mut session = session_with(&output, source, None);

    session.load_all();
    assert_eq!(session.coordinator().state(), SessionState::Loading);
    pump_until(&mut session, |s, _| !s.coordinator().tracks().is_loading());

    let c = session.coordinator();
    assert_eq!(c.tracks().state(Dialogue), TrackState::Ready);
    assert_eq!(c.tracks().state(Sfx), TrackState::Empty);
    assert_eq!(c.tracks().state(Music), TrackState::Empty);
    assert_eq!(c.master(), Some(Dialogue));
    assert_eq!(c.state(), SessionState::Ready);
}

#[test]
fn seek_handle_requests_apply_on_pump() {
    let output = FakeOutput::default();
    let source = Arc::new(MemorySource::with(&[(Dialogue, wav_payload(2.0))]));
    let mut session = session_with(&output, source, None);
    let seek = session.seek_handle();

    // Rejected while the loads are still outstanding.
    session.load_all();
    assert!(seek.seek(0.5));
    let notices = session.pump();
    assert!(
        notices
            .iter()
            .any(|n| matches!(n, SessionNotice::SeekRejected(TransportRejected::Loading)))
            || !session.coordinator().tracks().is_loading()
    );

    pump_until(&mut session, |s, _| !s.coordinator().tracks().is_loading());
    assert!(seek.seek(1.25));
    assert_ne!(session.coordinator().current_time(), 1.25);
    session.tick(Instant::now());
    assert_eq!(session.coordinator().current_time(), 1.25);
}

#[test]
fn session_regenerates_and_reloads() {
    let output = FakeOutput::default();
    let source = Arc::new(MemorySource::with(&[(Dialogue, wav_payload(1.0))]));
    let mut session = session_with(&output, source, Some(wav_payload(0.5)));
    session.load_all();
    pump_until(&mut session, |s, _| !s.coordinator().tracks().is_loading());

    session.regenerate(Music).unwrap();
    assert!(matches!(
        session.regenerate(Music),
        Err(RegenerationError::AlreadyRunning(Music))
    ));
    let notices = pump_until(&mut session, |_, n| !n.is_empty());
    assert!(matches!(notices[0], SessionNotice::Regenerated(Music)));
    assert_eq!(session.coordinator().tracks().state(Music), TrackState::Ready);
    assert!(session.coordinator_mut().play().is_ok());
}

#[test]
fn session_reports_failed_regeneration() {
    let output = FakeOutput::default();
    let source = Arc::new(MemorySource::with(&[(Sfx, wav_payload(1.0))]));
    let mut session = session_with(&output, source, None);
    session.load_all();
    pump_until(&mut session, |s, _| !s.coordinator().tracks().is_loading());

    session.regenerate(Sfx).unwrap();
    let notices = pump_until(&mut session, |_, n| !n.is_empty());
    assert!(matches!(
        &notices[0],
        SessionNotice::RegenerationFailed(RegenerationError::Failed { kind: Sfx, .. })
    ));
    assert_eq!(session.coordinator().tracks().state(Sfx), TrackState::Ready);
    assert_eq!(session.coordinator().state(), SessionState::Ready);
}

#[test]
fn session_keeps_the_old_track_when_regeneration_yields_nothing() {
    let output = FakeOutput::default();
    let source = Arc::new(MemorySource::with(&[(Music, wav_payload(1.0))]));
    let empty = AudioPayload {
        bytes: Vec::new(),
        content_type: "audio/wav".to_string(),
    };
    let mut session = session_with(&output, source, Some(empty));
    session.load_all();
    pump_until(&mut session, |s, _| !s.coordinator().tracks().is_loading());
    let old = output.probe(Music);

    session.regenerate(Music).unwrap();
    let notices = pump_until(&mut session, |_, n| !n.is_empty());
    assert!(matches!(
        &notices[0],
        SessionNotice::RegenerationFailed(RegenerationError::Missing(Music))
    ));
    assert_eq!(session.coordinator().tracks().state(Music), TrackState::Ready);
    assert!(!old.borrow().released);
}

#[test]
fn seek_handle_jumps_to_script_lines() {
    let output = FakeOutput::default();
    let source = Arc::new(MemorySource::with(&[(Dialogue, wav_payload(6.0))]));
    let mut session = session_with(&output, source, None);
    session.coordinator_mut().set_timing(Some(two_line_script()));
    session.load_all();
    pump_until(&mut session, |s, _| !s.coordinator().tracks().is_loading());
    let seek = session.seek_handle();

    assert!(seek.seek_to_line(1));
    assert!(session.pump().is_empty());
    let state = session.coordinator().playback_state();
    assert_eq!(state.current_time, 2.0);
    assert_eq!(state.state, SessionState::Ready);

    assert!(seek.seek_to_line(9));
    let notices = session.pump();
    assert!(matches!(
        notices[..],
        [SessionNotice::SeekRejected(TransportRejected::NoSuchLine(9))]
    ));
    assert_eq!(session.coordinator().current_time(), 2.0);
}
