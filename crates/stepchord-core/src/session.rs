//! Session façade: the operations the UI layer calls
//!
//! Composes the document, per-track history, selection, clipboard,
//! scheduler and recorder. Every undoable edit commits the edited track's
//! notes to its history before returning.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::chord::{build_chord, detect_notes, invert, voice, ChordLabel};
use crate::clipboard::Clipboard;
use crate::command::{Command, Response, Signal};
use crate::config::SessionConfig;
use crate::document::Document;
use crate::error::{Result, StepchordError};
use crate::history::History;
use crate::note::{NoteId, MIN_LENGTH};
use crate::pitch::{Pitch, PitchClass};
use crate::playback::NoteTrigger;
use crate::recording::Recorder;
use crate::selection::{Selection, SelectionBox};
use crate::theory::{tables, ChordProgression};
use crate::track::{Track, TrackId};
use crate::transform::{snap_to_grid, SnapUnit, Transform};
use crate::transport::{Scheduler, TickToken, TransportState};

/// Chords by major-scale degree, used by chord mode key presses
const DEGREE_SYMBOLS: [&str; 7] = ["I", "ii", "iii", "IV", "V", "vi", "vii°"];

/// Largest chord in the tables (sevenths)
const MAX_CHORD_SIZE: usize = 4;

pub struct Session {
    config: SessionConfig,
    doc: Document,
    active: Option<TrackId>,
    selection: Selection,
    histories: HashMap<TrackId, History>,
    clipboard: Clipboard,
    scheduler: Scheduler,
    recorder: Recorder,
    key: PitchClass,
    progression: Option<ChordProgression>,
    inversion: usize,
    chord_mode: bool,
    snap: SnapUnit,
    snap_enabled: bool,
    rng: fastrand::Rng,
}

impl Session {
    /// Session over the default four-track template
    pub fn new(config: SessionConfig) -> Self {
        Self::with_document(Document::with_default_tracks(), config)
    }

    pub fn with_document(doc: Document, config: SessionConfig) -> Self {
        let key = config.key.parse().unwrap_or_else(|e| {
            warn!("Invalid key in config, using C: {}", e);
            PitchClass::C
        });
        let snap = if config.snap.is_valid() {
            config.snap
        } else {
            warn!("Invalid snap unit {} in config, using 1 step", config.snap.0);
            SnapUnit::default()
        };
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };

        let mut session = Self {
            active: doc.tracks.first().map(|t| t.id),
            scheduler: Scheduler::new(config.bpm, config.total_steps),
            snap_enabled: config.snap_enabled,
            doc,
            selection: Selection::new(),
            histories: HashMap::new(),
            clipboard: Clipboard::default(),
            recorder: Recorder::new(),
            key,
            progression: None,
            inversion: 0,
            chord_mode: false,
            snap,
            rng,
            config,
        };
        for track in &session.doc.tracks {
            session
                .histories
                .insert(track.id, History::new(track.notes.clone(), session.config.history_capacity));
        }
        session
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn active_track(&self) -> Option<TrackId> {
        self.active
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn transport_state(&self) -> TransportState {
        self.scheduler.state()
    }

    pub fn key(&self) -> PitchClass {
        self.key
    }

    pub fn progression(&self) -> Option<&ChordProgression> {
        self.progression.as_ref()
    }

    pub fn inversion(&self) -> usize {
        self.inversion
    }

    pub fn chord_mode(&self) -> bool {
        self.chord_mode
    }

    pub fn snap(&self) -> Option<SnapUnit> {
        self.snap_enabled.then_some(self.snap)
    }

    pub fn can_undo(&self) -> bool {
        self.active_history().is_some_and(History::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.active_history().is_some_and(History::can_redo)
    }

    fn active_history(&self) -> Option<&History> {
        self.active.and_then(|id| self.histories.get(&id))
    }

    fn active_id(&self) -> Result<TrackId> {
        self.active.ok_or(StepchordError::NoActiveTrack)
    }

    fn snapped(&self, step: f64) -> f64 {
        if self.snap_enabled {
            snap_to_grid(step, self.snap)
        } else {
            step
        }
    }

    /// Push the track's current notes onto its history
    fn commit(&mut self, track: TrackId) -> Result<()> {
        let capacity = self.config.history_capacity;
        let notes = &self.doc.track(track)?.notes;
        self.histories
            .entry(track)
            .or_insert_with(|| History::new(Vec::new(), capacity))
            .commit(notes);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Tracks
    // ------------------------------------------------------------------------

    pub fn create_track(&mut self, name: impl Into<String>, instrument_id: impl Into<String>) -> TrackId {
        let id = self.doc.add_track(name, instrument_id);
        self.histories
            .insert(id, History::new(Vec::new(), self.config.history_capacity));
        if self.active.is_none() {
            self.active = Some(id);
        }
        info!("Created track {}", id.0);
        id
    }

    /// Make a track active; the selection is scoped to it and cleared on change
    pub fn select_track(&mut self, id: TrackId) -> Result<()> {
        self.doc.track(id)?;
        if self.active != Some(id) {
            self.selection.clear();
        }
        self.active = Some(id);
        Ok(())
    }

    pub fn duplicate_track(&mut self, id: TrackId) -> Result<TrackId> {
        let copy = self.doc.duplicate_track(id)?;
        let notes = self.doc.track(copy)?.notes.clone();
        self.histories
            .insert(copy, History::new(notes, self.config.history_capacity));
        info!("Duplicated track {} as {}", id.0, copy.0);
        Ok(copy)
    }

    pub fn remove_track(&mut self, id: TrackId) -> Result<()> {
        self.doc
            .remove_track(id)
            .ok_or(StepchordError::TrackNotFound(id.0))?;
        self.histories.remove(&id);
        if self.active == Some(id) {
            self.active = self.doc.tracks.first().map(|t| t.id);
            self.selection.clear();
        }
        info!("Removed track {}", id.0);
        Ok(())
    }

    pub fn rename_track(&mut self, id: TrackId, name: impl Into<String>) -> Result<()> {
        self.track_mut(id)?.name = name.into();
        Ok(())
    }

    fn track_mut(&mut self, id: TrackId) -> Result<&mut Track> {
        self.doc.track_mut(id)
    }

    pub fn set_mute(&mut self, id: TrackId, muted: bool) -> Result<()> {
        self.track_mut(id)?.muted = muted;
        Ok(())
    }

    pub fn set_solo(&mut self, id: TrackId, solo: bool) -> Result<()> {
        self.track_mut(id)?.solo = solo;
        Ok(())
    }

    pub fn set_volume(&mut self, id: TrackId, volume: f32) -> Result<()> {
        self.track_mut(id)?.set_volume(volume);
        Ok(())
    }

    pub fn set_pan(&mut self, id: TrackId, pan: f32) -> Result<()> {
        self.track_mut(id)?.set_pan(pan);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Notes
    // ------------------------------------------------------------------------

    /// Grid click on the active track with default velocity and length
    pub fn add_note(&mut self, pitch: Pitch, step: f64) -> Result<NoteId> {
        let track = self.active_id()?;
        let step = self.snapped(step);
        self.add_note_to(track, pitch, step, self.config.default_velocity, MIN_LENGTH)
    }

    pub fn add_note_to(&mut self, track: TrackId, pitch: Pitch, step: f64, velocity: u8, length: f64) -> Result<NoteId> {
        let id = self.doc.add_note(track, pitch, step, velocity, length)?;
        self.commit(track)?;
        Ok(id)
    }

    /// Missing ids are a no-op; returns whether a note was removed
    pub fn remove_note(&mut self, id: NoteId) -> Result<bool> {
        let track = self.active_id()?;
        let removed = self.doc.remove_note(track, id)?;
        if removed {
            self.selection.remove(id);
            self.commit(track)?;
        }
        Ok(removed)
    }

    pub fn move_note(&mut self, id: NoteId, step: f64, pitch: Pitch) -> Result<()> {
        let track = self.active_id()?;
        let step = self.snapped(step);
        self.doc.move_note(track, id, step, pitch)?;
        self.commit(track)
    }

    pub fn resize_note(&mut self, id: NoteId, length: f64) -> Result<()> {
        let track = self.active_id()?;
        self.doc.resize_note(track, id, length)?;
        self.commit(track)
    }

    pub fn clear_region(&mut self, from: f64, to: f64) -> Result<usize> {
        let track = self.active_id()?;
        let cleared = self.doc.clear_region(track, from.min(to), from.max(to))?;
        if cleared > 0 {
            self.selection.retain_existing(&self.doc.track(track)?.notes);
            self.commit(track)?;
        }
        Ok(cleared)
    }

    // ------------------------------------------------------------------------
    // Harmony
    // ------------------------------------------------------------------------

    pub fn set_key(&mut self, key: PitchClass) {
        self.key = key;
        debug!("Key set to {}", key);
    }

    /// Adopt a named progression and its default key
    pub fn set_progression(&mut self, name: &str) -> Result<()> {
        let progression = tables().progression(name)?.clone();
        self.key = progression.default_key;
        info!("Progression {} in {}", progression.name, self.key);
        self.progression = Some(progression);
        Ok(())
    }

    /// 0 = root position, up to one less than the largest chord size
    pub fn set_inversion(&mut self, inversion: usize) -> Result<()> {
        if inversion >= MAX_CHORD_SIZE {
            return Err(StepchordError::InvalidRange(format!(
                "inversion {inversion} out of range 0..{}",
                MAX_CHORD_SIZE - 1
            )));
        }
        self.inversion = inversion;
        Ok(())
    }

    pub fn toggle_chord_mode(&mut self) -> bool {
        self.chord_mode = !self.chord_mode;
        self.chord_mode
    }

    /// Chord tones in the current key, inverted and voiced upward from `octave`
    pub fn voiced_chord(&self, symbol: &str, octave: i8) -> Result<Vec<Pitch>> {
        let chord = build_chord(self.key.name(), symbol)?;
        Ok(voice(&invert(&chord, self.inversion), octave))
    }

    /// Pitches a key press sounds: the diatonic chord on that degree in chord
    /// mode, otherwise the single pitch. Non-diatonic presses stay single.
    fn expand_key_press(&self, pitch: Pitch) -> Vec<Pitch> {
        if !self.chord_mode {
            return vec![pitch];
        }
        let degree = tables().key(self.key).major.iter().position(|&pc| pc == pitch.class);
        match degree.map(|d| self.voiced_chord(DEGREE_SYMBOLS[d], pitch.octave)) {
            Some(Ok(pitches)) => pitches,
            _ => vec![pitch],
        }
    }

    fn place_chord(&mut self, track: TrackId, pitches: &[Pitch], step: f64) -> Result<Vec<NoteId>> {
        let velocity = self.config.default_velocity;
        let strum = self.config.chord_strum.max(0.0);
        pitches
            .iter()
            .enumerate()
            .map(|(i, &pitch)| self.doc.add_note(track, pitch, step + i as f64 * strum, velocity, MIN_LENGTH))
            .collect()
    }

    /// Insert a chord symbol of the current key at a step
    pub fn insert_chord(&mut self, symbol: &str, step: f64, octave: i8) -> Result<Vec<NoteId>> {
        let track = self.active_id()?;
        let pitches = self.voiced_chord(symbol, octave)?;
        let step = self.snapped(step);
        let ids = self.place_chord(track, &pitches, step)?;
        self.selection = Selection::from_ids(ids.iter().copied());
        self.commit(track)?;
        Ok(ids)
    }

    /// Lay the whole current progression out as one edit
    pub fn insert_progression(&mut self, step: f64, octave: i8, steps_per_chord: f64) -> Result<Vec<NoteId>> {
        let track = self.active_id()?;
        let progression = self
            .progression
            .clone()
            .ok_or_else(|| StepchordError::UnknownProgression("<none>".to_string()))?;
        if !(steps_per_chord.is_finite() && steps_per_chord > 0.0) {
            return Err(StepchordError::InvalidRange(format!("steps per chord {steps_per_chord}")));
        }

        // Resolve every chord before touching the document
        let chords = progression
            .symbols
            .iter()
            .map(|symbol| self.voiced_chord(symbol, octave))
            .collect::<Result<Vec<_>>>()?;

        let start = self.snapped(step);
        let mut ids = Vec::new();
        for (i, pitches) in chords.iter().enumerate() {
            ids.extend(self.place_chord(track, pitches, start + i as f64 * steps_per_chord)?);
        }
        self.selection = Selection::from_ids(ids.iter().copied());
        self.commit(track)?;
        info!("Inserted progression {} ({} notes)", progression.name, ids.len());
        Ok(ids)
    }

    /// Chord formed by the current selection
    pub fn detect_selection(&self) -> Result<ChordLabel> {
        let track = self.doc.track(self.active_id()?)?;
        Ok(detect_notes(self.selection.selected(&track.notes)))
    }

    // ------------------------------------------------------------------------
    // Keyboard and transport
    // ------------------------------------------------------------------------

    fn audition(&self, track: TrackId, pitches: &[Pitch]) -> Vec<NoteTrigger> {
        let Ok(track) = self.doc.track(track) else {
            return Vec::new();
        };
        let step_secs = self.scheduler.step_duration_ms() / 1000.0;
        let velocity = (self.config.default_velocity as f32 / 127.0) * (track.volume / 100.0);
        pitches
            .iter()
            .map(|p| NoteTrigger {
                pitch_class: p.class,
                octave: p.octave,
                duration_secs: step_secs,
                instrument_id: track.instrument_id.clone(),
                velocity,
            })
            .collect()
    }

    /// Key press. While recording the pitches are captured at the quantized
    /// step; either way they are auditioned on the active track.
    pub fn note_on(&mut self, pitch: Pitch, now: Instant) -> Result<Response> {
        let track = self.active_id()?;
        let pitches = self.expand_key_press(pitch);
        let triggers = self.audition(track, &pitches);

        if self.scheduler.state() != TransportState::Recording {
            return Ok(Response::applied().with_triggers(triggers));
        }

        let bpm = self.scheduler.bpm();
        let total_steps = self.scheduler.total_steps();
        let velocity = self.config.default_velocity;
        let mut step = 0;
        for &p in &pitches {
            if let Some(s) = self.recorder.capture(now, p, velocity, bpm, total_steps) {
                step = s;
            }
        }
        Ok(Response::new(Signal::Captured { step }).with_triggers(triggers))
    }

    /// Play, or stop when already playing
    pub fn play_toggle(&mut self) -> Response {
        let before = self.scheduler.state();
        match self.scheduler.play() {
            Some(token) => Response::new(Signal::Started(token)),
            None if before == TransportState::Playing => Response::new(Signal::Stopped).silenced(),
            None => Response::new(Signal::Ignored),
        }
    }

    /// Stop the transport; while recording this also commits the take
    pub fn stop(&mut self) -> Result<Response> {
        match self.scheduler.state() {
            TransportState::Recording => self.stop_recording(),
            TransportState::Playing => {
                self.scheduler.stop();
                Ok(Response::new(Signal::Stopped).silenced())
            }
            TransportState::Stopped => Ok(Response::new(Signal::Ignored).silenced()),
        }
    }

    pub fn start_recording(&mut self, now: Instant) -> Response {
        match self.scheduler.record() {
            Some(token) => {
                self.recorder.begin(now);
                Response::new(Signal::Started(token))
            }
            None => Response::new(Signal::Ignored),
        }
    }

    /// Recording -> Stopped, flushing captured notes to the active track as a
    /// single undoable edit
    pub fn stop_recording(&mut self) -> Result<Response> {
        if self.scheduler.state() != TransportState::Recording {
            return Ok(Response::new(Signal::Ignored));
        }
        // Keep the take (and keep recording) while there is no track to write it to
        if !self.recorder.captured().is_empty() {
            self.active_id()?;
        }
        self.scheduler.stop();
        let take = self.recorder.finish();
        if take.is_empty() {
            info!("Recording stopped, nothing recorded");
            return Ok(Response::new(Signal::NothingRecorded).silenced());
        }

        let track = self.active_id()?;
        let mut ids = Vec::with_capacity(take.len());
        for note in &take {
            ids.push(self.doc.add_note(track, note.pitch, note.step as f64, note.velocity, MIN_LENGTH)?);
        }
        self.selection = Selection::from_ids(ids.iter().copied());
        self.commit(track)?;
        info!("Recorded {} notes on track {}", ids.len(), track.0);
        Ok(Response::new(Signal::Recorded { notes: ids.len() }).silenced())
    }

    /// One scheduler tick; `None` when the token is stale
    pub fn tick(&mut self, token: TickToken) -> Option<Vec<NoteTrigger>> {
        self.scheduler.tick(token, &self.doc)
    }

    pub fn set_bpm(&mut self, bpm: f64) -> f64 {
        let applied = self.scheduler.set_bpm(bpm);
        if applied != bpm {
            warn!("BPM {} clamped to {}", bpm, applied);
        }
        applied
    }

    pub fn set_total_steps(&mut self, total_steps: usize) {
        self.scheduler.set_total_steps(total_steps);
    }

    // ------------------------------------------------------------------------
    // History, selection, clipboard, transforms
    // ------------------------------------------------------------------------

    pub fn undo(&mut self) -> Result<Signal> {
        let track = self.active_id()?;
        let Some(notes) = self.histories.get_mut(&track).and_then(|h| h.undo()).map(<[_]>::to_vec) else {
            return Ok(Signal::NothingToUndo);
        };
        self.doc.replace_notes(track, notes)?;
        self.selection.retain_existing(&self.doc.track(track)?.notes);
        debug!("Undo on track {}", track.0);
        Ok(Signal::Applied)
    }

    pub fn redo(&mut self) -> Result<Signal> {
        let track = self.active_id()?;
        let Some(notes) = self.histories.get_mut(&track).and_then(|h| h.redo()).map(<[_]>::to_vec) else {
            return Ok(Signal::NothingToRedo);
        };
        self.doc.replace_notes(track, notes)?;
        self.selection.retain_existing(&self.doc.track(track)?.notes);
        debug!("Redo on track {}", track.0);
        Ok(Signal::Applied)
    }

    /// Returns the selection size afterwards
    pub fn select_box(&mut self, region: SelectionBox, additive: bool) -> Result<usize> {
        let track = self.active_id()?;
        self.selection.apply_box(&region, &self.doc.track(track)?.notes, additive);
        Ok(self.selection.len())
    }

    pub fn select_all(&mut self) -> Result<usize> {
        let track = self.active_id()?;
        self.selection = Selection::from_ids(self.doc.track(track)?.notes.iter().map(|n| n.id));
        Ok(self.selection.len())
    }

    pub fn select_notes(&mut self, ids: impl IntoIterator<Item = NoteId>) {
        self.selection = Selection::from_ids(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn copy(&mut self) -> Result<Signal> {
        if self.selection.is_empty() {
            return Ok(Signal::NothingSelected);
        }
        let track = self.doc.track(self.active_id()?)?;
        self.clipboard.copy(self.selection.selected(&track.notes));
        debug!("Copied {} notes", self.clipboard.len());
        Ok(Signal::Applied)
    }

    /// Paste so the earliest copied note lands on `at_step`; the pasted notes
    /// become the selection
    pub fn paste(&mut self, at_step: f64) -> Result<Signal> {
        if self.clipboard.is_empty() {
            return Ok(Signal::ClipboardEmpty);
        }
        let track = self.active_id()?;
        self.doc.track(track)?;
        let at_step = self.snapped(at_step);

        let pasted = self.clipboard.paste(at_step, || self.doc.next_note_id());
        let ids: Vec<NoteId> = pasted.iter().map(|n| n.id).collect();
        let target = self.doc.track_mut(track)?;
        for note in pasted {
            target.insert_note(note);
        }
        self.selection = Selection::from_ids(ids.iter().copied());
        self.commit(track)?;
        Ok(Signal::NotesAdded(ids))
    }

    pub fn delete_selection(&mut self) -> Result<Signal> {
        if self.selection.is_empty() {
            return Ok(Signal::NothingSelected);
        }
        let track = self.active_id()?;
        let selection = std::mem::take(&mut self.selection);
        self.doc
            .track_mut(track)?
            .notes
            .retain(|n| !selection.contains(n.id));
        self.commit(track)?;
        Ok(Signal::Applied)
    }

    /// Apply a transform to the selection as one undoable edit
    pub fn apply(&mut self, transform: Transform) -> Result<Signal> {
        if let Transform::Arpeggiate { step_spacing, .. } = transform {
            if !(step_spacing.is_finite() && step_spacing > 0.0) {
                return Err(StepchordError::InvalidRange(format!("arpeggio spacing {step_spacing}")));
            }
        }
        if self.selection.is_empty() {
            return Ok(Signal::NothingSelected);
        }
        let track = self.active_id()?;
        let before = self.doc.track(track)?.notes.clone();
        let after = transform.apply(&before, &self.selection, self.snap, &mut self.rng, || {
            self.doc.next_note_id()
        });

        // Notes the transform created (arpeggio repeats) join the selection
        for note in after.iter().filter(|n| !before.iter().any(|b| b.id == n.id)) {
            self.selection.insert(note.id);
        }
        self.doc.replace_notes(track, after)?;
        self.selection.retain_existing(&self.doc.track(track)?.notes);
        self.commit(track)?;
        debug!("{} applied to {} notes", transform.name(), self.selection.len());
        Ok(Signal::Applied)
    }

    pub fn set_snap(&mut self, unit: SnapUnit) -> Result<()> {
        if !unit.is_valid() {
            return Err(StepchordError::InvalidRange(format!("snap unit {}", unit.0)));
        }
        self.snap = unit;
        self.snap_enabled = true;
        Ok(())
    }

    pub fn toggle_snap(&mut self) -> bool {
        self.snap_enabled = !self.snap_enabled;
        self.snap_enabled
    }

    // ------------------------------------------------------------------------
    // Command dispatch
    // ------------------------------------------------------------------------

    pub fn handle(&mut self, command: Command, now: Instant) -> Result<Response> {
        debug!("Command {:?}", command);
        let signal = match command {
            Command::CreateTrack { name, instrument_id } => Signal::TrackCreated(self.create_track(name, instrument_id)),
            Command::SelectTrack(id) => self.select_track(id).map(|_| Signal::Applied)?,
            Command::DuplicateTrack(id) => Signal::TrackCreated(self.duplicate_track(id)?),
            Command::RemoveTrack(id) => self.remove_track(id).map(|_| Signal::Applied)?,
            Command::RenameTrack { track, name } => self.rename_track(track, name).map(|_| Signal::Applied)?,
            Command::SetMute { track, muted } => self.set_mute(track, muted).map(|_| Signal::Applied)?,
            Command::SetSolo { track, solo } => self.set_solo(track, solo).map(|_| Signal::Applied)?,
            Command::SetVolume { track, volume } => self.set_volume(track, volume).map(|_| Signal::Applied)?,
            Command::SetPan { track, pan } => self.set_pan(track, pan).map(|_| Signal::Applied)?,

            Command::AddNote { pitch, step } => {
                let id = self.add_note(pitch, step)?;
                let triggers = self.audition(self.active_id()?, &[pitch]);
                let response = Response::new(Signal::NotesAdded(vec![id]));
                return Ok(if self.scheduler.is_running() { response } else { response.with_triggers(triggers) });
            }
            Command::RemoveNote(id) => match self.remove_note(id)? {
                true => Signal::Applied,
                false => Signal::Ignored,
            },
            Command::MoveNote { id, step, pitch } => self.move_note(id, step, pitch).map(|_| Signal::Applied)?,
            Command::ResizeNote { id, length } => self.resize_note(id, length).map(|_| Signal::Applied)?,
            Command::ClearRegion { from, to } => match self.clear_region(from, to)? {
                0 => Signal::Ignored,
                _ => Signal::Applied,
            },
            Command::NoteOn(pitch) => return self.note_on(pitch, now),

            Command::SetKey(key) => {
                self.set_key(key);
                Signal::Applied
            }
            Command::SetProgression(name) => self.set_progression(&name).map(|_| Signal::Applied)?,
            Command::SetInversion(i) => self.set_inversion(i).map(|_| Signal::Applied)?,
            Command::ToggleChordMode => {
                self.toggle_chord_mode();
                Signal::Applied
            }
            Command::InsertChord { symbol, step, octave } => Signal::NotesAdded(self.insert_chord(&symbol, step, octave)?),
            Command::InsertProgression { step, octave, steps_per_chord } => {
                Signal::NotesAdded(self.insert_progression(step, octave, steps_per_chord)?)
            }

            Command::PlayToggle => return Ok(self.play_toggle()),
            Command::Stop => return self.stop(),
            Command::StartRecording => return Ok(self.start_recording(now)),
            Command::StopRecording => return self.stop_recording(),
            Command::SetBpm(bpm) => {
                self.set_bpm(bpm);
                Signal::Applied
            }

            Command::Undo => self.undo()?,
            Command::Redo => self.redo()?,
            Command::SelectBox { region, additive } => self.select_box(region, additive).map(|_| Signal::Applied)?,
            Command::SelectAll => self.select_all().map(|_| Signal::Applied)?,
            Command::ClearSelection => {
                self.clear_selection();
                Signal::Applied
            }
            Command::Copy => self.copy()?,
            Command::Paste { at_step } => self.paste(at_step)?,
            Command::DeleteSelection => self.delete_selection()?,
            Command::Apply(transform) => self.apply(transform)?,
            Command::SetSnap(unit) => self.set_snap(unit).map(|_| Signal::Applied)?,
            Command::ToggleSnap => {
                self.toggle_snap();
                Signal::Applied
            }
        };
        Ok(Response::new(signal))
    }
}
