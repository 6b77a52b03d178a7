//! Command objects dispatched through the session, decoupling input
//! sources (keyboard, grid, transport buttons) from document mutation

use crate::note::NoteId;
use crate::pitch::{Pitch, PitchClass};
use crate::playback::NoteTrigger;
use crate::selection::SelectionBox;
use crate::track::TrackId;
use crate::transform::{SnapUnit, Transform};
use crate::transport::TickToken;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Tracks
    CreateTrack { name: String, instrument_id: String },
    SelectTrack(TrackId),
    DuplicateTrack(TrackId),
    RemoveTrack(TrackId),
    RenameTrack { track: TrackId, name: String },
    SetMute { track: TrackId, muted: bool },
    SetSolo { track: TrackId, solo: bool },
    SetVolume { track: TrackId, volume: f32 },
    SetPan { track: TrackId, pan: f32 },

    // Notes on the active track
    AddNote { pitch: Pitch, step: f64 },
    RemoveNote(NoteId),
    MoveNote { id: NoteId, step: f64, pitch: Pitch },
    ResizeNote { id: NoteId, length: f64 },
    ClearRegion { from: f64, to: f64 },
    /// Keyboard press: records while recording, auditions otherwise
    NoteOn(Pitch),

    // Harmony
    SetKey(PitchClass),
    SetProgression(String),
    SetInversion(usize),
    ToggleChordMode,
    InsertChord { symbol: String, step: f64, octave: i8 },
    InsertProgression { step: f64, octave: i8, steps_per_chord: f64 },

    // Transport
    PlayToggle,
    Stop,
    StartRecording,
    StopRecording,
    SetBpm(f64),

    // Editing
    Undo,
    Redo,
    SelectBox { region: SelectionBox, additive: bool },
    SelectAll,
    ClearSelection,
    Copy,
    Paste { at_step: f64 },
    DeleteSelection,
    Apply(Transform),
    SetSnap(SnapUnit),
    ToggleSnap,
}

/// Informational outcome of a command; none of these are failures
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Applied,
    TrackCreated(TrackId),
    NotesAdded(Vec<NoteId>),
    /// Transport running; the clock should tick with this token
    Started(TickToken),
    Stopped,
    Captured { step: usize },
    Recorded { notes: usize },
    NothingRecorded,
    NothingSelected,
    ClipboardEmpty,
    NothingToUndo,
    NothingToRedo,
    /// Valid but had no effect in the current state
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub signal: Signal,
    /// Notes to sound now (audition)
    pub triggers: Vec<NoteTrigger>,
    /// Silence every sounding note and cancel the clock
    pub silence: bool,
}

impl Response {
    pub fn new(signal: Signal) -> Self {
        Self {
            signal,
            triggers: Vec::new(),
            silence: false,
        }
    }

    pub fn applied() -> Self {
        Self::new(Signal::Applied)
    }

    pub fn with_triggers(mut self, triggers: Vec<NoteTrigger>) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn silenced(mut self) -> Self {
        self.silence = true;
        self
    }
}
