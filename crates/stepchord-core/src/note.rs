//! Notes placed on the step grid

use serde::{Deserialize, Serialize};

use crate::pitch::{Pitch, PitchClass};

/// Unique identifier for notes, stable across edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteId(pub u64);

pub const MIN_VELOCITY: u8 = 1;
pub const MAX_VELOCITY: u8 = 127;
pub const DEFAULT_VELOCITY: u8 = 100;

/// Shortest length a note may be resized to, in steps
pub const MIN_LENGTH: f64 = 1.0;

/// Clamp any integer velocity into 1..=127
pub fn clamp_velocity(velocity: i32) -> u8 {
    velocity.clamp(MIN_VELOCITY as i32, MAX_VELOCITY as i32) as u8
}

/// One musical event on a track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub pitch_class: PitchClass,
    /// Clamped to 0-8
    pub octave: i8,
    /// Grid position in steps; fractional values allowed
    pub step: f64,
    /// Length in steps
    pub length: f64,
    /// Always within 1..=127
    pub velocity: u8,
}

impl Note {
    /// Octave is clamped to 0-8, matching transpose
    pub fn new(id: NoteId, pitch: Pitch, step: f64, length: f64, velocity: u8) -> Self {
        let pitch = pitch.clamped();
        Self {
            id,
            pitch_class: pitch.class,
            octave: pitch.octave,
            step: step.max(0.0),
            length: length.max(MIN_LENGTH),
            velocity: clamp_velocity(velocity as i32),
        }
    }

    pub fn pitch(&self) -> Pitch {
        Pitch::new(self.pitch_class, self.octave)
    }

    pub fn set_pitch(&mut self, pitch: Pitch) {
        let pitch = pitch.clamped();
        self.pitch_class = pitch.class;
        self.octave = pitch.octave;
    }

    /// Step this note triggers on (fractional steps sound on their host step)
    pub fn trigger_step(&self) -> usize {
        self.step.floor().max(0.0) as usize
    }

    pub fn end_step(&self) -> f64 {
        self.step + self.length
    }
}
