//! Batch transforms over the selected notes of a track
//!
//! Each transform reads a note collection and returns a new one; unselected
//! notes pass through untouched.

use serde::{Deserialize, Serialize};

use crate::chord::{arpeggiate, ArpMode};
use crate::note::{clamp_velocity, Note, NoteId};
use crate::pitch::{Pitch, PitchClass, MAX_OCTAVE, MIN_OCTAVE};
use crate::selection::Selection;
use crate::theory::{tables, Mode};

/// Maximum velocity swing at 100% humanize
const HUMANIZE_VELOCITY_RANGE: f64 = 40.0;

/// Grid resolution for snapping, in steps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapUnit(pub f64);

impl SnapUnit {
    pub const STEP: SnapUnit = SnapUnit(1.0);
    pub const HALF_STEP: SnapUnit = SnapUnit(0.5);
    pub const QUARTER_STEP: SnapUnit = SnapUnit(0.25);

    pub fn is_valid(&self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }
}

impl Default for SnapUnit {
    fn default() -> Self {
        Self::STEP
    }
}

/// Round `step` to the nearest multiple of `unit`
pub fn snap_to_grid(step: f64, unit: SnapUnit) -> f64 {
    if !unit.is_valid() {
        return step;
    }
    (step / unit.0).round() * unit.0
}

/// Shift by semitones; the octave is clamped to the piano range and the
/// resulting pitch class kept
pub fn transpose_pitch(pitch: Pitch, semitones: i32) -> Pitch {
    let midi = pitch.midi().saturating_add(semitones);
    let octave = (midi.div_euclid(12) - 1).clamp(MIN_OCTAVE as i32, MAX_OCTAVE as i32);
    Pitch::new(PitchClass::from_index(midi), octave as i8)
}

fn map_selected(notes: &[Note], selection: &Selection, mut f: impl FnMut(&mut Note)) -> Vec<Note> {
    notes
        .iter()
        .map(|n| {
            let mut n = *n;
            if selection.contains(n.id) {
                f(&mut n);
            }
            n
        })
        .collect()
}

pub fn transpose(notes: &[Note], selection: &Selection, semitones: i32) -> Vec<Note> {
    map_selected(notes, selection, |n| n.set_pitch(transpose_pitch(n.pitch(), semitones)))
}

/// Random step and velocity drift; 0% leaves every note untouched
pub fn humanize(notes: &[Note], selection: &Selection, amount_percent: f64, rng: &mut fastrand::Rng) -> Vec<Note> {
    let amount = amount_percent.clamp(0.0, 100.0) / 100.0;
    if amount == 0.0 {
        return notes.to_vec();
    }

    map_selected(notes, selection, |n| {
        let step_drift = (rng.f64() * 2.0 - 1.0) * amount;
        let velocity_drift = (rng.f64() * 2.0 - 1.0) * amount * HUMANIZE_VELOCITY_RANGE;
        n.step = (n.step + step_drift).max(0.0);
        n.velocity = clamp_velocity(n.velocity as i32 + velocity_drift.round() as i32);
    })
}

/// Delay notes on odd (off-beat) grid steps by up to half a step
pub fn swing(notes: &[Note], selection: &Selection, swing_percent: f64) -> Vec<Note> {
    let offset = swing_percent.clamp(0.0, 100.0) / 100.0 * 0.5;
    map_selected(notes, selection, |n| {
        if n.step.fract() == 0.0 && (n.step as u64) % 2 == 1 {
            n.step += offset;
        }
    })
}

pub fn quantize(notes: &[Note], selection: &Selection, unit: SnapUnit) -> Vec<Note> {
    map_selected(notes, selection, |n| n.step = snap_to_grid(n.step, unit).max(0.0))
}

pub fn set_velocity(notes: &[Note], selection: &Selection, velocity: i32) -> Vec<Note> {
    let velocity = clamp_velocity(velocity);
    map_selected(notes, selection, |n| n.velocity = velocity)
}

/// Move each selected note to the nearest tone of a key's scale
pub fn fit_to_key(notes: &[Note], selection: &Selection, key: PitchClass, mode: Mode) -> Vec<Note> {
    let table = tables().key(key);
    map_selected(notes, selection, |n| {
        let fitted = table.quantize(n.pitch(), mode);
        n.set_pitch(transpose_pitch(fitted, 0));
    })
}

/// Replace the selected notes with their arpeggiated sequence
pub fn arpeggiate_selected(
    notes: &[Note],
    selection: &Selection,
    mode: ArpMode,
    step_spacing: f64,
    rng: &mut fastrand::Rng,
    fresh_id: impl FnMut() -> NoteId,
) -> Vec<Note> {
    let (selected, mut rest): (Vec<Note>, Vec<Note>) =
        notes.iter().partition(|n| selection.contains(n.id));
    rest.extend(arpeggiate(&selected, mode, step_spacing, rng, fresh_id));
    rest
}

/// Transform applied to the current selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Transform {
    Transpose { semitones: i32 },
    Humanize { amount_percent: f64 },
    Swing { swing_percent: f64 },
    Quantize,
    Arpeggiate { mode: ArpMode, step_spacing: f64 },
    SetVelocity { velocity: i32 },
    FitToKey { key: PitchClass, mode: Mode },
}

impl Transform {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transpose { .. } => "Transpose",
            Self::Humanize { .. } => "Humanize",
            Self::Swing { .. } => "Swing",
            Self::Quantize => "Quantize",
            Self::Arpeggiate { .. } => "Arpeggiate",
            Self::SetVelocity { .. } => "Velocity",
            Self::FitToKey { .. } => "Fit to key",
        }
    }

    pub fn apply(
        &self,
        notes: &[Note],
        selection: &Selection,
        snap: SnapUnit,
        rng: &mut fastrand::Rng,
        fresh_id: impl FnMut() -> NoteId,
    ) -> Vec<Note> {
        match *self {
            Self::Transpose { semitones } => transpose(notes, selection, semitones),
            Self::Humanize { amount_percent } => humanize(notes, selection, amount_percent, rng),
            Self::Swing { swing_percent } => swing(notes, selection, swing_percent),
            Self::Quantize => quantize(notes, selection, snap),
            Self::Arpeggiate { mode, step_spacing } => {
                arpeggiate_selected(notes, selection, mode, step_spacing, rng, fresh_id)
            }
            Self::SetVelocity { velocity } => set_velocity(notes, selection, velocity),
            Self::FitToKey { key, mode } => fit_to_key(notes, selection, key, mode),
        }
    }
}
