//! Chord engine: build, invert, voice, detect and arpeggiate chords

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::note::{Note, NoteId};
use crate::pitch::{Pitch, PitchClass};
use crate::theory::{tables, ChordQuality};

/// Chord tones for a key and Roman-numeral symbol
pub fn build_chord(key: &str, symbol: &str) -> Result<Vec<PitchClass>> {
    Ok(tables().chord_notes(key, symbol)?.to_vec())
}

/// Rotate chord tones left; 0 = root position, wraps modulo chord size
pub fn invert(chord: &[PitchClass], inversion: usize) -> Vec<PitchClass> {
    let mut notes = chord.to_vec();
    if !notes.is_empty() {
        let len = notes.len();
        notes.rotate_left(inversion % len);
    }
    notes
}

/// Assign octaves so the voicing ascends from `base_octave`
pub fn voice(chord: &[PitchClass], base_octave: i8) -> Vec<Pitch> {
    let mut voiced: Vec<Pitch> = Vec::with_capacity(chord.len());
    for &class in chord {
        let mut pitch = Pitch::new(class, base_octave);
        if let Some(prev) = voiced.last() {
            while pitch.midi() <= prev.midi() {
                pitch.octave += 1;
            }
        }
        voiced.push(pitch);
    }
    voiced
}

// ============================================================================
// Detection
// ============================================================================

/// Result of chord detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChordLabel {
    Chord { root: PitchClass, quality: ChordQuality },
    SingleNote,
    Unknown,
}

impl ChordLabel {
    pub fn quality(&self) -> Option<ChordQuality> {
        match self {
            Self::Chord { quality, .. } => Some(*quality),
            _ => None,
        }
    }
}

impl fmt::Display for ChordLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chord { root, quality } => write!(f, "{} {}", root, quality.name()),
            Self::SingleNote => f.write_str("Single Note"),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

/// Identify a chord from pitch classes, ignoring octave and duplicates.
///
/// Intervals are taken from the lowest pitch class first; if that does not
/// match a known pattern each higher pitch class is tried as the root, so
/// inversions of diatonic chords still resolve.
pub fn detect_chord(classes: impl IntoIterator<Item = PitchClass>) -> ChordLabel {
    let mut distinct: Vec<PitchClass> = classes.into_iter().collect();
    distinct.sort();
    distinct.dedup();

    match distinct.len() {
        0 => return ChordLabel::Unknown,
        1 => return ChordLabel::SingleNote,
        _ => {}
    }

    for &root in &distinct {
        let mut intervals: Vec<u8> = distinct.iter().map(|pc| pc.interval_from(root)).collect();
        intervals.sort_unstable();

        if let Some(quality) = ChordQuality::ALL
            .iter()
            .find(|q| q.intervals() == intervals.as_slice())
        {
            return ChordLabel::Chord { root, quality: *quality };
        }
    }

    ChordLabel::Unknown
}

/// Detect over notes
pub fn detect_notes<'a>(notes: impl IntoIterator<Item = &'a Note>) -> ChordLabel {
    detect_chord(notes.into_iter().map(|n| n.pitch_class))
}

// ============================================================================
// Arpeggiator
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArpMode {
    #[default]
    Up,
    Down,
    UpDown,
    Random,
}

impl ArpMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::UpDown => "updown",
            Self::Random => "random",
        }
    }
}

/// Spread notes in time, one every `step_spacing` steps from the earliest step.
///
/// Pitch, length and velocity are preserved. `UpDown` revisits inner notes on
/// the way down; those repeats draw ids from `fresh_id`.
pub fn arpeggiate(
    notes: &[Note],
    mode: ArpMode,
    step_spacing: f64,
    rng: &mut fastrand::Rng,
    mut fresh_id: impl FnMut() -> NoteId,
) -> Vec<Note> {
    if notes.is_empty() {
        return Vec::new();
    }

    let base_step = notes.iter().map(|n| n.step).fold(f64::INFINITY, f64::min);

    let mut sorted = notes.to_vec();
    sorted.sort_by_key(|n| n.pitch().absolute());

    let mut sequence = match mode {
        ArpMode::Up => sorted,
        ArpMode::Down => {
            sorted.reverse();
            sorted
        }
        ArpMode::UpDown => {
            let mut down: Vec<Note> = if sorted.len() > 2 {
                sorted[1..sorted.len() - 1].iter().rev().copied().collect()
            } else {
                Vec::new()
            };
            for note in &mut down {
                note.id = fresh_id();
            }
            sorted.extend(down);
            sorted
        }
        ArpMode::Random => {
            rng.shuffle(&mut sorted);
            sorted
        }
    };

    for (i, note) in sequence.iter_mut().enumerate() {
        note.step = base_step + i as f64 * step_spacing;
    }
    sequence
}
