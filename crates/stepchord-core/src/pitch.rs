//! Pitch classes, octaves and piano-row geometry

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StepchordError};

/// Note names in semitone order, sharps only
pub const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Lowest and highest octave on the piano roll
pub const MIN_OCTAVE: i8 = 0;
pub const MAX_OCTAVE: i8 = 8;

/// Rows on the piano roll, one per semitone from C0 to B8
pub const PIANO_ROWS: usize = ((MAX_OCTAVE - MIN_OCTAVE + 1) as usize) * 12;

/// One of the 12 semitone names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    #[serde(rename = "C#")]
    Cs,
    D,
    #[serde(rename = "D#")]
    Ds,
    E,
    F,
    #[serde(rename = "F#")]
    Fs,
    G,
    #[serde(rename = "G#")]
    Gs,
    A,
    #[serde(rename = "A#")]
    As,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        Self::C, Self::Cs, Self::D, Self::Ds, Self::E, Self::F,
        Self::Fs, Self::G, Self::Gs, Self::A, Self::As, Self::B,
    ];

    /// Semitone index, C = 0
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Pitch class for any semitone count (wraps modulo 12, negatives included)
    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.rem_euclid(12) as usize]
    }

    pub fn name(self) -> &'static str {
        NOTE_NAMES[self.index() as usize]
    }

    /// Shift by semitones, wrapping within the octave
    pub fn transpose(self, semitones: i32) -> Self {
        Self::from_index(self.index() as i32 + semitones)
    }

    /// Ascending distance in semitones from `root` to `self` (0..12)
    pub fn interval_from(self, root: PitchClass) -> u8 {
        (self.index() as i32 - root.index() as i32).rem_euclid(12) as u8
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PitchClass {
    type Err = StepchordError;

    /// Accepts sharp and flat spellings ("C#", "Db", "Bb", "E#")
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars.next().map(|c| c.to_ascii_uppercase());
        let base: i32 = match letter {
            Some('C') => 0,
            Some('D') => 2,
            Some('E') => 4,
            Some('F') => 5,
            Some('G') => 7,
            Some('A') => 9,
            Some('B') => 11,
            _ => return Err(StepchordError::InvalidRange(format!("unknown pitch class '{s}'"))),
        };
        let accidental: i32 = match chars.as_str() {
            "" => 0,
            "#" | "♯" => 1,
            "b" | "♭" => -1,
            _ => return Err(StepchordError::InvalidRange(format!("unknown pitch class '{s}'"))),
        };
        Ok(Self::from_index(base + accidental))
    }
}

/// A pitch class in a specific octave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pitch {
    pub class: PitchClass,
    pub octave: i8,
}

impl Pitch {
    pub fn new(class: PitchClass, octave: i8) -> Self {
        Self { class, octave }
    }

    /// MIDI-style number: `(octave + 1) * 12 + index` (C4 = 60)
    pub fn midi(self) -> i32 {
        (self.octave as i32 + 1) * 12 + self.class.index() as i32
    }

    /// Decompose a MIDI-style number back into pitch class and octave
    pub fn from_midi(midi: i32) -> Self {
        Self {
            class: PitchClass::from_index(midi),
            octave: (midi.div_euclid(12) - 1).clamp(i8::MIN as i32, i8::MAX as i32) as i8,
        }
    }

    /// Same pitch class with the octave held to the piano range
    pub fn clamped(self) -> Self {
        Self {
            class: self.class,
            octave: self.octave.clamp(MIN_OCTAVE, MAX_OCTAVE),
        }
    }

    /// Absolute pitch used for ordering: `octave * 12 + index`
    pub fn absolute(self) -> i32 {
        self.octave as i32 * 12 + self.class.index() as i32
    }

    /// Piano-roll row; row 0 is B8 at the top, rows grow downward to C0
    pub fn piano_row(self) -> i32 {
        (MAX_OCTAVE as i32 - self.octave as i32) * 12 + (11 - self.class.index() as i32)
    }

    /// Inverse of [`Pitch::piano_row`]
    pub fn from_piano_row(row: i32) -> Self {
        let octave = MAX_OCTAVE as i32 - row.div_euclid(12);
        let class = PitchClass::from_index(11 - row.rem_euclid(12));
        Self { class, octave: octave as i8 }
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class, self.octave)
    }
}

impl FromStr for Pitch {
    type Err = StepchordError;

    /// Parses "C4", "F#3", "Bb-1"-style names
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s
            .char_indices()
            .find(|&(i, c)| i > 0 && (c.is_ascii_digit() || c == '-'))
            .map(|(i, _)| i)
            .ok_or_else(|| StepchordError::InvalidRange(format!("missing octave in '{s}'")))?;
        let class: PitchClass = s[..split].parse()?;
        let octave: i8 = s[split..]
            .parse()
            .map_err(|_| StepchordError::InvalidRange(format!("bad octave in '{s}'")))?;
        Ok(Self::new(class, octave))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sharps_and_flats() {
        assert_eq!("C#".parse::<PitchClass>().unwrap(), PitchClass::Cs);
        assert_eq!("Db".parse::<PitchClass>().unwrap(), PitchClass::Cs);
        assert_eq!("Bb".parse::<PitchClass>().unwrap(), PitchClass::As);
        assert_eq!("Cb".parse::<PitchClass>().unwrap(), PitchClass::B);
        assert!("H".parse::<PitchClass>().is_err());
        assert!("C##".parse::<PitchClass>().is_err());
    }

    #[test]
    fn test_midi_round_trip() {
        let c4 = Pitch::new(PitchClass::C, 4);
        assert_eq!(c4.midi(), 60);
        assert_eq!(Pitch::from_midi(60), c4);
        assert_eq!(Pitch::from_midi(11), Pitch::new(PitchClass::B, -1));
    }

    #[test]
    fn test_piano_rows() {
        assert_eq!(Pitch::new(PitchClass::B, 8).piano_row(), 0);
        assert_eq!(Pitch::new(PitchClass::C, 0).piano_row(), PIANO_ROWS as i32 - 1);
        let e3 = Pitch::new(PitchClass::E, 3);
        assert_eq!(Pitch::from_piano_row(e3.piano_row()), e3);
        // Higher pitch sits on a lower row
        assert!(Pitch::new(PitchClass::D, 4).piano_row() < Pitch::new(PitchClass::C, 4).piano_row());
    }

    #[test]
    fn test_parse_pitch() {
        assert_eq!("F#3".parse::<Pitch>().unwrap(), Pitch::new(PitchClass::Fs, 3));
        assert_eq!("eb5".parse::<Pitch>().unwrap(), Pitch::new(PitchClass::Ds, 5));
        assert!("C".parse::<Pitch>().is_err());
    }
}
