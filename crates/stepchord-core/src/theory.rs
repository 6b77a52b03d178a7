//! Music theory tables: scales, diatonic chords, circle of fifths, progressions
//!
//! Everything here is read-only data built once on first use and shared by
//! reference through [`tables`].

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StepchordError};
use crate::pitch::{Pitch, PitchClass};

// ============================================================================
// Scale and Chord Types
// ============================================================================

/// Scale modes carried by every key table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Major,
    Minor,
}

impl Mode {
    /// Scale intervals (semitones from tonic)
    pub fn intervals(&self) -> &'static [u8; 7] {
        match self {
            Self::Major => &[0, 2, 4, 5, 7, 9, 11],
            Self::Minor => &[0, 2, 3, 5, 7, 8, 10],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::Minor => "Minor",
        }
    }
}

/// Chord quality, as built from Roman numerals and recognised by detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Major7,
    Minor7,
    Dominant7,
    Diminished7,
    HalfDiminished7,
    Sus2,
    Sus4,
}

impl ChordQuality {
    /// Every quality, in the order detection tries them
    pub const ALL: [ChordQuality; 11] = [
        Self::Major, Self::Minor, Self::Diminished, Self::Augmented,
        Self::Major7, Self::Minor7, Self::Dominant7, Self::Diminished7,
        Self::HalfDiminished7, Self::Sus4, Self::Sus2,
    ];

    /// Chord intervals from root
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Self::Major => &[0, 4, 7],
            Self::Minor => &[0, 3, 7],
            Self::Diminished => &[0, 3, 6],
            Self::Augmented => &[0, 4, 8],
            Self::Major7 => &[0, 4, 7, 11],
            Self::Minor7 => &[0, 3, 7, 10],
            Self::Dominant7 => &[0, 4, 7, 10],
            Self::Diminished7 => &[0, 3, 6, 9],
            Self::HalfDiminished7 => &[0, 3, 6, 10],
            Self::Sus2 => &[0, 2, 7],
            Self::Sus4 => &[0, 5, 7],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::Minor => "Minor",
            Self::Diminished => "Diminished",
            Self::Augmented => "Augmented",
            Self::Major7 => "Major 7th",
            Self::Minor7 => "Minor 7th",
            Self::Dominant7 => "Dominant 7th",
            Self::Diminished7 => "Diminished 7th",
            Self::HalfDiminished7 => "Half-Diminished 7th",
            Self::Sus2 => "Sus2",
            Self::Sus4 => "Sus4",
        }
    }
}

/// Roman-numeral symbols: (symbol, scale degree, mode the degree is taken from, quality)
const NUMERALS: &[(&str, usize, Mode, ChordQuality)] = &[
    ("I", 0, Mode::Major, ChordQuality::Major),
    ("ii", 1, Mode::Major, ChordQuality::Minor),
    ("iii", 2, Mode::Major, ChordQuality::Minor),
    ("IV", 3, Mode::Major, ChordQuality::Major),
    ("V", 4, Mode::Major, ChordQuality::Major),
    ("vi", 5, Mode::Major, ChordQuality::Minor),
    ("vii°", 6, Mode::Major, ChordQuality::Diminished),
    ("Imaj7", 0, Mode::Major, ChordQuality::Major7),
    ("ii7", 1, Mode::Major, ChordQuality::Minor7),
    ("iii7", 2, Mode::Major, ChordQuality::Minor7),
    ("IVmaj7", 3, Mode::Major, ChordQuality::Major7),
    ("V7", 4, Mode::Major, ChordQuality::Dominant7),
    ("vi7", 5, Mode::Major, ChordQuality::Minor7),
    ("viiø7", 6, Mode::Major, ChordQuality::HalfDiminished7),
    // Parallel minor
    ("i", 0, Mode::Minor, ChordQuality::Minor),
    ("ii°", 1, Mode::Minor, ChordQuality::Diminished),
    ("III", 2, Mode::Minor, ChordQuality::Major),
    ("iv", 3, Mode::Minor, ChordQuality::Minor),
    ("v", 4, Mode::Minor, ChordQuality::Minor),
    ("VI", 5, Mode::Minor, ChordQuality::Major),
    ("VII", 6, Mode::Minor, ChordQuality::Major),
    ("i7", 0, Mode::Minor, ChordQuality::Minor7),
    ("IIImaj7", 2, Mode::Minor, ChordQuality::Major7),
    ("iv7", 3, Mode::Minor, ChordQuality::Minor7),
    ("v7", 4, Mode::Minor, ChordQuality::Minor7),
    ("VImaj7", 5, Mode::Minor, ChordQuality::Major7),
    ("VII7", 6, Mode::Minor, ChordQuality::Dominant7),
];

/// Accept ASCII spellings of the degree signs
fn normalize_symbol(symbol: &str) -> String {
    let symbol = symbol.trim();
    if let Some(stem) = symbol.strip_suffix("dim") {
        return format!("{stem}°");
    }
    if let Some(stem) = symbol.strip_suffix("m7b5") {
        return format!("{stem}ø7");
    }
    if let Some(stem) = symbol.strip_suffix('o') {
        return format!("{stem}°");
    }
    symbol.to_string()
}

// ============================================================================
// Key Tables
// ============================================================================

/// Immutable reference record for one tonic
#[derive(Debug, Clone)]
pub struct KeyTable {
    pub tonic: PitchClass,
    /// Diatonic major scale
    pub major: [PitchClass; 7],
    /// Parallel natural minor scale
    pub minor: [PitchClass; 7],
    chords: BTreeMap<&'static str, Vec<PitchClass>>,
}

impl KeyTable {
    fn build(tonic: PitchClass) -> Self {
        let major = Self::scale(tonic, Mode::Major);
        let minor = Self::scale(tonic, Mode::Minor);

        let chords = NUMERALS
            .iter()
            .map(|&(symbol, degree, mode, quality)| {
                let root = match mode {
                    Mode::Major => major[degree],
                    Mode::Minor => minor[degree],
                };
                let notes = quality
                    .intervals()
                    .iter()
                    .map(|&i| root.transpose(i as i32))
                    .collect();
                (symbol, notes)
            })
            .collect();

        Self { tonic, major, minor, chords }
    }

    fn scale(tonic: PitchClass, mode: Mode) -> [PitchClass; 7] {
        let intervals = mode.intervals();
        std::array::from_fn(|i| tonic.transpose(intervals[i] as i32))
    }

    /// Diatonic note set for a mode
    pub fn scale_notes(&self, mode: Mode) -> &[PitchClass; 7] {
        match mode {
            Mode::Major => &self.major,
            Mode::Minor => &self.minor,
        }
    }

    pub fn contains(&self, class: PitchClass, mode: Mode) -> bool {
        self.scale_notes(mode).contains(&class)
    }

    /// Ordered chord tones for a Roman-numeral symbol
    pub fn chord(&self, symbol: &str) -> Option<&[PitchClass]> {
        self.chords.get(normalize_symbol(symbol).as_str()).map(Vec::as_slice)
    }

    /// Every symbol this key defines
    pub fn symbols(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.chords.keys().copied()
    }

    /// Snap a pitch to the nearest scale tone; ties resolve downward
    pub fn quantize(&self, pitch: Pitch, mode: Mode) -> Pitch {
        let midi = pitch.midi();
        for distance in 0..12 {
            for candidate in [midi - distance, midi + distance] {
                if self.contains(PitchClass::from_index(candidate), mode) {
                    return Pitch::from_midi(candidate);
                }
            }
        }
        pitch
    }
}

/// Ordered chord symbols plus a default key; a template, not tied to a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordProgression {
    pub name: String,
    pub symbols: Vec<String>,
    pub default_key: PitchClass,
}

impl ChordProgression {
    pub fn new(name: impl Into<String>, symbols: &[&str], default_key: PitchClass) -> Self {
        Self {
            name: name.into(),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            default_key,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// All theory data
#[derive(Debug)]
pub struct TheoryTables {
    keys: Vec<KeyTable>,
    progressions: Vec<ChordProgression>,
}

impl TheoryTables {
    fn build() -> Self {
        let keys = PitchClass::ALL.iter().map(|&pc| KeyTable::build(pc)).collect();
        let progressions = vec![
            ChordProgression::new("pop", &["I", "V", "vi", "IV"], PitchClass::C),
            ChordProgression::new("fifties", &["I", "vi", "IV", "V"], PitchClass::C),
            ChordProgression::new("jazz", &["ii7", "V7", "Imaj7"], PitchClass::C),
            ChordProgression::new("blues", &["I", "IV", "I", "V"], PitchClass::A),
            ChordProgression::new("minor-pop", &["i", "VI", "III", "VII"], PitchClass::A),
            ChordProgression::new("sad", &["vi", "IV", "I", "V"], PitchClass::G),
        ];
        Self { keys, progressions }
    }

    pub fn key(&self, tonic: PitchClass) -> &KeyTable {
        &self.keys[tonic.index() as usize]
    }

    /// Keys in circle-of-fifths order starting at C
    pub fn circle_of_fifths(&self) -> impl Iterator<Item = &KeyTable> {
        CIRCLE_OF_FIFTHS.iter().map(|&pc| self.key(pc))
    }

    /// Chord tones for (key name, symbol)
    pub fn chord_notes(&self, key: &str, symbol: &str) -> Result<&[PitchClass]> {
        let unknown = || StepchordError::UnknownChord {
            key: key.to_string(),
            symbol: symbol.to_string(),
        };
        let tonic: PitchClass = key.parse().map_err(|_| unknown())?;
        self.key(tonic).chord(symbol).ok_or_else(unknown)
    }

    pub fn progressions(&self) -> &[ChordProgression] {
        &self.progressions
    }

    pub fn progression(&self, name: &str) -> Result<&ChordProgression> {
        self.progressions
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| StepchordError::UnknownProgression(name.to_string()))
    }
}

/// The 12 keys ordered by ascending fifths
pub const CIRCLE_OF_FIFTHS: [PitchClass; 12] = [
    PitchClass::C, PitchClass::G, PitchClass::D, PitchClass::A,
    PitchClass::E, PitchClass::B, PitchClass::Fs, PitchClass::Cs,
    PitchClass::Gs, PitchClass::Ds, PitchClass::As, PitchClass::F,
];

static TABLES: LazyLock<TheoryTables> = LazyLock::new(TheoryTables::build);

/// Shared theory tables
pub fn tables() -> &'static TheoryTables {
    &TABLES
}

#[cfg(test)]
mod tests {
    use super::*;
    use PitchClass::*;

    #[test]
    fn test_c_major_diatonic_chords() {
        let t = tables();
        assert_eq!(t.chord_notes("C", "I").unwrap(), &[C, E, G]);
        assert_eq!(t.chord_notes("C", "ii").unwrap(), &[D, F, A]);
        assert_eq!(t.chord_notes("C", "vii°").unwrap(), &[B, D, F]);
        assert_eq!(t.chord_notes("C", "V7").unwrap(), &[G, B, D, F]);
    }

    #[test]
    fn test_parallel_minor_symbols() {
        let t = tables();
        assert_eq!(t.chord_notes("A", "i").unwrap(), &[A, C, E]);
        assert_eq!(t.chord_notes("C", "III").unwrap(), &[Ds, G, As]);
        assert_eq!(t.chord_notes("C", "VII").unwrap(), &[As, D, F]);
    }

    #[test]
    fn test_ascii_degree_spellings() {
        let t = tables();
        assert_eq!(t.chord_notes("C", "viio").unwrap(), t.chord_notes("C", "vii°").unwrap());
        assert_eq!(t.chord_notes("C", "viidim").unwrap(), &[B, D, F]);
        assert_eq!(t.chord_notes("C", "viim7b5").unwrap(), &[B, D, F, A]);
    }

    #[test]
    fn test_unknown_chord() {
        let t = tables();
        assert!(matches!(t.chord_notes("C", "IX"), Err(StepchordError::UnknownChord { .. })));
        assert!(matches!(t.chord_notes("Q", "I"), Err(StepchordError::UnknownChord { .. })));
    }

    #[test]
    fn test_circle_of_fifths_visits_every_key_once() {
        let mut seen: Vec<PitchClass> = CIRCLE_OF_FIFTHS.to_vec();
        for pair in CIRCLE_OF_FIFTHS.windows(2) {
            assert_eq!(pair[1].interval_from(pair[0]), 7);
        }
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 12);
    }

    #[test]
    fn test_scales() {
        let g = tables().key(G);
        assert_eq!(g.major, [G, A, B, C, D, E, Fs]);
        assert!(g.contains(Fs, Mode::Major));
        assert!(!g.contains(F, Mode::Major));
        assert!(g.contains(F, Mode::Minor));
    }

    #[test]
    fn test_quantize_to_key() {
        let c = tables().key(C);
        assert_eq!(c.quantize(Pitch::new(Cs, 4), Mode::Major), Pitch::new(C, 4));
        assert_eq!(c.quantize(Pitch::new(Fs, 4), Mode::Major), Pitch::new(F, 4));
        assert_eq!(c.quantize(Pitch::new(E, 4), Mode::Major), Pitch::new(E, 4));
    }

    #[test]
    fn test_progression_library() {
        let t = tables();
        let pop = t.progression("POP").unwrap();
        assert_eq!(pop.symbols, vec!["I", "V", "vi", "IV"]);
        for progression in t.progressions() {
            for symbol in &progression.symbols {
                assert!(t.key(progression.default_key).chord(symbol).is_some());
            }
        }
        assert!(t.progression("nope").is_err());
    }
}
