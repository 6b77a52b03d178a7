//! Track representation

use serde::{Deserialize, Serialize};

use crate::note::{Note, NoteId};

/// Unique identifier for tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(pub u64);

/// Display color, presentation only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackColor(pub u8, pub u8, pub u8);

impl Default for TrackColor {
    fn default() -> Self {
        Self(120, 160, 220)
    }
}

/// A named lane owning a set of notes keyed by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub instrument_id: String,
    /// Volume (0 to 100)
    pub volume: f32,
    /// Pan (-1.0 left, 0.0 center, 1.0 right)
    pub pan: f32,
    pub muted: bool,
    pub solo: bool,
    pub color: TrackColor,
    /// Kept in insertion order
    pub notes: Vec<Note>,
}

impl Track {
    pub fn new(id: TrackId, name: impl Into<String>, instrument_id: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            instrument_id: instrument_id.into(),
            volume: 80.0,
            pan: 0.0,
            muted: false,
            solo: false,
            color: TrackColor::default(),
            notes: Vec::new(),
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 100.0);
    }

    pub fn set_pan(&mut self, pan: f32) {
        self.pan = pan.clamp(-1.0, 1.0);
    }

    /// Insert or replace by id
    pub fn insert_note(&mut self, note: Note) {
        match self.note_mut(note.id) {
            Some(existing) => *existing = note,
            None => self.notes.push(note),
        }
    }

    pub fn remove_note(&mut self, id: NoteId) -> Option<Note> {
        let pos = self.notes.iter().position(|n| n.id == id)?;
        Some(self.notes.remove(pos))
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn note_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == id)
    }

    /// Notes due on a step, ordered by step then insertion order
    pub fn notes_at_step(&self, step: usize) -> Vec<&Note> {
        let mut due: Vec<&Note> = self.notes.iter().filter(|n| n.trigger_step() == step).collect();
        due.sort_by(|a, b| a.step.total_cmp(&b.step));
        due
    }

    /// Notes whose step lies in `[from, to]`
    pub fn notes_in_range(&self, from: f64, to: f64) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(move |n| n.step >= from && n.step <= to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::{Pitch, PitchClass};

    fn note(id: u64, step: f64) -> Note {
        Note::new(NoteId(id), Pitch::new(PitchClass::C, 4), step, 1.0, 100)
    }

    #[test]
    fn test_notes_at_step_orders_by_step_then_insertion() {
        let mut track = Track::new(TrackId(1), "Piano", "piano");
        track.insert_note(note(1, 2.5));
        track.insert_note(note(2, 2.0));
        track.insert_note(note(3, 2.0));
        track.insert_note(note(4, 3.0));

        let ids: Vec<u64> = track.notes_at_step(2).iter().map(|n| n.id.0).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_insert_replaces_by_id() {
        let mut track = Track::new(TrackId(1), "Piano", "piano");
        track.insert_note(note(1, 0.0));
        track.insert_note(note(1, 4.0));
        assert_eq!(track.notes.len(), 1);
        assert_eq!(track.notes[0].step, 4.0);
    }

    #[test]
    fn test_mixer_values_clamped() {
        let mut track = Track::new(TrackId(1), "Piano", "piano");
        track.set_volume(140.0);
        track.set_pan(-3.0);
        assert_eq!(track.volume, 100.0);
        assert_eq!(track.pan, -1.0);
    }
}
