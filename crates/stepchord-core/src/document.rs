//! The document: every track and its notes

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StepchordError};
use crate::note::{Note, NoteId, MIN_LENGTH};
use crate::pitch::Pitch;
use crate::track::{Track, TrackColor, TrackId};

/// Default four-track template: (name, instrument, color)
const DEFAULT_TRACKS: [(&str, &str, TrackColor); 4] = [
    ("Piano", "piano", TrackColor(120, 160, 220)),
    ("Bass", "bass", TrackColor(220, 140, 90)),
    ("Strings", "strings", TrackColor(150, 210, 130)),
    ("Lead", "synth-lead", TrackColor(210, 120, 200)),
];

/// Mutable store of tracks and notes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub tracks: Vec<Track>,
    next_track_id: u64,
    next_note_id: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            next_track_id: 1,
            next_note_id: 1,
        }
    }

    /// Document holding the default four-track template
    pub fn with_default_tracks() -> Self {
        let mut doc = Self::new();
        for (name, instrument, color) in DEFAULT_TRACKS {
            let id = doc.add_track(name, instrument);
            if let Ok(track) = doc.track_mut(id) {
                track.color = color;
            }
        }
        doc
    }

    pub fn add_track(&mut self, name: impl Into<String>, instrument_id: impl Into<String>) -> TrackId {
        let id = TrackId(self.next_track_id);
        self.next_track_id += 1;
        self.tracks.push(Track::new(id, name, instrument_id));
        id
    }

    /// Remove a track, releasing its notes
    pub fn remove_track(&mut self, id: TrackId) -> Option<Track> {
        let pos = self.tracks.iter().position(|t| t.id == id)?;
        Some(self.tracks.remove(pos))
    }

    /// Copy a track with fresh note ids, inserted after the original
    pub fn duplicate_track(&mut self, id: TrackId) -> Result<TrackId> {
        let pos = self
            .tracks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StepchordError::TrackNotFound(id.0))?;

        let mut copy = self.tracks[pos].clone();
        copy.id = TrackId(self.next_track_id);
        self.next_track_id += 1;
        copy.name = format!("{} (copy)", copy.name);
        copy.solo = false;
        for note in &mut copy.notes {
            note.id = self.next_note_id();
        }

        let new_id = copy.id;
        self.tracks.insert(pos + 1, copy);
        Ok(new_id)
    }

    pub fn track(&self, id: TrackId) -> Result<&Track> {
        self.tracks
            .iter()
            .find(|t| t.id == id)
            .ok_or(StepchordError::TrackNotFound(id.0))
    }

    pub fn track_mut(&mut self, id: TrackId) -> Result<&mut Track> {
        self.tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StepchordError::TrackNotFound(id.0))
    }

    /// Check if any track is soloed
    pub fn has_solo(&self) -> bool {
        self.tracks.iter().any(|t| t.solo)
    }

    /// Tracks that sound: the soloed set if any track is soloed (mute flags
    /// ignored), otherwise every unmuted track
    pub fn audible_tracks(&self) -> impl Iterator<Item = &Track> {
        let has_solo = self.has_solo();
        self.tracks
            .iter()
            .filter(move |t| if has_solo { t.solo } else { !t.muted })
    }

    /// Allocate a fresh note id
    pub fn next_note_id(&mut self) -> NoteId {
        let id = NoteId(self.next_note_id);
        self.next_note_id += 1;
        id
    }

    pub fn add_note(
        &mut self,
        track: TrackId,
        pitch: Pitch,
        step: f64,
        velocity: u8,
        length: f64,
    ) -> Result<NoteId> {
        check_finite(step, "step")?;
        check_finite(length, "length")?;
        // Allocate only once the track is known to exist
        self.track(track)?;
        let id = self.next_note_id();
        let note = Note::new(id, pitch, step, length, velocity);
        debug!("Add note {} {} at step {} on track {}", id.0, pitch, note.step, track.0);
        self.track_mut(track)?.insert_note(note);
        Ok(id)
    }

    /// Remove by id; a missing note is not an error
    pub fn remove_note(&mut self, track: TrackId, id: NoteId) -> Result<bool> {
        Ok(self.track_mut(track)?.remove_note(id).is_some())
    }

    pub fn resize_note(&mut self, track: TrackId, id: NoteId, new_length: f64) -> Result<()> {
        check_finite(new_length, "length")?;
        let note = self
            .track_mut(track)?
            .note_mut(id)
            .ok_or(StepchordError::NoteNotFound(id.0))?;
        note.length = new_length.max(MIN_LENGTH);
        Ok(())
    }

    pub fn move_note(&mut self, track: TrackId, id: NoteId, new_step: f64, new_pitch: Pitch) -> Result<()> {
        check_finite(new_step, "step")?;
        let note = self
            .track_mut(track)?
            .note_mut(id)
            .ok_or(StepchordError::NoteNotFound(id.0))?;
        note.step = new_step.max(0.0);
        note.set_pitch(new_pitch);
        Ok(())
    }

    /// Swap in a whole note collection (history restore, batch transforms)
    pub fn replace_notes(&mut self, track: TrackId, notes: Vec<Note>) -> Result<()> {
        self.track_mut(track)?.notes = notes;
        Ok(())
    }

    /// Delete every note whose step lies in `[from, to]`; returns how many went
    pub fn clear_region(&mut self, track: TrackId, from: f64, to: f64) -> Result<usize> {
        let track = self.track_mut(track)?;
        let before = track.notes.len();
        track.notes.retain(|n| n.step < from || n.step > to);
        Ok(before - track.notes.len())
    }
}

fn check_finite(value: f64, what: &str) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(StepchordError::InvalidRange(format!("{what} must be finite, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::PitchClass;

    fn c4() -> Pitch {
        Pitch::new(PitchClass::C, 4)
    }

    #[test]
    fn test_default_template_has_four_tracks() {
        let doc = Document::with_default_tracks();
        let names: Vec<&str> = doc.tracks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Piano", "Bass", "Strings", "Lead"]);
    }

    #[test]
    fn test_out_of_range_octaves_are_clamped() {
        let mut doc = Document::new();
        let track = doc.add_track("Keys", "piano");
        let high = doc.add_note(track, Pitch::new(PitchClass::C, 12), 0.0, 100, 1.0).unwrap();
        let low = doc.add_note(track, Pitch::new(PitchClass::E, -2), 1.0, 100, 1.0).unwrap();

        let notes = &doc.track(track).unwrap().notes;
        let pitch_of = |id: NoteId| notes.iter().find(|n| n.id == id).unwrap().pitch();
        assert_eq!(pitch_of(high), Pitch::new(PitchClass::C, 8));
        assert_eq!(pitch_of(low), Pitch::new(PitchClass::E, 0));

        doc.move_note(track, low, 2.0, Pitch::new(PitchClass::G, 20)).unwrap();
        let moved = doc.track(track).unwrap().notes.iter().find(|n| n.id == low).unwrap().pitch();
        assert_eq!(moved, Pitch::new(PitchClass::G, 8));
    }

    #[test]
    fn test_add_note_requires_track() {
        let mut doc = Document::new();
        assert_eq!(
            doc.add_note(TrackId(9), c4(), 0.0, 100, 1.0),
            Err(StepchordError::TrackNotFound(9))
        );
    }

    #[test]
    fn test_remove_missing_note_is_noop() {
        let mut doc = Document::new();
        let t = doc.add_track("Piano", "piano");
        let id = doc.add_note(t, c4(), 0.0, 100, 1.0).unwrap();
        assert_eq!(doc.remove_note(t, id), Ok(true));
        assert_eq!(doc.remove_note(t, id), Ok(false));
    }

    #[test]
    fn test_resize_and_move_clamp() {
        let mut doc = Document::new();
        let t = doc.add_track("Piano", "piano");
        let id = doc.add_note(t, c4(), 3.0, 100, 2.0).unwrap();

        doc.resize_note(t, id, 0.25).unwrap();
        doc.move_note(t, id, -4.0, Pitch::new(PitchClass::G, 5)).unwrap();

        let note = doc.track(t).unwrap().note(id).copied().unwrap();
        assert_eq!(note.length, 1.0);
        assert_eq!(note.step, 0.0);
        assert_eq!(note.pitch(), Pitch::new(PitchClass::G, 5));
    }

    #[test]
    fn test_add_note_clamps_velocity_and_rejects_nan() {
        let mut doc = Document::new();
        let t = doc.add_track("Piano", "piano");
        let id = doc.add_note(t, c4(), 0.0, 0, 1.0).unwrap();
        assert_eq!(doc.track(t).unwrap().note(id).unwrap().velocity, 1);
        assert!(matches!(
            doc.add_note(t, c4(), f64::NAN, 100, 1.0),
            Err(StepchordError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_duplicate_track_assigns_fresh_note_ids() {
        let mut doc = Document::new();
        let t = doc.add_track("Piano", "piano");
        let id = doc.add_note(t, c4(), 0.0, 100, 1.0).unwrap();

        let copy = doc.duplicate_track(t).unwrap();
        let copied = &doc.track(copy).unwrap().notes;
        assert_eq!(copied.len(), 1);
        assert_ne!(copied[0].id, id);
        assert_eq!(doc.tracks[1].id, copy);
    }

    #[test]
    fn test_solo_overrides_mute() {
        let mut doc = Document::with_default_tracks();
        let ids: Vec<TrackId> = doc.tracks.iter().map(|t| t.id).collect();

        doc.track_mut(ids[1]).unwrap().muted = true;
        assert_eq!(doc.audible_tracks().count(), 3);

        doc.track_mut(ids[1]).unwrap().solo = true;
        let audible: Vec<TrackId> = doc.audible_tracks().map(|t| t.id).collect();
        assert_eq!(audible, vec![ids[1]]);
    }

    #[test]
    fn test_clear_region() {
        let mut doc = Document::new();
        let t = doc.add_track("Piano", "piano");
        for step in [0.0, 4.0, 8.0, 12.0] {
            doc.add_note(t, c4(), step, 100, 1.0).unwrap();
        }
        assert_eq!(doc.clear_region(t, 4.0, 8.0), Ok(2));
        assert_eq!(doc.track(t).unwrap().notes.len(), 2);
    }
}
