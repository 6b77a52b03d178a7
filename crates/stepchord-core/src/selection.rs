//! Note selection on the active track

use std::collections::BTreeSet;

use crate::note::{Note, NoteId};

/// Drag box in (step, piano row) space; bounds are inclusive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionBox {
    pub min_step: f64,
    pub max_step: f64,
    pub min_row: i32,
    pub max_row: i32,
}

impl SelectionBox {
    /// Box spanning two drag corners, in any order
    pub fn from_corners(a: (f64, i32), b: (f64, i32)) -> Self {
        Self {
            min_step: a.0.min(b.0),
            max_step: a.0.max(b.0),
            min_row: a.1.min(b.1),
            max_row: a.1.max(b.1),
        }
    }

    pub fn contains(&self, note: &Note) -> bool {
        let row = note.pitch().piano_row();
        note.step >= self.min_step
            && note.step <= self.max_step
            && row >= self.min_row
            && row <= self.max_row
    }
}

/// Set of selected note ids; transient, never persisted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<NoteId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids(ids: impl IntoIterator<Item = NoteId>) -> Self {
        Self { ids: ids.into_iter().collect() }
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.ids.contains(&id)
    }

    pub fn insert(&mut self, id: NoteId) {
        self.ids.insert(id);
    }

    pub fn remove(&mut self, id: NoteId) {
        self.ids.remove(&id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NoteId> + '_ {
        self.ids.iter().copied()
    }

    /// Select what the box covers; additive unions, otherwise replaces
    pub fn apply_box(&mut self, region: &SelectionBox, notes: &[Note], additive: bool) {
        if !additive {
            self.ids.clear();
        }
        self.ids.extend(notes.iter().filter(|n| region.contains(n)).map(|n| n.id));
    }

    /// Drop ids that no longer exist in `notes`
    pub fn retain_existing(&mut self, notes: &[Note]) {
        self.ids.retain(|id| notes.iter().any(|n| n.id == *id));
    }

    /// Selected notes, in collection order
    pub fn selected<'a>(&'a self, notes: &'a [Note]) -> impl Iterator<Item = &'a Note> + 'a {
        notes.iter().filter(move |n| self.contains(n.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::{Pitch, PitchClass};

    fn note(id: u64, class: PitchClass, octave: i8, step: f64) -> Note {
        Note::new(NoteId(id), Pitch::new(class, octave), step, 1.0, 100)
    }

    #[test]
    fn test_box_bounds_are_inclusive() {
        let notes = vec![
            note(1, PitchClass::C, 4, 4.0),
            note(2, PitchClass::E, 4, 8.0),
            note(3, PitchClass::G, 4, 8.5),
        ];
        let c4_row = Pitch::new(PitchClass::C, 4).piano_row();
        let e4_row = Pitch::new(PitchClass::E, 4).piano_row();

        // Corner order does not matter; E4 at step 8 sits exactly on the max corner
        let region = SelectionBox::from_corners((8.0, e4_row), (4.0, c4_row));
        assert_eq!(region.max_step, 8.0);
        assert_eq!(region.min_row, e4_row);

        let mut selection = Selection::new();
        selection.apply_box(&region, &notes, false);
        let ids: Vec<u64> = selection.ids().map(|id| id.0).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_additive_box_unions() {
        let notes = vec![note(1, PitchClass::C, 4, 0.0), note(2, PitchClass::C, 4, 10.0)];
        let row = Pitch::new(PitchClass::C, 4).piano_row();

        let mut selection = Selection::from_ids([NoteId(1)]);
        selection.apply_box(&SelectionBox::from_corners((9.0, row), (11.0, row)), &notes, true);
        assert_eq!(selection.len(), 2);

        selection.apply_box(&SelectionBox::from_corners((9.0, row), (11.0, row)), &notes, false);
        assert_eq!(selection, Selection::from_ids([NoteId(2)]));
    }

    #[test]
    fn test_retain_existing() {
        let notes = vec![note(1, PitchClass::C, 4, 0.0)];
        let mut selection = Selection::from_ids([NoteId(1), NoteId(2)]);
        selection.retain_existing(&notes);
        assert_eq!(selection, Selection::from_ids([NoteId(1)]));
    }
}
