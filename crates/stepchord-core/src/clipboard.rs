//! Note clipboard for copy/paste within and across tracks

use crate::note::{Note, NoteId};

/// Detached snapshot of copied notes
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    notes: Vec<Note>,
}

impl Clipboard {
    pub fn copy<'a>(&mut self, notes: impl IntoIterator<Item = &'a Note>) {
        self.notes = notes.into_iter().copied().collect();
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    /// Rebase so the earliest copied note lands on `at_step`, with fresh ids.
    /// Relative offsets between notes are kept.
    pub fn paste(&self, at_step: f64, mut fresh_id: impl FnMut() -> NoteId) -> Vec<Note> {
        let Some(earliest) = self.notes.iter().map(|n| n.step).reduce(f64::min) else {
            return Vec::new();
        };
        self.notes
            .iter()
            .map(|n| Note {
                id: fresh_id(),
                step: (n.step - earliest + at_step).max(0.0),
                ..*n
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::{Pitch, PitchClass};

    #[test]
    fn test_paste_rebases_and_renumbers() {
        let notes = [
            Note::new(NoteId(1), Pitch::new(PitchClass::C, 4), 6.0, 1.0, 100),
            Note::new(NoteId(2), Pitch::new(PitchClass::E, 4), 7.5, 2.0, 90),
        ];
        let mut clipboard = Clipboard::default();
        clipboard.copy(&notes);

        let mut next = 10;
        let pasted = clipboard.paste(16.0, || {
            next += 1;
            NoteId(next)
        });
        assert_eq!(pasted.len(), 2);
        assert_eq!((pasted[0].id, pasted[0].step), (NoteId(11), 16.0));
        assert_eq!((pasted[1].id, pasted[1].step), (NoteId(12), 17.5));
        assert_eq!(pasted[1].length, 2.0);
        assert_eq!(pasted[1].velocity, 90);
    }

    #[test]
    fn test_empty_paste() {
        let clipboard = Clipboard::default();
        assert!(clipboard.paste(0.0, || NoteId(1)).is_empty());
    }
}
