//! Undo/redo over note-collection snapshots

use std::collections::VecDeque;

use crate::note::Note;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Snapshot history for one track's notes.
///
/// `entries[index]` is the current state; commits past the pointer are
/// discarded on a new commit (no redo branching).
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Vec<Note>>,
    index: usize,
    capacity: usize,
}

impl History {
    /// History whose baseline is `initial`
    pub fn new(initial: Vec<Note>, capacity: usize) -> Self {
        let mut entries = VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY) + 1);
        entries.push_back(initial);
        Self {
            entries,
            index: 0,
            capacity: capacity.max(1),
        }
    }

    /// Record a new state, dropping redo entries and the oldest beyond capacity
    pub fn commit(&mut self, snapshot: &[Note]) {
        self.entries.truncate(self.index + 1);
        self.entries.push_back(snapshot.to_vec());
        while self.entries.len() > self.capacity + 1 {
            self.entries.pop_front();
        }
        self.index = self.entries.len() - 1;
    }

    /// Step back; `None` at the oldest entry
    pub fn undo(&mut self) -> Option<&[Note]> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(&self.entries[self.index])
    }

    /// Step forward; `None` at the tip
    pub fn redo(&mut self) -> Option<&[Note]> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(&self.entries[self.index])
    }

    pub fn current(&self) -> &[Note] {
        &self.entries[self.index]
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Number of undo steps available
    pub fn depth(&self) -> usize {
        self.index
    }
}
