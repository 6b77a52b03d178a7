//! Error types for stepchord

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepchordError {
    #[error("Track not found: {0}")]
    TrackNotFound(u64),
    #[error("Note not found: {0}")]
    NoteNotFound(u64),
    #[error("No active track")]
    NoActiveTrack,
    #[error("Unknown chord {symbol} in key {key}")]
    UnknownChord { key: String, symbol: String },
    #[error("Unknown progression: {0}")]
    UnknownProgression(String),
    #[error("Invalid range: {0}")]
    InvalidRange(String),
}

impl StepchordError {
    /// True for the `NotFound` family (missing track or note)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TrackNotFound(_) | Self::NoteNotFound(_) | Self::NoActiveTrack)
    }
}

pub type Result<T> = std::result::Result<T, StepchordError>;
