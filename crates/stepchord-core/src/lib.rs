//! stepchord-core: Domain types for the stepchord piano roll

pub mod chord;
mod clipboard;
mod command;
mod config;
mod document;
mod error;
mod history;
mod note;
pub mod pitch;
mod playback;
pub mod recording;
mod selection;
mod session;
pub mod theory;
mod track;
pub mod transform;
pub mod transport;

pub use chord::{arpeggiate, build_chord, detect_chord, detect_notes, invert, voice, ArpMode, ChordLabel};
pub use clipboard::Clipboard;
pub use command::{Command, Response, Signal};
pub use config::SessionConfig;
pub use document::Document;
pub use error::{Result, StepchordError};
pub use history::{History, DEFAULT_HISTORY_CAPACITY};
pub use note::{clamp_velocity, Note, NoteId, DEFAULT_VELOCITY, MAX_VELOCITY, MIN_VELOCITY};
pub use pitch::{Pitch, PitchClass};
pub use playback::{dispatch, NoteTrigger, PlaybackError, Player};
pub use recording::{RecordedNote, Recorder};
pub use selection::{Selection, SelectionBox};
pub use session::Session;
pub use theory::{tables, ChordProgression, ChordQuality, KeyTable, Mode, TheoryTables};
pub use track::{Track, TrackColor, TrackId};
pub use transform::{snap_to_grid, SnapUnit, Transform};
pub use transport::{Scheduler, TickToken, TransportState};
