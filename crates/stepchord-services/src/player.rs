//! Player implementations for the engine

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use stepchord_core::{NoteTrigger, PitchClass, PlaybackError, Player};
use tracing::info;

/// Player that only logs; used when no synth is attached
#[derive(Debug, Default)]
pub struct LoggingPlayer;

impl Player for LoggingPlayer {
    fn play_note(
        &self,
        pitch_class: PitchClass,
        octave: i8,
        duration_secs: f64,
        instrument_id: &str,
        velocity: f32,
    ) -> Result<(), PlaybackError> {
        info!(
            "play {}{} on {} for {:.3}s at {:.2}",
            pitch_class, octave, instrument_id, duration_secs, velocity
        );
        Ok(())
    }

    fn stop_all_notes(&self) {
        info!("stop all notes");
    }
}

/// Event consumed by a synth thread
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Note(NoteTrigger),
    StopAll,
}

/// Forwards notes to a bounded queue without blocking.
/// A full queue drops the note rather than stall the clock.
pub struct ChannelPlayer {
    tx: Sender<PlaybackEvent>,
}

impl ChannelPlayer {
    pub fn new(capacity: usize) -> (Self, Receiver<PlaybackEvent>) {
        let (tx, rx) = bounded(capacity);
        (Self { tx }, rx)
    }
}

impl Player for ChannelPlayer {
    fn play_note(
        &self,
        pitch_class: PitchClass,
        octave: i8,
        duration_secs: f64,
        instrument_id: &str,
        velocity: f32,
    ) -> Result<(), PlaybackError> {
        let event = PlaybackEvent::Note(NoteTrigger {
            pitch_class,
            octave,
            duration_secs,
            instrument_id: instrument_id.to_string(),
            velocity,
        });
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => PlaybackError::Unavailable("playback queue full".to_string()),
            TrySendError::Disconnected(_) => PlaybackError::Unavailable("synth disconnected".to_string()),
        })
    }

    fn stop_all_notes(&self) {
        // Best effort: a full queue is drained by the synth anyway
        let _ = self.tx.try_send(PlaybackEvent::StopAll);
    }
}
