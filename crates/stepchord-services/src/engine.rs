//! Engine: a shared session driven by the transport clock

use std::sync::{Arc, Mutex};
use std::time::Instant;

use stepchord_core::{dispatch, Command, Player, Response, Session, Signal, StepchordError};
use thiserror::Error;
use tracing::{info, warn};

use crate::clock::{ClockError, TransportClock};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] StepchordError),
    #[error("Clock error: {0}")]
    Clock(#[from] ClockError),
    #[error("Session lock poisoned")]
    Poisoned,
}

/// Session plus the clock thread and player that realize its responses
pub struct Engine {
    session: Arc<Mutex<Session>>,
    clock: TransportClock,
    player: Arc<dyn Player>,
}

impl Engine {
    pub fn new(session: Session, player: Arc<dyn Player>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            clock: TransportClock::new(),
            player,
        }
    }

    /// Shared session for readers (UI refresh)
    pub fn session(&self) -> Arc<Mutex<Session>> {
        self.session.clone()
    }

    /// Access the session (locks mutex)
    pub fn with_session<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        self.session.lock().ok().map(|mut s| f(&mut s))
    }

    pub fn is_clock_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Run a command, then start or stop the clock and sound any audition
    /// notes. The session lock is released before the clock is touched.
    pub fn handle(&mut self, command: Command) -> Result<Response, EngineError> {
        let response = {
            let mut session = self.session.lock().map_err(|_| EngineError::Poisoned)?;
            session.handle(command, Instant::now())?
        };

        if response.silence {
            self.clock.stop();
            self.player.stop_all_notes();
        }
        if let Signal::Started(token) = response.signal {
            // Record-from-play replaces the running run
            self.clock.stop();
            let started = self.clock.start(self.session.clone(), token, self.player.clone());
            self.settle_clock_start(started)?;
        }
        dispatch(self.player.as_ref(), &response.triggers);
        Ok(response)
    }

    /// A transport with no clock behind it goes back to Stopped
    fn settle_clock_start(&self, started: Result<(), ClockError>) -> Result<(), EngineError> {
        let Err(e) = started else {
            return Ok(());
        };
        warn!("Clock failed to start, stopping transport: {}", e);
        if let Some(Err(stop_err)) = self.with_session(|s| s.stop()) {
            warn!("Transport stop after clock failure: {}", stop_err);
        }
        Err(e.into())
    }

    pub fn shutdown(&mut self) {
        if let Some(Ok(response)) = self.with_session(|s| s.stop()) {
            if let Signal::Recorded { notes } = response.signal {
                info!("Committed {} recorded notes on shutdown", notes);
            }
        }
        self.clock.stop();
        self.player.stop_all_notes();
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use stepchord_core::{Document, Pitch, PitchClass, SessionConfig, TransportState};

    use crate::player::{ChannelPlayer, PlaybackEvent};

    fn engine() -> (Engine, crossbeam_channel::Receiver<PlaybackEvent>) {
        let mut session = Session::with_document(Document::new(), SessionConfig::default());
        session.create_track("Keys", "piano");
        let (player, rx) = ChannelPlayer::new(256);
        (Engine::new(session, Arc::new(player)), rx)
    }

    #[test]
    fn test_add_note_auditions_when_stopped() {
        let (mut engine, rx) = engine();
        let response = engine
            .handle(Command::AddNote { pitch: Pitch::new(PitchClass::A, 4), step: 0.0 })
            .unwrap();
        assert!(matches!(response.signal, Signal::NotesAdded(ref ids) if ids.len() == 1));

        let Ok(PlaybackEvent::Note(note)) = rx.try_recv() else {
            panic!("no audition");
        };
        assert_eq!(note.pitch_class, PitchClass::A);
        assert_eq!(note.instrument_id, "piano");
    }

    #[test]
    fn test_play_then_stop_silences() {
        let (mut engine, rx) = engine();
        engine
            .handle(Command::AddNote { pitch: Pitch::new(PitchClass::C, 4), step: 0.0 })
            .unwrap();
        let _ = rx.try_iter().count();

        engine.handle(Command::PlayToggle).unwrap();
        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(first, PlaybackEvent::Note(ref n) if n.pitch_class == PitchClass::C));

        let response = engine.handle(Command::PlayToggle).unwrap();
        assert_eq!(response.signal, Signal::Stopped);
        assert!(!engine.is_clock_running());
        assert!(rx.try_iter().any(|e| e == PlaybackEvent::StopAll));
        assert_eq!(engine.with_session(|s| s.transport_state()), Some(TransportState::Stopped));
    }

    #[test]
    fn test_failed_clock_start_stops_transport() {
        let (engine, _rx) = engine();
        let response = engine.with_session(|s| s.play_toggle()).unwrap();
        assert!(matches!(response.signal, Signal::Started(_)));

        let err = engine.settle_clock_start(Err(ClockError::AlreadyRunning)).unwrap_err();
        assert!(matches!(err, EngineError::Clock(ClockError::AlreadyRunning)));
        assert_eq!(engine.with_session(|s| s.transport_state()), Some(TransportState::Stopped));
        assert!(!engine.is_clock_running());
    }

    #[test]
    fn test_core_errors_pass_through() {
        let (mut engine, _rx) = engine();
        let err = engine
            .handle(Command::SelectTrack(stepchord_core::TrackId(42)))
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(ref e) if e.is_not_found()));
    }

    #[test]
    fn test_undo_through_engine() {
        let (mut engine, _rx) = engine();
        engine
            .handle(Command::AddNote { pitch: Pitch::new(PitchClass::C, 4), step: 2.0 })
            .unwrap();
        assert_eq!(engine.handle(Command::Undo).unwrap().signal, Signal::Applied);
        assert_eq!(engine.handle(Command::Undo).unwrap().signal, Signal::NothingToUndo);
    }
}
