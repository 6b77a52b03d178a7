//! Transport clock: drives scheduler ticks from a worker thread
//!
//! The session lock is held only while ticking or reading the tempo, never
//! while waiting or while the player runs. The interval is re-read before
//! every wait so tempo changes apply from the next step.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use stepchord_core::{dispatch, Player, Session, TickToken};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("Clock already running")]
    AlreadyRunning,
    #[error("Failed to spawn clock thread: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Cancelled,
}

/// Sleeps between ticks; cancellable so stop takes effect mid-interval
pub trait TickWait: Send {
    fn wait(&mut self, interval: Duration) -> WaitOutcome;
}

/// Waits on a cancel channel with a timeout
pub struct ChannelWait {
    cancel: Receiver<()>,
}

impl ChannelWait {
    pub fn new(cancel: Receiver<()>) -> Self {
        Self { cancel }
    }
}

impl TickWait for ChannelWait {
    fn wait(&mut self, interval: Duration) -> WaitOutcome {
        match self.cancel.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => WaitOutcome::Elapsed,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => WaitOutcome::Cancelled,
        }
    }
}

/// Tick until the token goes stale or the wait is cancelled.
/// The first tick fires immediately. Returns the number of ticks run.
pub fn run_transport(
    session: &Mutex<Session>,
    token: TickToken,
    waiter: &mut dyn TickWait,
    player: &dyn Player,
) -> usize {
    let mut ticks = 0;
    loop {
        let triggers = match session.lock() {
            Ok(mut s) => s.tick(token),
            Err(_) => {
                warn!("Session lock poisoned, stopping clock");
                break;
            }
        };
        let Some(triggers) = triggers else {
            break;
        };
        dispatch(player, &triggers);
        ticks += 1;

        let interval = match session.lock() {
            Ok(s) => s.scheduler().step_duration(),
            Err(_) => break,
        };
        if waiter.wait(interval) == WaitOutcome::Cancelled {
            break;
        }
    }
    debug!("Clock ran {} ticks", ticks);
    ticks
}

/// Owns the clock thread for one play/record run
#[derive(Default)]
pub struct TransportClock {
    handle: Option<JoinHandle<usize>>,
    cancel: Option<Sender<()>>,
}

impl TransportClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn start(
        &mut self,
        session: Arc<Mutex<Session>>,
        token: TickToken,
        player: Arc<dyn Player>,
    ) -> Result<(), ClockError> {
        if self.is_running() {
            return Err(ClockError::AlreadyRunning);
        }
        // Reap a run that ended on its own
        self.stop();

        let (cancel_tx, cancel_rx) = bounded(1);
        let handle = thread::Builder::new()
            .name("stepchord-clock".to_string())
            .spawn(move || {
                let mut waiter = ChannelWait::new(cancel_rx);
                run_transport(&session, token, &mut waiter, player.as_ref())
            })?;

        self.handle = Some(handle);
        self.cancel = Some(cancel_tx);
        info!("Clock started");
        Ok(())
    }

    /// Cancel and join. Once this returns no further tick will dispatch.
    /// Must not be called while holding the session lock.
    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.try_send(());
        }
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(ticks) => debug!("Clock stopped after {} ticks", ticks),
                Err(_) => warn!("Clock thread panicked"),
            }
        }
    }
}

impl Drop for TransportClock {
    fn drop(&mut self) {
        self.stop();
    }
}
