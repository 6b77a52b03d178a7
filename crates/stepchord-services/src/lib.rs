//! stepchord-services: Transport clock, players, and the engine driving a session

pub mod clock;
pub mod engine;
pub mod player;

pub use clock::{run_transport, ChannelWait, ClockError, TickWait, TransportClock, WaitOutcome};
pub use engine::{Engine, EngineError};
pub use player::{ChannelPlayer, LoggingPlayer, PlaybackEvent};
