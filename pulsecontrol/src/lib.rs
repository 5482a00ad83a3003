//! Heart-rate driven queue orchestration for PulseDJ.
//!
//! Readings are classified into [`Zone`]s; when the zone changes and auto-play
//! is on, the [`Session`] picks a random track from the zone's playlist and
//! queues it on the user's active Spotify device. A poll loop keeps the
//! now-playing view in sync and clears the "up next" record once the queued
//! track starts.

mod events;

pub mod backend;
pub mod errors;
pub mod model;
pub mod orchestrator;
pub mod poller;
pub mod selection;
pub mod session;
pub mod zone;

pub use backend::PlaybackBackend;
pub use errors::{ControlError, Result};
pub use events::SessionEventBus;
pub use model::{
    ClearReason, Notice, NoticeLevel, OrchestratorPhase, PendingTrack, SessionEvent,
    SessionStatus, ZonePlaylists,
};
pub use orchestrator::{HeartRateStep, OrchestratorState, SnapshotApplied};
pub use poller::{PollOutcome, PollSequence, spawn_poll_loop};
pub use selection::{Draw, FixedDraw, UniformDraw, select};
pub use session::{Session, SessionBuilder};
pub use zone::{FAST_MIN_BPM, MEDIUM_MIN_BPM, Zone, ZoneTracker, ZoneTransition, classify};
