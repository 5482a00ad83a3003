//! Periodic playback-state polling.
//!
//! Spotify has no change notification, so the local view is refreshed by
//! snapshotting `/me/player/currently-playing` on a fixed interval. Polls are
//! numbered when issued; a response is applied only if no later poll has been
//! applied already, so a slow response can never roll the view back.

use std::sync::Arc;
use std::time::Duration;

use pulsespotify::PlaybackSnapshot;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, trace};

use crate::errors::ControlError;
use crate::session::Session;

/// Monotonic poll numbering.
#[derive(Clone, Copy, Debug, Default)]
pub struct PollSequence {
    issued: u64,
    applied: u64,
}

impl PollSequence {
    /// Number for a poll about to be sent.
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Accepts a response if it is newer than the last applied one.
    pub fn accept(&mut self, seq: u64) -> bool {
        if seq <= self.applied {
            return false;
        }
        self.applied = seq;
        true
    }

    /// Makes every poll issued so far stale.
    pub fn invalidate_in_flight(&mut self) {
        self.applied = self.issued;
    }

    pub fn last_applied(&self) -> u64 {
        self.applied
    }
}

#[derive(Debug)]
pub enum PollOutcome {
    Applied(PlaybackSnapshot),
    /// A later poll was applied first.
    Stale,
    NotConnected,
    /// Token rejected; the session is disconnected unless a new login replaced it.
    Unauthenticated,
    /// Failure absorbed, the previous snapshot stays in effect.
    Skipped(ControlError),
    /// The session shut down while the request was in flight.
    Discarded,
}

/// Spawns the poll timer for `session`.
///
/// Each tick awaits its poll before the next tick is taken, so timer polls
/// never overlap. The task ends when the session shuts down, including while
/// a request is in flight.
pub fn spawn_poll_loop(session: Arc<Session>, every: Duration) -> JoinHandle<()> {
    let stop = session.shutdown_token();
    tokio::spawn(async move {
        info!("Playback poller started (every {:?})", every);
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = stop.cancelled() => break,
                        outcome = session.poll() => match outcome {
                            PollOutcome::Applied(snapshot) => {
                                trace!("Poll applied: {:?}", snapshot.current_uri())
                            }
                            other => debug!("Poll outcome: {:?}", other),
                        },
                    }
                }
            }
        }

        info!("Playback poller stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_order_responses() {
        let mut seq = PollSequence::default();
        let first = seq.issue();
        let second = seq.issue();

        assert!(seq.accept(second));
        assert!(!seq.accept(first));
        assert_eq!(seq.last_applied(), second);
    }

    #[test]
    fn test_in_order_responses() {
        let mut seq = PollSequence::default();
        let first = seq.issue();
        assert!(seq.accept(first));
        let second = seq.issue();
        assert!(seq.accept(second));
    }

    #[test]
    fn test_invalidate_in_flight() {
        let mut seq = PollSequence::default();
        let in_flight = seq.issue();
        seq.invalidate_in_flight();
        assert!(!seq.accept(in_flight));
        let next = seq.issue();
        assert!(seq.accept(next));
    }
}
