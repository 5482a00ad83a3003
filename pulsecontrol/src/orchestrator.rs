//! Queue orchestrator state machine.
//!
//! Everything here is synchronous. The session drives it: it locks the state,
//! calls one of these methods, releases the lock, then performs whatever
//! network work the returned decision asks for. Decisions taken before a
//! suspension point may be overtaken by other handlers; the single pending
//! record is last-writer-wins.

use pulsespotify::PlaybackSnapshot;

use crate::model::{OrchestratorPhase, PendingTrack};
use crate::poller::PollSequence;
use crate::zone::{Zone, ZoneTracker, ZoneTransition};

/// What a heart-rate reading asks the session to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeartRateStep {
    pub transition: Option<ZoneTransition>,
    /// Zone to select a track for, if any.
    pub select: Option<Zone>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SnapshotApplied {
    Stale,
    Applied {
        /// Pending record cleared because its track is now playing.
        handed_off: Option<PendingTrack>,
    },
}

#[derive(Clone, Debug, Default)]
pub struct OrchestratorState {
    auto_play: bool,
    zones: ZoneTracker,
    heart_rate: Option<u32>,
    pending: Option<PendingTrack>,
    snapshot: Option<PlaybackSnapshot>,
    polls: PollSequence,
    selections_in_flight: usize,
    /// Bumped by every reset; selections started earlier are dropped.
    epoch: u64,
}

impl OrchestratorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_play(&self) -> bool {
        self.auto_play
    }

    pub fn last_zone(&self) -> Option<Zone> {
        self.zones.last_zone()
    }

    pub fn heart_rate(&self) -> Option<u32> {
        self.heart_rate
    }

    pub fn pending(&self) -> Option<&PendingTrack> {
        self.pending.as_ref()
    }

    pub fn snapshot(&self) -> Option<&PlaybackSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn phase(&self) -> OrchestratorPhase {
        if self.selections_in_flight > 0 {
            OrchestratorPhase::Selecting
        } else if self.auto_play && self.last_zone().is_some() {
            OrchestratorPhase::Monitoring
        } else {
            OrchestratorPhase::Idle
        }
    }

    /// Records a reading. A selection is requested only for a transition into
    /// a real zone while auto-play is on.
    pub fn observe_heart_rate(&mut self, bpm: Option<u32>) -> HeartRateStep {
        self.heart_rate = bpm;
        let transition = self.zones.observe(bpm);
        let select = match transition {
            Some(ZoneTransition { to: Some(zone), .. }) if self.auto_play => Some(zone),
            _ => None,
        };
        HeartRateStep { transition, select }
    }

    /// Returns the zone to select for right away when auto-play goes from off
    /// to on with a zone already established.
    pub fn set_auto_play(&mut self, enabled: bool) -> Option<Zone> {
        let was_enabled = self.auto_play;
        self.auto_play = enabled;
        if enabled && !was_enabled {
            self.last_zone()
        } else {
            None
        }
    }

    /// Returns the epoch the selection belongs to.
    pub fn begin_selection(&mut self) -> u64 {
        self.selections_in_flight += 1;
        self.epoch
    }

    pub fn end_selection(&mut self, epoch: u64) {
        if epoch == self.epoch {
            self.selections_in_flight = self.selections_in_flight.saturating_sub(1);
        }
    }

    /// False once a reset happened after the selection of `epoch` started.
    pub fn is_current(&self, epoch: u64) -> bool {
        epoch == self.epoch
    }

    /// Stores the newly queued track, returning the record it replaces.
    pub fn record_enqueued(&mut self, pending: PendingTrack) -> Option<PendingTrack> {
        self.pending.replace(pending)
    }

    pub fn clear_pending(&mut self) -> Option<PendingTrack> {
        self.pending.take()
    }

    pub fn issue_poll(&mut self) -> u64 {
        self.polls.issue()
    }

    /// Replaces the snapshot with the response of poll `seq`, unless a later
    /// poll was already applied.
    pub fn apply_snapshot(&mut self, seq: u64, snapshot: PlaybackSnapshot) -> SnapshotApplied {
        if !self.polls.accept(seq) {
            return SnapshotApplied::Stale;
        }

        let now_playing_pending = matches!(
            (&self.pending, snapshot.current_uri()),
            (Some(pending), Some(uri)) if pending.track.same_as(uri)
        );
        let handed_off = if now_playing_pending {
            self.pending.take()
        } else {
            None
        };
        self.snapshot = Some(snapshot);
        SnapshotApplied::Applied { handed_off }
    }

    /// Forgets everything tied to the logged-out session. Polls and
    /// selections still in flight become stale.
    pub fn reset(&mut self) {
        let mut polls = self.polls;
        polls.invalidate_in_flight();
        *self = Self {
            polls,
            epoch: self.epoch + 1,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsespotify::Track;

    fn track(id: &str) -> Track {
        Track {
            uri: format!("spotify:track:{id}"),
            name: id.to_string(),
            artist: "Artist".to_string(),
            album_art: None,
        }
    }

    fn apply(state: &mut OrchestratorState, current: Option<Track>) -> SnapshotApplied {
        let seq = state.issue_poll();
        let snapshot = match current {
            Some(t) => PlaybackSnapshot::playing(t, true),
            None => PlaybackSnapshot::nothing_playing(),
        };
        state.apply_snapshot(seq, snapshot)
    }

    #[test]
    fn test_no_selection_without_auto_play() {
        let mut state = OrchestratorState::new();
        let step = state.observe_heart_rate(Some(130));
        assert!(step.transition.is_some());
        assert_eq!(step.select, None);
        assert_eq!(state.phase(), OrchestratorPhase::Idle);
    }

    #[test]
    fn test_transition_selects_with_auto_play() {
        let mut state = OrchestratorState::new();
        state.set_auto_play(true);
        assert_eq!(state.observe_heart_rate(Some(90)).select, Some(Zone::Slow));
        assert_eq!(state.observe_heart_rate(Some(95)).select, None);
        assert_eq!(state.observe_heart_rate(Some(130)).select, Some(Zone::Fast));
        assert_eq!(state.phase(), OrchestratorPhase::Monitoring);
    }

    #[test]
    fn test_transition_to_none_never_selects() {
        let mut state = OrchestratorState::new();
        state.set_auto_play(true);
        state.observe_heart_rate(Some(130));
        let step = state.observe_heart_rate(None);
        assert!(step.transition.is_some());
        assert_eq!(step.select, None);
        assert_eq!(state.last_zone(), None);
    }

    #[test]
    fn test_enabling_auto_play_selects_current_zone_once() {
        let mut state = OrchestratorState::new();
        assert_eq!(state.set_auto_play(true), None);
        state.set_auto_play(false);

        state.observe_heart_rate(Some(125));
        assert_eq!(state.set_auto_play(true), Some(Zone::Fast));
        assert_eq!(state.set_auto_play(true), None);
        assert_eq!(state.set_auto_play(false), None);
    }

    #[test]
    fn test_disabling_auto_play_keeps_pending() {
        let mut state = OrchestratorState::new();
        state.set_auto_play(true);
        state.record_enqueued(PendingTrack::new(track("a"), Zone::Slow));
        state.set_auto_play(false);
        assert!(state.pending().is_some());
    }

    #[test]
    fn test_hand_off_clears_matching_pending_only() {
        let mut state = OrchestratorState::new();
        state.record_enqueued(PendingTrack::new(track("next"), Zone::Fast));

        assert_eq!(
            apply(&mut state, Some(track("other"))),
            SnapshotApplied::Applied { handed_off: None }
        );
        assert!(state.pending().is_some());

        assert_eq!(
            apply(&mut state, None),
            SnapshotApplied::Applied { handed_off: None }
        );
        assert!(state.pending().is_some());

        match apply(&mut state, Some(track("next"))) {
            SnapshotApplied::Applied {
                handed_off: Some(pending),
            } => assert_eq!(pending.uri(), "spotify:track:next"),
            other => panic!("expected hand-off, got {other:?}"),
        }
        assert!(state.pending().is_none());
    }

    #[test]
    fn test_last_writer_wins() {
        let mut state = OrchestratorState::new();
        state.record_enqueued(PendingTrack::new(track("a"), Zone::Slow));
        let replaced = state.record_enqueued(PendingTrack::new(track("b"), Zone::Fast));
        assert_eq!(replaced.unwrap().uri(), "spotify:track:a");
        assert_eq!(state.pending().unwrap().uri(), "spotify:track:b");
    }

    #[test]
    fn test_stale_snapshot_is_dropped() {
        let mut state = OrchestratorState::new();
        let slow = state.issue_poll();
        let fast = state.issue_poll();

        state.apply_snapshot(fast, PlaybackSnapshot::playing(track("new"), true));
        let result = state.apply_snapshot(slow, PlaybackSnapshot::playing(track("old"), true));

        assert_eq!(result, SnapshotApplied::Stale);
        assert_eq!(state.snapshot().unwrap().current_uri(), Some("spotify:track:new"));
    }

    #[test]
    fn test_selecting_phase() {
        let mut state = OrchestratorState::new();
        let epoch = state.begin_selection();
        assert_eq!(state.phase(), OrchestratorPhase::Selecting);
        state.end_selection(epoch);
        assert_eq!(state.phase(), OrchestratorPhase::Idle);
    }

    #[test]
    fn test_reset_outdates_running_selection() {
        let mut state = OrchestratorState::new();
        let before = state.begin_selection();

        state.reset();
        let after = state.begin_selection();
        // the outdated selection must not end the new one
        state.end_selection(before);

        assert!(!state.is_current(before));
        assert!(state.is_current(after));
        assert_eq!(state.phase(), OrchestratorPhase::Selecting);
    }

    #[test]
    fn test_reset_invalidates_in_flight_polls() {
        let mut state = OrchestratorState::new();
        state.set_auto_play(true);
        state.observe_heart_rate(Some(110));
        state.record_enqueued(PendingTrack::new(track("a"), Zone::Medium));
        let in_flight = state.issue_poll();

        state.reset();

        assert!(!state.auto_play());
        assert!(state.pending().is_none());
        assert_eq!(state.last_zone(), None);
        assert_eq!(
            state.apply_snapshot(in_flight, PlaybackSnapshot::nothing_playing()),
            SnapshotApplied::Stale
        );
    }
}
