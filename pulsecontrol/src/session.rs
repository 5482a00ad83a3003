//! Session context: the single owner of orchestrator state.
//!
//! A `Session` bundles the playback backend, the token store, the playlist
//! mapping and the orchestrator state. Heart-rate readings, user commands and
//! the poll timer all go through it. Locks are only held for synchronous state
//! updates, never across a network call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossbeam_channel::Receiver;
use pulsespotify::config_ext::DEFAULT_SKIP_REFRESH_DELAY_MS;
use pulsespotify::{AccessToken, TokenStore, parse_playlist_ref};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::PlaybackBackend;
use crate::errors::{ControlError, Result};
use crate::events::SessionEventBus;
use crate::model::{
    ClearReason, Notice, PendingTrack, SessionEvent, SessionStatus, ZonePlaylists,
};
use crate::orchestrator::{OrchestratorState, SnapshotApplied};
use crate::poller::PollOutcome;
use crate::selection::{self, Draw, UniformDraw};
use crate::zone::{Zone, ZoneTransition};

pub struct Session {
    backend: Arc<dyn PlaybackBackend>,
    tokens: Arc<dyn TokenStore>,
    playlists: Mutex<ZonePlaylists>,
    state: Mutex<OrchestratorState>,
    draw: Mutex<Box<dyn Draw>>,
    events: SessionEventBus,
    skip_refresh_delay: Duration,
    shutdown: CancellationToken,
}

pub struct SessionBuilder {
    backend: Arc<dyn PlaybackBackend>,
    tokens: Arc<dyn TokenStore>,
    playlists: ZonePlaylists,
    draw: Option<Box<dyn Draw>>,
    events: Option<SessionEventBus>,
    skip_refresh_delay: Duration,
}

impl SessionBuilder {
    pub fn playlists(mut self, playlists: ZonePlaylists) -> Self {
        self.playlists = playlists;
        self
    }

    /// Replaces the uniform random draw (deterministic tests).
    pub fn draw(mut self, draw: impl Draw + 'static) -> Self {
        self.draw = Some(Box::new(draw));
        self
    }

    pub fn events(mut self, events: SessionEventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Delay between a successful skip and the poll that follows it.
    pub fn skip_refresh_delay(mut self, delay: Duration) -> Self {
        self.skip_refresh_delay = delay;
        self
    }

    pub fn build(self) -> Session {
        Session {
            backend: self.backend,
            tokens: self.tokens,
            playlists: Mutex::new(self.playlists),
            state: Mutex::new(OrchestratorState::new()),
            draw: Mutex::new(
                self.draw
                    .unwrap_or_else(|| Box::new(UniformDraw::new())),
            ),
            events: self.events.unwrap_or_default(),
            skip_refresh_delay: self.skip_refresh_delay,
            shutdown: CancellationToken::new(),
        }
    }
}

impl Session {
    pub fn builder(backend: Arc<dyn PlaybackBackend>, tokens: Arc<dyn TokenStore>) -> SessionBuilder {
        SessionBuilder {
            backend,
            tokens,
            playlists: ZonePlaylists::default(),
            draw: None,
            events: None,
            skip_refresh_delay: Duration::from_millis(DEFAULT_SKIP_REFRESH_DELAY_MS),
        }
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.tokens.is_connected()
    }

    pub fn auto_play(&self) -> bool {
        self.lock_state().auto_play()
    }

    pub fn pending(&self) -> Option<PendingTrack> {
        self.lock_state().pending().cloned()
    }

    pub fn playlists(&self) -> ZonePlaylists {
        self.lock_playlists().clone()
    }

    pub fn status(&self) -> SessionStatus {
        let playlists = self.playlists();
        let connected = self.is_connected();
        let state = self.lock_state();
        SessionStatus {
            connected,
            auto_play: state.auto_play(),
            phase: state.phase(),
            heart_rate: state.heart_rate(),
            zone: state.last_zone(),
            now_playing: if connected {
                state.snapshot().cloned()
            } else {
                None
            },
            pending: state.pending().cloned(),
            playlists,
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stops the poll timer. Results of calls still in flight are dropped.
    pub fn shutdown(&self) {
        info!("Shutting down session");
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    // ---------------------------------------------------------------------
    // Heart rate and auto-play
    // ---------------------------------------------------------------------

    /// Handles a sensor reading (`None` when the sensor lost the signal).
    pub async fn on_heart_rate(&self, bpm: Option<u32>) -> Option<ZoneTransition> {
        let step = self.lock_state().observe_heart_rate(bpm);

        if let Some(transition) = step.transition {
            info!(
                "Zone changed: {} -> {} ({:?} bpm)",
                zone_label(transition.from),
                zone_label(transition.to),
                bpm
            );
            self.events
                .broadcast(SessionEvent::ZoneChanged { bpm, transition });
        }

        if let Some(zone) = step.select {
            self.run_selection(zone).await;
        }

        step.transition
    }

    /// Enables or disables automatic selection.
    ///
    /// Enabling requires a connected session and a playlist for every zone.
    /// When a zone is already established, enabling selects for it at once.
    pub async fn set_auto_play(&self, enabled: bool) -> Result<()> {
        if enabled {
            if !self.is_connected() {
                self.notify(Notice::error("Please connect to Spotify first"));
                return Err(ControlError::NotConnected);
            }
            if !self.lock_playlists().is_complete() {
                self.notify(Notice::error("Please set up all playlists first"));
                return Err(ControlError::IncompletePlaylists);
            }
        }

        let (changed, select) = {
            let mut state = self.lock_state();
            let changed = state.auto_play() != enabled;
            (changed, state.set_auto_play(enabled))
        };

        if changed {
            info!("Auto-play {}", if enabled { "enabled" } else { "disabled" });
            self.events
                .broadcast(SessionEvent::AutoPlayChanged { enabled });
            self.notify(if enabled {
                Notice::success("Auto DJ started: songs will queue based on your heart rate")
            } else {
                Notice::info("Auto DJ stopped: automatic song selection has been disabled")
            });
        }

        if let Some(zone) = select {
            self.run_selection(zone).await;
        }
        Ok(())
    }

    pub async fn toggle_auto_play(&self) -> Result<bool> {
        let enabled = !self.auto_play();
        self.set_auto_play(enabled).await?;
        Ok(enabled)
    }

    // ---------------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------------

    /// Picks a track from `zone`'s playlist and queues it on the active device.
    ///
    /// On success the track becomes the pending record, replacing any
    /// previous one. Failures are final for this attempt.
    pub async fn select_for(&self, zone: Zone) -> Result<PendingTrack> {
        let token = self.tokens.token().ok_or(ControlError::NotConnected)?;
        let reference = self
            .lock_playlists()
            .get(zone)
            .map(str::to_string)
            .ok_or(ControlError::PlaylistNotConfigured(zone))?;

        let epoch = self.lock_state().begin_selection();
        let result = self
            .select_and_enqueue(zone, &reference, &token, epoch)
            .await;
        self.lock_state().end_selection(epoch);

        result.map_err(|err| self.on_error(err, &token))
    }

    async fn select_and_enqueue(
        &self,
        zone: Zone,
        reference: &str,
        token: &AccessToken,
        epoch: u64,
    ) -> Result<PendingTrack> {
        debug!("Selecting a track for the {} zone from {}", zone, reference);

        if !self.backend.has_active_device(token).await? {
            return Err(ControlError::NoActiveDevice);
        }

        let candidates = self.backend.fetch_candidates(reference, token).await?;
        let track = {
            let mut draw = self.lock_draw();
            selection::select(&candidates, draw.as_mut()).cloned()
        }
        .ok_or(ControlError::EmptyCandidates(zone))?;

        debug!(
            "Picked {} out of {} candidates",
            track.uri,
            candidates.len()
        );
        self.backend.enqueue(&track.uri, token).await?;

        if self.is_shut_down() {
            return Err(ControlError::SessionClosed);
        }

        let pending = PendingTrack::new(track, zone);
        let replaced = {
            let mut state = self.lock_state();
            if !state.is_current(epoch) {
                debug!("Session reset during selection, dropping {}", pending.uri());
                return Err(ControlError::Superseded);
            }
            state.record_enqueued(pending.clone())
        };
        if let Some(replaced) = replaced {
            debug!("Pending track {} replaced", replaced.uri());
        }

        info!(
            "Queued {} ({} by {}) for the {} zone",
            pending.uri(),
            pending.track.name,
            pending.track.artist,
            zone
        );
        self.events
            .broadcast(SessionEvent::TrackQueued(pending.clone()));
        self.notify(Notice::success(format!(
            "Queued: {} by {}",
            pending.track.name, pending.track.artist
        )));
        Ok(pending)
    }

    async fn run_selection(&self, zone: Zone) {
        let Err(err) = self.select_for(zone).await else {
            return;
        };
        warn!("Track selection for the {} zone failed: {}", zone, err);

        let notice = match &err {
            ControlError::NoActiveDevice => {
                Notice::warning("No active device: start playback on a Spotify device first")
            }
            ControlError::EmptyCandidates(_) => Notice::warning("No tracks found in playlist"),
            ControlError::NotConnected => Notice::error("Please connect to Spotify first"),
            ControlError::PlaylistNotConfigured(_) | ControlError::InvalidReference(_) => {
                Notice::warning(err.to_string())
            }
            // expire() already told the user
            ControlError::Unauthenticated
            | ControlError::SessionClosed
            | ControlError::Superseded => return,
            other => Notice::error(format!("Failed to queue next song: {other}")),
        };
        self.notify(notice);
    }

    // ---------------------------------------------------------------------
    // Polling
    // ---------------------------------------------------------------------

    /// Refreshes the playback snapshot once.
    ///
    /// Only an authentication failure escapes the poll: it disconnects the
    /// session. Other failures keep the previous snapshot.
    pub async fn poll(&self) -> PollOutcome {
        if self.is_shut_down() {
            return PollOutcome::Discarded;
        }
        let Some(token) = self.tokens.token() else {
            return PollOutcome::NotConnected;
        };

        let seq = self.lock_state().issue_poll();
        let result = self.backend.current_playback(&token).await;

        if self.is_shut_down() {
            return PollOutcome::Discarded;
        }

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(err) => {
                let err = ControlError::from(err);
                if err.is_auth_error() {
                    warn!("Poll #{} rejected by Spotify", seq);
                    self.expire(&token);
                    return PollOutcome::Unauthenticated;
                }
                warn!("Poll #{} failed, keeping previous snapshot: {}", seq, err);
                return PollOutcome::Skipped(err);
            }
        };

        let applied = self.lock_state().apply_snapshot(seq, snapshot.clone());
        match applied {
            SnapshotApplied::Stale => {
                debug!("Dropping stale response of poll #{}", seq);
                PollOutcome::Stale
            }
            SnapshotApplied::Applied { handed_off } => {
                if let Some(pending) = handed_off {
                    info!("Queued track {} is now playing", pending.uri());
                    self.events.broadcast(SessionEvent::PendingCleared {
                        uri: pending.track.uri,
                        reason: ClearReason::HandOff,
                    });
                }
                self.events
                    .broadcast(SessionEvent::Snapshot(snapshot.clone()));
                PollOutcome::Applied(snapshot)
            }
        }
    }

    async fn refresh_after(&self, delay: Duration) {
        if delay.is_zero() {
            self.poll().await;
            return;
        }
        tokio::select! {
            _ = self.shutdown.cancelled() => {}
            _ = tokio::time::sleep(delay) => {
                self.poll().await;
            }
        }
    }

    // ---------------------------------------------------------------------
    // Playback commands
    // ---------------------------------------------------------------------

    /// Pauses when `is_currently_playing`, resumes otherwise, then refreshes.
    pub async fn play_pause(&self, is_currently_playing: bool) -> Result<()> {
        let token = self.require_token()?;
        let result = if is_currently_playing {
            self.backend.pause(&token).await
        } else {
            self.backend.play(&token).await
        };

        match result {
            Ok(()) => {
                self.refresh_after(Duration::ZERO).await;
                Ok(())
            }
            Err(err) => Err(self.command_failed("play/pause", err.into(), &token)),
        }
    }

    /// Play/pause based on the last applied snapshot.
    pub async fn toggle_playback(&self) -> Result<()> {
        let is_playing = self
            .lock_state()
            .snapshot()
            .is_some_and(|snapshot| snapshot.is_playing);
        self.play_pause(is_playing).await
    }

    /// Skips to the next track.
    ///
    /// The pending record is cleared before the command is sent, since the
    /// skip may land on something other than the queued track. No new track
    /// is selected.
    pub async fn skip(&self) -> Result<()> {
        let token = self.require_token()?;

        let cleared = self.lock_state().clear_pending();
        if let Some(pending) = cleared {
            debug!("Skip cleared pending track {}", pending.uri());
            self.events.broadcast(SessionEvent::PendingCleared {
                uri: pending.track.uri,
                reason: ClearReason::Skip,
            });
        }

        match self.backend.skip_next(&token).await {
            Ok(()) => {
                self.refresh_after(self.skip_refresh_delay).await;
                Ok(())
            }
            Err(err) => Err(self.command_failed("skip", err.into(), &token)),
        }
    }

    fn command_failed(&self, command: &str, err: ControlError, token: &AccessToken) -> ControlError {
        warn!("Playback command {} failed: {}", command, err);
        let err = self.on_error(err, token);
        match &err {
            ControlError::Unauthenticated => {}
            ControlError::NoActiveDevice => self.notify(Notice::warning(
                "No active device: start playback on a Spotify device first",
            )),
            other => self.notify(Notice::error(format!("Failed to {command}: {other}"))),
        }
        err
    }

    // ---------------------------------------------------------------------
    // Session and configuration
    // ---------------------------------------------------------------------

    /// Logs out: drops the token and every piece of state tied to it.
    pub fn disconnect(&self) {
        let was_connected = self.tokens.is_connected();
        self.tokens.clear();
        self.forget_session();

        if was_connected {
            info!("Spotify session disconnected");
            self.events.broadcast(SessionEvent::Disconnected);
            self.notify(Notice::info("Disconnected from Spotify"));
        }
    }

    /// Handles a 401 on a request sent with `token`.
    ///
    /// A token stored since the request left (a new login) is kept, along
    /// with the state of its session.
    fn expire(&self, token: &AccessToken) {
        if !self.tokens.clear_if(token) {
            debug!("Rejected token was already replaced, keeping the session");
            return;
        }
        self.forget_session();

        warn!("Spotify token rejected, session disconnected");
        self.events.broadcast(SessionEvent::Disconnected);
        self.notify(Notice::error(
            "Spotify session expired, please connect again",
        ));
    }

    fn forget_session(&self) {
        let cleared = {
            let mut state = self.lock_state();
            let pending = state.clear_pending();
            state.reset();
            pending
        };
        if let Some(pending) = cleared {
            self.events.broadcast(SessionEvent::PendingCleared {
                uri: pending.track.uri,
                reason: ClearReason::Disconnect,
            });
        }
    }

    /// Sets or clears (`reference` blank) the playlist of `zone`.
    pub fn set_playlist(&self, zone: Zone, reference: &str) -> Result<()> {
        let reference = reference.trim();
        if reference.is_empty() {
            self.lock_playlists().set(zone, None);
            info!("Playlist for the {} zone cleared", zone);
            return Ok(());
        }

        parse_playlist_ref(reference)?;
        self.lock_playlists()
            .set(zone, Some(reference.to_string()));
        info!("Playlist for the {} zone set to {}", zone, reference);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    fn require_token(&self) -> Result<AccessToken> {
        self.tokens.token().ok_or_else(|| {
            self.notify(Notice::error("Please connect to Spotify first"));
            ControlError::NotConnected
        })
    }

    fn on_error(&self, err: ControlError, token: &AccessToken) -> ControlError {
        if err.is_auth_error() {
            self.expire(token);
        }
        err
    }

    fn notify(&self, notice: Notice) {
        self.events.broadcast(SessionEvent::Notice(notice));
    }

    fn lock_state(&self) -> MutexGuard<'_, OrchestratorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_playlists(&self) -> MutexGuard<'_, ZonePlaylists> {
        self.playlists.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_draw(&self) -> MutexGuard<'_, Box<dyn Draw>> {
        self.draw.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn zone_label(zone: Option<Zone>) -> &'static str {
    zone.map(|z| z.as_str()).unwrap_or("none")
}
