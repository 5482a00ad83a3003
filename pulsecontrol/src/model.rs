use chrono::{DateTime, Utc};
use pulseconfig::Config;
use pulsespotify::{PlaybackSnapshot, Track};
use serde::{Deserialize, Serialize};

use crate::zone::{Zone, ZoneTransition};

/// Playlist reference for each zone.
///
/// References are kept as the user typed them (id, URI or URL). A blank
/// reference is stored as `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonePlaylists {
    pub slow: Option<String>,
    pub medium: Option<String>,
    pub fast: Option<String>,
}

impl ZonePlaylists {
    pub fn from_config(config: &Config) -> Self {
        Self {
            slow: config.get_playlist_ref(Zone::Slow.as_str()),
            medium: config.get_playlist_ref(Zone::Medium.as_str()),
            fast: config.get_playlist_ref(Zone::Fast.as_str()),
        }
    }

    pub fn get(&self, zone: Zone) -> Option<&str> {
        match zone {
            Zone::Slow => self.slow.as_deref(),
            Zone::Medium => self.medium.as_deref(),
            Zone::Fast => self.fast.as_deref(),
        }
    }

    pub fn set(&mut self, zone: Zone, reference: Option<String>) {
        let reference = reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        match zone {
            Zone::Slow => self.slow = reference,
            Zone::Medium => self.medium = reference,
            Zone::Fast => self.fast = reference,
        }
    }

    /// True when every zone has a reference.
    pub fn is_complete(&self) -> bool {
        Zone::ALL.iter().all(|zone| self.get(*zone).is_some())
    }
}

/// Track the orchestrator asked Spotify to queue, not yet seen playing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingTrack {
    pub track: Track,
    pub zone: Zone,
    pub queued_at: DateTime<Utc>,
}

impl PendingTrack {
    pub fn new(track: Track, zone: Zone) -> Self {
        Self {
            track,
            zone,
            queued_at: Utc::now(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.track.uri
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestratorPhase {
    /// Auto-play off or no zone yet.
    Idle,
    Monitoring,
    /// Candidate fetch and enqueue in flight.
    Selecting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Short user-facing message, the console equivalent of a toast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Error, message)
    }

    fn with_level(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearReason {
    /// The pending track was seen playing.
    HandOff,
    Skip,
    Disconnect,
}

#[derive(Clone, Debug)]
pub enum SessionEvent {
    ZoneChanged {
        bpm: Option<u32>,
        transition: ZoneTransition,
    },
    AutoPlayChanged {
        enabled: bool,
    },
    TrackQueued(PendingTrack),
    PendingCleared {
        uri: String,
        reason: ClearReason,
    },
    Snapshot(PlaybackSnapshot),
    Notice(Notice),
    Disconnected,
}

/// Point-in-time view of a session, for display.
#[derive(Clone, Debug)]
pub struct SessionStatus {
    pub connected: bool,
    pub auto_play: bool,
    pub phase: OrchestratorPhase,
    pub heart_rate: Option<u32>,
    pub zone: Option<Zone>,
    pub now_playing: Option<PlaybackSnapshot>,
    pub pending: Option<PendingTrack>,
    pub playlists: ZonePlaylists,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_reference_is_unset() {
        let mut playlists = ZonePlaylists::default();
        playlists.set(Zone::Fast, Some("   ".into()));
        assert_eq!(playlists.get(Zone::Fast), None);

        playlists.set(Zone::Fast, Some(" abc ".into()));
        assert_eq!(playlists.get(Zone::Fast), Some("abc"));
    }

    #[test]
    fn test_is_complete() {
        let mut playlists = ZonePlaylists::default();
        assert!(!playlists.is_complete());
        for zone in Zone::ALL {
            playlists.set(zone, Some(format!("{zone}-list")));
        }
        assert!(playlists.is_complete());
    }
}
