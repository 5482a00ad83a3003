use pulsespotify::SpotifyError;
use thiserror::Error;

use crate::zone::Zone;

pub type Result<T> = std::result::Result<T, ControlError>;

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Not connected to Spotify")]
    NotConnected,
    #[error("No playlist configured for the {0} zone")]
    PlaylistNotConfigured(Zone),
    #[error("Invalid playlist reference: {0}")]
    InvalidReference(String),
    #[error("Spotify session expired, please log in again")]
    Unauthenticated,
    #[error("No active device, start playback on a device first")]
    NoActiveDevice,
    #[error("No tracks found in the {0} playlist")]
    EmptyCandidates(Zone),
    #[error("Spotify request failed{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Upstream { status: Option<u16>, message: String },
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Please set up all playlists first")]
    IncompletePlaylists,
    #[error("Unknown zone '{0}'")]
    UnknownZone(String),
    #[error("Session closed")]
    SessionClosed,
    #[error("Session was reset while the request was in flight")]
    Superseded,
}

impl ControlError {
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ControlError::Unauthenticated)
    }

    fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        ControlError::Upstream {
            status,
            message: message.into(),
        }
    }
}

impl From<SpotifyError> for ControlError {
    fn from(err: SpotifyError) -> Self {
        match err {
            SpotifyError::Unauthorized(_) => ControlError::Unauthenticated,
            SpotifyError::NoActiveDevice => ControlError::NoActiveDevice,
            SpotifyError::InvalidReference(reference) => ControlError::InvalidReference(reference),
            SpotifyError::Http(e) => ControlError::Transport(e.to_string()),
            SpotifyError::ApiError { code, message } => ControlError::upstream(Some(code), message),
            other => {
                let status = other.status_code();
                ControlError::upstream(status, other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spotify_error_mapping() {
        assert!(ControlError::from(SpotifyError::Unauthorized("expired".into())).is_auth_error());
        assert!(matches!(
            ControlError::from(SpotifyError::NoActiveDevice),
            ControlError::NoActiveDevice
        ));
        assert!(matches!(
            ControlError::from(SpotifyError::from_status_code(503, "down")),
            ControlError::Upstream {
                status: Some(503),
                ..
            }
        ));
        assert!(matches!(
            ControlError::from(SpotifyError::RateLimitExceeded),
            ControlError::Upstream {
                status: Some(429),
                ..
            }
        ));
    }

    #[test]
    fn test_upstream_message() {
        let err = ControlError::Upstream {
            status: Some(500),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "Spotify request failed (HTTP 500): boom");
    }
}
