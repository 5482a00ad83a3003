//! Remote playback operations the session depends on.

use async_trait::async_trait;
use pulsespotify::{AccessToken, PlaybackSnapshot, SpotifyClient, Track};

/// Playback service seen by the session.
///
/// `SpotifyClient` is the production implementation; tests provide fakes.
/// Errors keep the client's type so that status codes survive until the
/// session classifies them.
#[async_trait]
pub trait PlaybackBackend: Send + Sync {
    async fn fetch_candidates(
        &self,
        reference: &str,
        token: &AccessToken,
    ) -> pulsespotify::Result<Vec<Track>>;

    async fn current_playback(&self, token: &AccessToken) -> pulsespotify::Result<PlaybackSnapshot>;

    async fn has_active_device(&self, token: &AccessToken) -> pulsespotify::Result<bool>;

    async fn enqueue(&self, track_uri: &str, token: &AccessToken) -> pulsespotify::Result<()>;

    async fn play(&self, token: &AccessToken) -> pulsespotify::Result<()>;

    async fn pause(&self, token: &AccessToken) -> pulsespotify::Result<()>;

    async fn skip_next(&self, token: &AccessToken) -> pulsespotify::Result<()>;
}

#[async_trait]
impl PlaybackBackend for SpotifyClient {
    async fn fetch_candidates(
        &self,
        reference: &str,
        token: &AccessToken,
    ) -> pulsespotify::Result<Vec<Track>> {
        SpotifyClient::fetch_candidates(self, reference, token).await
    }

    async fn current_playback(&self, token: &AccessToken) -> pulsespotify::Result<PlaybackSnapshot> {
        SpotifyClient::current_playback(self, token).await
    }

    async fn has_active_device(&self, token: &AccessToken) -> pulsespotify::Result<bool> {
        SpotifyClient::has_active_device(self, token).await
    }

    async fn enqueue(&self, track_uri: &str, token: &AccessToken) -> pulsespotify::Result<()> {
        SpotifyClient::enqueue(self, track_uri, token).await
    }

    async fn play(&self, token: &AccessToken) -> pulsespotify::Result<()> {
        SpotifyClient::play(self, token).await
    }

    async fn pause(&self, token: &AccessToken) -> pulsespotify::Result<()> {
        SpotifyClient::pause(self, token).await
    }

    async fn skip_next(&self, token: &AccessToken) -> pulsespotify::Result<()> {
        SpotifyClient::skip_next(self, token).await
    }
}
