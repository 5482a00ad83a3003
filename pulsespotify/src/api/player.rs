//! Endpoints `/me/player` : état de lecture, commandes et file d'attente

use super::SpotifyApi;
use crate::auth::AccessToken;
use crate::error::{Result, SpotifyError};
use crate::models::{CurrentlyPlayingResponse, Device, PlaybackSnapshot, PlayerStateResponse};
use reqwest::Method;
use tracing::debug;

impl SpotifyApi {
    /// Récupère la piste en cours de lecture
    ///
    /// Une réponse 204 (rien en lecture) donne le snapshot sentinelle.
    pub async fn currently_playing(&self, token: &AccessToken) -> Result<PlaybackSnapshot> {
        let url = self.endpoint_url("/me/player/currently-playing")?;
        let response: Option<CurrentlyPlayingResponse> = self.get_optional(url, token).await?;
        Ok(match response {
            Some(response) => response.into_snapshot(),
            None => PlaybackSnapshot::nothing_playing(),
        })
    }

    /// Récupère l'appareil de lecture courant
    ///
    /// Retourne `None` si aucun appareil n'est actif (204 ou 404).
    pub async fn active_device(&self, token: &AccessToken) -> Result<Option<Device>> {
        let url = self.endpoint_url("/me/player")?;
        match self.get_optional::<PlayerStateResponse>(url, token).await {
            Ok(Some(state)) => Ok(match state.device {
                Some(device) => Some(Device::from(device)).filter(|d| d.is_active),
                // Une réponse 200 sans objet device signifie qu'une session de
                // lecture existe
                None => Some(Device {
                    id: None,
                    name: String::new(),
                    is_active: true,
                }),
            }),
            Ok(None) => Ok(None),
            Err(SpotifyError::NotFound(_)) | Err(SpotifyError::NoActiveDevice) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Reprend la lecture sur l'appareil actif
    pub async fn play(&self, token: &AccessToken) -> Result<()> {
        let url = self.endpoint_url("/me/player/play")?;
        self.player_command(Method::PUT, url, token).await
    }

    /// Met la lecture en pause
    pub async fn pause(&self, token: &AccessToken) -> Result<()> {
        let url = self.endpoint_url("/me/player/pause")?;
        self.player_command(Method::PUT, url, token).await
    }

    /// Passe à la piste suivante
    pub async fn next(&self, token: &AccessToken) -> Result<()> {
        let url = self.endpoint_url("/me/player/next")?;
        self.player_command(Method::POST, url, token).await
    }

    /// Ajoute une piste à la fin de la file d'attente de l'appareil actif
    pub async fn add_to_queue(&self, track_uri: &str, token: &AccessToken) -> Result<()> {
        debug!("Queueing track {}", track_uri);
        let mut url = self.endpoint_url("/me/player/queue")?;
        url.query_pairs_mut().append_pair("uri", track_uri);
        self.player_command(Method::POST, url, token).await
    }

    /// Les endpoints player répondent 404 lorsqu'aucun appareil n'est actif
    async fn player_command(&self, method: Method, url: url::Url, token: &AccessToken) -> Result<()> {
        match self.command(method, url, token).await {
            Err(SpotifyError::NotFound(_)) => Err(SpotifyError::NoActiveDevice),
            other => other,
        }
    }
}
