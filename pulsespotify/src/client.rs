//! Client haut-niveau pour l'API Spotify
//!
//! `SpotifyClient` enveloppe [`SpotifyApi`] et expose les opérations dont
//! l'orchestrateur a besoin, exprimées en termes de références de playlist et
//! de pistes plutôt qu'en endpoints.

use crate::api::{DEFAULT_API_BASE, SpotifyApi};
use crate::auth::AccessToken;
use crate::config_ext::SpotifyConfigExt;
use crate::error::Result;
use crate::models::{Device, PlaybackSnapshot, Track};
use crate::playlist_ref::parse_playlist_ref;
use pulseconfig::Config;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// User-Agent par défaut
pub const DEFAULT_USER_AGENT: &str = "PulseDJ/0.1.0";

/// Client Spotify haut-niveau
///
/// Le client ne détient pas de token : chaque opération reçoit le token
/// courant, ce qui permet à l'appelant d'effacer la session sans reconstruire
/// le client.
///
/// # Exemple
///
/// ```no_run
/// use pulsespotify::{AccessToken, SpotifyClient};
///
/// # async fn demo() -> pulsespotify::Result<()> {
/// let client = SpotifyClient::builder()
///     .api_base("http://localhost:8080/v1")
///     .build()?;
/// let token = AccessToken::new("BQD...").unwrap();
/// client.enqueue("spotify:track:4uLU6hMCjMI75M1A2tKUQC", &token).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    api: SpotifyApi,
}

impl SpotifyClient {
    /// Crée un client avec les paramètres par défaut
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Crée un builder pour configurer le client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Crée un client à partir de la configuration PulseDJ
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_base = config.get_spotify_api_base()?;
        info!("Spotify client using API base {}", api_base);
        Self::builder().api_base(api_base).build()
    }

    /// Accès à l'API bas-niveau
    pub fn api(&self) -> &SpotifyApi {
        &self.api
    }

    /// Récupère les pistes candidates d'une playlist
    ///
    /// La référence peut être un identifiant, une URI `spotify:` ou une URL
    /// `open.spotify.com`. Seules les pistes jouables sont retournées, avec
    /// le premier artiste de chacune.
    ///
    /// # Errors
    ///
    /// * `SpotifyError::InvalidReference` - aucun identifiant extractible
    /// * `SpotifyError::Unauthorized` - token refusé
    pub async fn fetch_candidates(&self, reference: &str, token: &AccessToken) -> Result<Vec<Track>> {
        let playlist_id = parse_playlist_ref(reference)?;
        self.api.get_playlist_tracks(&playlist_id, token).await
    }

    /// Récupère l'état de lecture courant
    pub async fn current_playback(&self, token: &AccessToken) -> Result<PlaybackSnapshot> {
        self.api.currently_playing(token).await
    }

    /// Récupère l'appareil actif, `None` s'il n'y en a aucun
    pub async fn active_device(&self, token: &AccessToken) -> Result<Option<Device>> {
        self.api.active_device(token).await
    }

    /// Vérifie qu'un appareil peut recevoir des commandes
    pub async fn has_active_device(&self, token: &AccessToken) -> Result<bool> {
        let device = self.active_device(token).await?;
        if let Some(device) = &device {
            debug!("Active device: {:?}", device.name);
        }
        Ok(device.is_some())
    }

    /// Ajoute une piste à la file d'attente de l'appareil actif
    pub async fn enqueue(&self, track_uri: &str, token: &AccessToken) -> Result<()> {
        self.api.add_to_queue(track_uri, token).await
    }

    pub async fn play(&self, token: &AccessToken) -> Result<()> {
        self.api.play(token).await
    }

    pub async fn pause(&self, token: &AccessToken) -> Result<()> {
        self.api.pause(token).await
    }

    /// Passe à la piste suivante de la file d'attente
    pub async fn skip_next(&self, token: &AccessToken) -> Result<()> {
        self.api.next(token).await
    }
}

/// Builder pour [`SpotifyClient`]
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    client: Option<Client>,
    api_base: String,
    /// `None` : seul le timeout du transport s'applique
    request_timeout: Option<Duration>,
    user_agent: String,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Utilise un client HTTP existant (le timeout et le User-Agent sont ignorés)
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Définit l'URL de base de l'API
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    /// Définit un timeout par requête (aucun par défaut)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Définit le User-Agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Construit le client
    pub fn build(self) -> Result<SpotifyClient> {
        let client = match self.client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder().user_agent(&self.user_agent);
                if let Some(timeout) = self.request_timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(SpotifyClient {
            api: SpotifyApi::new(client, self.api_base),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_has_no_request_timeout_by_default() {
        let builder = ClientBuilder::new();
        assert_eq!(builder.request_timeout, None);
        assert_eq!(builder.api_base, DEFAULT_API_BASE);

        let builder = builder.timeout(Duration::from_secs(3));
        assert_eq!(builder.request_timeout, Some(Duration::from_secs(3)));
        assert!(builder.build().is_ok());
    }
}
