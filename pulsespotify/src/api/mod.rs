//! Couche d'accès à l'API REST Spotify
//!
//! Ce module fournit une interface bas-niveau pour communiquer avec l'API.
//! Chaque requête porte le token en `Bearer` ; le token n'est jamais conservé
//! par l'API elle-même.

pub mod player;
pub mod playlist;

use crate::auth::AccessToken;
use crate::error::{Result, SpotifyError};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

/// URL de base de l'API Spotify
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

/// Raison renvoyée par Spotify lorsqu'aucun appareil n'est actif
const NO_ACTIVE_DEVICE_REASON: &str = "NO_ACTIVE_DEVICE";

/// Corps d'erreur standard de l'API Web Spotify
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// Client API bas-niveau pour communiquer avec Spotify
#[derive(Debug, Clone)]
pub struct SpotifyApi {
    /// Client HTTP
    client: Client,
    /// URL de base (sans `/` final)
    api_base: String,
}

impl SpotifyApi {
    /// Crée une nouvelle instance de l'API
    pub fn new(client: Client, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self { client, api_base }
    }

    /// Retourne l'URL de base
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Construit l'URL complète d'un endpoint
    pub(crate) fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}{}", self.api_base, endpoint))?)
    }

    /// Effectue une requête GET et parse le JSON ; `None` sur 204 No Content
    pub(crate) async fn get_optional<T: DeserializeOwned>(
        &self,
        url: Url,
        token: &AccessToken,
    ) -> Result<Option<T>> {
        let response = self.send(Method::GET, url, token).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let response = Self::check_status(response).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text).map(Some).map_err(|e| {
            warn!("Failed to parse response: {}", e);
            SpotifyError::JsonParse(e)
        })
    }

    /// Effectue une requête GET dont le corps est obligatoire
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url, token: &AccessToken) -> Result<T> {
        self.get_optional(url.clone(), token)
            .await?
            .ok_or_else(|| SpotifyError::ApiError {
                code: StatusCode::NO_CONTENT.as_u16(),
                message: format!("Empty response body for {}", url.path()),
            })
    }

    /// Envoie une commande (PUT/POST) dont le corps de réponse est ignoré
    pub(crate) async fn command(&self, method: Method, url: Url, token: &AccessToken) -> Result<()> {
        let response = self.send(method, url, token).await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn send(&self, method: Method, url: Url, token: &AccessToken) -> Result<Response> {
        debug!("{} {}", method, url);

        let request = self
            .client
            .request(method.clone(), url)
            .bearer_auth(token.as_str());

        // Spotify exige un Content-Length sur les PUT/POST sans corps
        let request = if method == Method::GET {
            request
        } else {
            request.header(reqwest::header::CONTENT_LENGTH, 0)
        };

        let response = request.send().await?;
        debug!("Response status: {}", response.status());
        Ok(response)
    }

    /// Convertit une réponse non-succès en erreur typée
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let status_code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        let (message, reason) = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => (
                envelope.error.message.unwrap_or_else(|| body.clone()),
                envelope.error.reason,
            ),
            Err(_) => (body, None),
        };

        warn!("API error ({}): {}", status_code, message);

        if reason.as_deref() == Some(NO_ACTIVE_DEVICE_REASON) {
            return Err(SpotifyError::NoActiveDevice);
        }
        Err(SpotifyError::from_status_code(status_code, message))
    }
}
