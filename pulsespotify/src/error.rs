//! Gestion des erreurs pour le client Spotify

use thiserror::Error;

/// Type Result personnalisé pour pulsespotify
pub type Result<T> = std::result::Result<T, SpotifyError>;

/// Erreurs possibles lors de l'utilisation du client Spotify
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// Token refusé par Spotify (401) : il doit être effacé
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Aucun appareil de lecture actif sur le compte
    #[error("No active Spotify device found, start playback on a device first")]
    NoActiveDevice,

    /// Référence de playlist dont on ne peut extraire aucun identifiant
    #[error("Invalid playlist reference: {0:?}")]
    InvalidReference(String),

    /// Ressource non trouvée (playlist, etc.)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Quota dépassé (rate limiting)
    #[error("Rate limit exceeded, please try again later")]
    RateLimitExceeded,

    /// Toute autre réponse non-succès de l'API
    #[error("Spotify API error (code {code}): {message}")]
    ApiError { code: u16, message: String },

    /// Erreur HTTP (réseau, TLS, timeout...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Erreur de parsing JSON
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// URL invalide
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Erreur de configuration (anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

impl SpotifyError {
    /// Crée une erreur API depuis un code de statut HTTP et un message
    pub fn from_status_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            401 => Self::Unauthorized(message.into()),
            404 => Self::NotFound(message.into()),
            429 => Self::RateLimitExceeded,
            _ => Self::ApiError {
                code,
                message: message.into(),
            },
        }
    }

    /// Vérifie si l'erreur impose d'effacer le token
    pub fn is_auth_error(&self) -> bool {
        matches!(self, SpotifyError::Unauthorized(_))
    }

    /// Vérifie si l'erreur vient du transport (pas de réponse HTTP exploitable)
    pub fn is_transport(&self) -> bool {
        matches!(self, SpotifyError::Http(_))
    }

    /// Code de statut HTTP porté par l'erreur, si elle en a un
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SpotifyError::Unauthorized(_) => Some(401),
            SpotifyError::NotFound(_) => Some(404),
            SpotifyError::RateLimitExceeded => Some(429),
            SpotifyError::ApiError { code, .. } => Some(*code),
            SpotifyError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_code() {
        assert!(SpotifyError::from_status_code(401, "expired").is_auth_error());
        assert!(matches!(
            SpotifyError::from_status_code(404, "x"),
            SpotifyError::NotFound(_)
        ));
        assert!(matches!(
            SpotifyError::from_status_code(429, "x"),
            SpotifyError::RateLimitExceeded
        ));
        let err = SpotifyError::from_status_code(502, "bad gateway");
        assert_eq!(err.status_code(), Some(502));
        assert!(!err.is_auth_error());
    }

    #[test]
    fn test_forbidden_is_not_an_auth_error() {
        // 403 = compte non premium ou scope manquant : le token reste valide
        assert!(!SpotifyError::from_status_code(403, "premium required").is_auth_error());
    }
}
