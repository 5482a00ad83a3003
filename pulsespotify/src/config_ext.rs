//! Extension pour intégrer la configuration Spotify dans pulseconfig
//!
//! Ce module fournit le trait `SpotifyConfigExt` qui ajoute à
//! `pulseconfig::Config` les paramètres du client Spotify et le token de
//! session, ainsi que `ConfigTokenStore` qui expose ce token via
//! [`TokenStore`].

use crate::api::DEFAULT_API_BASE;
use crate::auth::{AccessToken, TokenStore};
use anyhow::Result;
use pulseconfig::Config;
use serde_yaml::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Intervalle de poll par défaut (ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
/// Bornes de l'intervalle de poll (ms)
pub const MIN_POLL_INTERVAL_MS: u64 = 1000;
pub const MAX_POLL_INTERVAL_MS: u64 = 5000;
/// Délai avant le rafraîchissement qui suit un « skip » (ms)
pub const DEFAULT_SKIP_REFRESH_DELAY_MS: u64 = 500;

const ACCESS_TOKEN_PATH: &[&str] = &["accounts", "spotify", "access_token"];

/// Trait d'extension pour gérer la configuration Spotify dans pulseconfig
///
/// # Exemple
///
/// ```rust,ignore
/// use pulseconfig::get_config;
/// use pulsespotify::SpotifyConfigExt;
///
/// let config = get_config();
/// println!("Poll toutes les {:?}", config.get_spotify_poll_interval()?);
/// ```
pub trait SpotifyConfigExt {
    /// URL de base de l'API Web Spotify
    fn get_spotify_api_base(&self) -> Result<String>;

    /// Intervalle entre deux polls de l'état de lecture
    ///
    /// La valeur configurée est ramenée dans `[1s, 5s]`.
    fn get_spotify_poll_interval(&self) -> Result<Duration>;

    /// Définit l'intervalle de poll, en millisecondes
    fn set_spotify_poll_interval_ms(&self, interval_ms: u64) -> Result<()>;

    /// Délai entre une commande « piste suivante » et le poll qui la suit
    fn get_spotify_skip_refresh_delay(&self) -> Result<Duration>;

    /// Récupère le token d'accès de la session, s'il existe
    fn get_spotify_access_token(&self) -> Result<Option<AccessToken>>;

    /// Enregistre le token d'accès produit par le flux de login
    fn set_spotify_access_token(&self, token: &str) -> Result<()>;

    /// Efface le token d'accès (déconnexion)
    fn clear_spotify_auth_info(&self) -> Result<()>;
}

impl SpotifyConfigExt for Config {
    fn get_spotify_api_base(&self) -> Result<String> {
        Ok(self
            .get_string(&["spotify", "api_base"])
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string()))
    }

    fn get_spotify_poll_interval(&self) -> Result<Duration> {
        let ms = read_u64(self, &["spotify", "poll_interval_ms"]).unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        let clamped = ms.clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS);
        if clamped != ms {
            warn!(
                "spotify.poll_interval_ms={} out of range, using {}ms",
                ms, clamped
            );
        }
        Ok(Duration::from_millis(clamped))
    }

    fn set_spotify_poll_interval_ms(&self, interval_ms: u64) -> Result<()> {
        self.set_number(&["spotify", "poll_interval_ms"], interval_ms)
    }

    fn get_spotify_skip_refresh_delay(&self) -> Result<Duration> {
        let ms = read_u64(self, &["spotify", "skip_refresh_delay_ms"])
            .unwrap_or(DEFAULT_SKIP_REFRESH_DELAY_MS);
        Ok(Duration::from_millis(ms))
    }

    fn get_spotify_access_token(&self) -> Result<Option<AccessToken>> {
        Ok(self.get_string(ACCESS_TOKEN_PATH).and_then(AccessToken::new))
    }

    fn set_spotify_access_token(&self, token: &str) -> Result<()> {
        self.set_value(ACCESS_TOKEN_PATH, Value::String(token.trim().to_string()))
    }

    fn clear_spotify_auth_info(&self) -> Result<()> {
        self.set_value(ACCESS_TOKEN_PATH, Value::String(String::new()))
    }
}

fn read_u64(config: &Config, path: &[&str]) -> Option<u64> {
    match config.get_value(path) {
        Ok(Value::Number(n)) => n.as_u64(),
        Ok(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `TokenStore` adossé à la configuration persistante
///
/// Un token effacé après un 401 est aussi effacé du fichier de configuration,
/// de sorte qu'un redémarrage ne réutilise pas un token refusé.
#[derive(Debug, Clone)]
pub struct ConfigTokenStore {
    config: Arc<Config>,
}

impl ConfigTokenStore {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl TokenStore for ConfigTokenStore {
    fn token(&self) -> Option<AccessToken> {
        self.config.get_spotify_access_token().ok().flatten()
    }

    fn clear(&self) {
        if let Err(e) = self.config.clear_spotify_auth_info() {
            warn!("Failed to clear Spotify token from config: {}", e);
        }
    }
}
