//! Token d'accès Spotify et stockage partagé
//!
//! Le flux OAuth est externe : il est le seul à écrire un token frais. Le reste
//! de PulseDJ lit le token et l'efface lorsqu'une réponse 401 est reçue.

use std::fmt;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Token d'accès opaque, transmis en `Authorization: Bearer`
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Construit un token ; `None` si la chaîne est vide
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Le token ne doit jamais apparaître dans les logs
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Accès partagé au token de session
///
/// `token()` est appelé avant chaque requête ; `clear()` est appelé par le
/// composant qui détecte un échec d'authentification.
pub trait TokenStore: Send + Sync {
    /// Token courant, `None` si la session n'est pas connectée
    fn token(&self) -> Option<AccessToken>;

    /// Efface le token courant
    fn clear(&self);

    /// Efface le token seulement s'il est encore `expected`
    ///
    /// Un 401 reçu pour une requête partie avec un ancien token ne doit pas
    /// effacer un token écrit depuis par le flux de login. Renvoie `true` si
    /// le token a été effacé.
    fn clear_if(&self, expected: &AccessToken) -> bool {
        if self.token().as_ref() == Some(expected) {
            self.clear();
            true
        } else {
            false
        }
    }

    /// Vérifie si un token est disponible
    fn is_connected(&self) -> bool {
        self.token().is_some()
    }
}

/// Stockage en mémoire, utilisé par les tests et les sessions sans persistance
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<AccessToken>>,
}

impl MemoryTokenStore {
    pub fn new(token: Option<AccessToken>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }

    /// Écrit un nouveau token (réservé au flux de login)
    pub fn set(&self, token: AccessToken) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<AccessToken> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear(&self) {
        debug!("Clearing in-memory Spotify token");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn clear_if(&self, expected: &AccessToken) -> bool {
        let mut token = self.token.write().unwrap_or_else(PoisonError::into_inner);
        if token.as_ref() == Some(expected) {
            debug!("Clearing rejected in-memory Spotify token");
            *token = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_is_rejected() {
        assert!(AccessToken::new("").is_none());
        assert!(AccessToken::new("   ").is_none());
        assert_eq!(AccessToken::new(" abc ").unwrap().as_str(), "abc");
    }

    #[test]
    fn test_debug_hides_token() {
        let token = AccessToken::new("secret").unwrap();
        assert!(!format!("{:?}", token).contains("secret"));
    }

    #[test]
    fn test_memory_store_clear() {
        let store = MemoryTokenStore::new(AccessToken::new("abc"));
        assert!(store.is_connected());

        store.clear();
        assert!(!store.is_connected());

        store.set(AccessToken::new("def").unwrap());
        assert_eq!(store.token().unwrap().as_str(), "def");
    }

    #[test]
    fn test_clear_if_keeps_newer_token() {
        let store = MemoryTokenStore::new(AccessToken::new("old"));
        let old = store.token().unwrap();
        store.set(AccessToken::new("fresh").unwrap());

        assert!(!store.clear_if(&old));
        assert_eq!(store.token().unwrap().as_str(), "fresh");

        let fresh = store.token().unwrap();
        assert!(store.clear_if(&fresh));
        assert!(!store.is_connected());
    }
}
