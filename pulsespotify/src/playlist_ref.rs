//! Extraction de l'identifiant d'une playlist
//!
//! L'utilisateur peut saisir une playlist sous plusieurs formes :
//!
//! ```text
//! 5arPxjufbwwMkIu8YGbF5U
//! spotify:playlist:5arPxjufbwwMkIu8YGbF5U
//! https://open.spotify.com/playlist/5arPxjufbwwMkIu8YGbF5U?si=xyz
//! https://open.spotify.com/intl-fr/playlist/5arPxjufbwwMkIu8YGbF5U/
//! ```
//!
//! Toutes ces formes donnent le même identifiant.

use crate::error::{Result, SpotifyError};
use url::Url;

/// Extrait l'identifiant de playlist d'une référence utilisateur
///
/// # Errors
///
/// * `SpotifyError::InvalidReference` - aucun identifiant exploitable
pub fn parse_playlist_ref(reference: &str) -> Result<String> {
    let trimmed = reference.trim();
    let invalid = || SpotifyError::InvalidReference(reference.to_string());

    let candidate = if let Some(rest) = trimmed.strip_prefix("spotify:") {
        // spotify:playlist:<id> ou spotify:user:<user>:playlist:<id>
        let parts: Vec<&str> = rest.split(':').collect();
        parts
            .iter()
            .position(|p| *p == "playlist")
            .and_then(|i| parts.get(i + 1).copied())
            .or_else(|| parts.last().copied())
            .map(str::to_string)
    } else if let Ok(url) = Url::parse(trimmed) {
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        id_segment(&segments)
    } else {
        // Identifiant nu ou URL sans schéma (open.spotify.com/playlist/<id>)
        let without_query = trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let segments: Vec<&str> = without_query
            .split('/')
            .filter(|seg| !seg.is_empty())
            .collect();
        id_segment(&segments)
    };

    match candidate {
        Some(id) if is_valid_id(&id) => Ok(id),
        _ => Err(invalid()),
    }
}

/// Segment qui suit `playlist`, ou l'unique segment du chemin
///
/// Un chemin de plusieurs segments sans `playlist` est rejeté plutôt que de
/// deviner un identifiant.
fn id_segment(segments: &[&str]) -> Option<String> {
    match segments
        .iter()
        .position(|s| *s == "playlist" || *s == "playlists")
    {
        Some(i) => segments.get(i + 1).map(|s| s.to_string()),
        None if segments.len() == 1 => Some(segments[0].to_string()),
        None => None,
    }
}

/// Les identifiants Spotify sont en base 62
fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "5arPxjufbwwMkIu8YGbF5U";

    #[test]
    fn test_bare_id() {
        assert_eq!(parse_playlist_ref(ID).unwrap(), ID);
        assert_eq!(parse_playlist_ref(&format!("  {}  ", ID)).unwrap(), ID);
    }

    #[test]
    fn test_query_parameters_are_stripped() {
        assert_eq!(parse_playlist_ref(&format!("{}?si=xyz", ID)).unwrap(), ID);
        assert_eq!(
            parse_playlist_ref(&format!("https://open.spotify.com/playlist/{}?si=xyz", ID)).unwrap(),
            ID
        );
    }

    #[test]
    fn test_extra_path_segments_are_stripped() {
        assert_eq!(
            parse_playlist_ref(&format!("https://open.spotify.com/intl-fr/playlist/{}/", ID)).unwrap(),
            ID
        );
        assert_eq!(
            parse_playlist_ref(&format!("https://open.spotify.com/playlist/{}/tracks#top", ID))
                .unwrap(),
            ID
        );
        assert_eq!(
            parse_playlist_ref(&format!("open.spotify.com/playlist/{}/tracks", ID)).unwrap(),
            ID
        );
        assert_eq!(
            parse_playlist_ref(&format!("open.spotify.com/intl-fr/playlist/{}?si=xyz", ID)).unwrap(),
            ID
        );
        assert_eq!(parse_playlist_ref(&format!("{}/", ID)).unwrap(), ID);
    }

    #[test]
    fn test_spotify_uri() {
        assert_eq!(parse_playlist_ref(&format!("spotify:playlist:{}", ID)).unwrap(), ID);
        assert_eq!(
            parse_playlist_ref(&format!("spotify:user:bob:playlist:{}", ID)).unwrap(),
            ID
        );
    }

    #[test]
    fn test_invalid_references() {
        for reference in [
            "",
            "   ",
            "?si=xyz",
            "https://open.spotify.com/",
            "not an id!",
            "open.spotify.com/playlist/",
            "open.spotify.com/album/tracks",
        ] {
            assert!(
                matches!(
                    parse_playlist_ref(reference),
                    Err(SpotifyError::InvalidReference(_))
                ),
                "{reference:?} should be rejected"
            );
        }
    }
}
