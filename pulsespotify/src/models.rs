//! Structures de données pour représenter les objets Spotify
//!
//! Les types publics sont des objets-valeurs normalisés : ils sont construits
//! une fois à partir des réponses de l'API puis jamais modifiés. Les types
//! `*Object` (privés à la crate) reflètent le JSON brut de l'API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Représente une piste Spotify jouable
///
/// L'identité d'une piste est son `uri` (`spotify:track:...`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    /// URI Spotify de la piste
    pub uri: String,
    /// Titre de la piste
    pub name: String,
    /// Artiste(s) de la piste
    pub artist: String,
    /// URL de la pochette (première image de l'album)
    #[serde(default)]
    pub album_art: Option<String>,
}

impl Track {
    /// Vérifie si deux pistes désignent la même ressource Spotify
    pub fn same_as(&self, uri: &str) -> bool {
        self.uri == uri
    }
}

/// Ce qui est en cours de lecture d'après le dernier poll
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum NowPlaying {
    /// Rien n'est en cours de lecture (réponse 204)
    #[default]
    Nothing,
    /// Une piste est chargée sur l'appareil actif
    Track(Track),
}

impl NowPlaying {
    pub fn track(&self) -> Option<&Track> {
        match self {
            NowPlaying::Nothing => None,
            NowPlaying::Track(track) => Some(track),
        }
    }

    pub fn uri(&self) -> Option<&str> {
        self.track().map(|t| t.uri.as_str())
    }
}

/// Photographie complète de l'état de lecture distant
///
/// Chaque poll produit un nouveau snapshot qui remplace intégralement le
/// précédent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaybackSnapshot {
    pub current: NowPlaying,
    pub is_playing: bool,
    /// Instant de réception de la réponse
    pub fetched_at: DateTime<Utc>,
}

impl PlaybackSnapshot {
    /// Snapshot sentinelle « rien en lecture »
    pub fn nothing_playing() -> Self {
        Self {
            current: NowPlaying::Nothing,
            is_playing: false,
            fetched_at: Utc::now(),
        }
    }

    pub fn playing(track: Track, is_playing: bool) -> Self {
        Self {
            current: NowPlaying::Track(track),
            is_playing,
            fetched_at: Utc::now(),
        }
    }

    pub fn current_uri(&self) -> Option<&str> {
        self.current.uri()
    }
}

/// Appareil de lecture Spotify (Connect)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Device {
    pub id: Option<String>,
    pub name: String,
    pub is_active: bool,
}

// ============ Objets bruts de l'API ============

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistObject {
    pub(crate) name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageObject {
    pub(crate) url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlbumObject {
    #[serde(default)]
    pub(crate) images: Vec<ImageObject>,
}

/// Piste (ou épisode) telle que renvoyée par l'API
#[derive(Debug, Deserialize)]
pub(crate) struct TrackObject {
    #[serde(default)]
    pub(crate) uri: Option<String>,
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) artists: Vec<ArtistObject>,
    #[serde(default)]
    pub(crate) album: Option<AlbumObject>,
    #[serde(default)]
    pub(crate) is_local: bool,
    #[serde(rename = "type", default)]
    pub(crate) kind: Option<String>,
}

impl TrackObject {
    fn album_art(&self) -> Option<String> {
        self.album
            .as_ref()
            .and_then(|a| a.images.first())
            .map(|i| i.url.clone())
    }

    /// Une piste est jouable si elle n'est pas locale, est bien une piste
    /// (pas un épisode) et porte un URI
    pub(crate) fn is_playable_track(&self) -> bool {
        !self.is_local
            && self.kind.as_deref().is_none_or(|k| k == "track")
            && self.uri.as_deref().is_some_and(|u| !u.is_empty())
    }

    /// Conversion pour une liste de candidates : premier artiste seulement
    pub(crate) fn into_candidate(self) -> Option<Track> {
        if !self.is_playable_track() {
            return None;
        }
        let album_art = self.album_art();
        let artist = self
            .artists
            .first()
            .map(|a| a.name.clone())
            .unwrap_or_default();
        Some(Track {
            uri: self.uri?,
            name: self.name,
            artist,
            album_art,
        })
    }

    /// Conversion pour l'affichage « en cours » : tous les artistes
    pub(crate) fn into_now_playing(self) -> Option<Track> {
        let album_art = self.album_art();
        let artist = self
            .artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Some(Track {
            uri: self.uri.filter(|u| !u.is_empty())?,
            name: self.name,
            artist,
            album_art,
        })
    }
}

/// Réponse de `/me/player/currently-playing`
#[derive(Debug, Deserialize)]
pub(crate) struct CurrentlyPlayingResponse {
    #[serde(default)]
    pub(crate) is_playing: bool,
    #[serde(default)]
    pub(crate) item: Option<TrackObject>,
}

impl CurrentlyPlayingResponse {
    pub(crate) fn into_snapshot(self) -> PlaybackSnapshot {
        match self.item.and_then(TrackObject::into_now_playing) {
            Some(track) => PlaybackSnapshot::playing(track, self.is_playing),
            None => PlaybackSnapshot {
                is_playing: self.is_playing,
                ..PlaybackSnapshot::nothing_playing()
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeviceObject {
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default = "default_true")]
    pub(crate) is_active: bool,
}

/// Réponse de `/me/player`
#[derive(Debug, Deserialize)]
pub(crate) struct PlayerStateResponse {
    #[serde(default)]
    pub(crate) device: Option<DeviceObject>,
}

impl From<DeviceObject> for Device {
    fn from(d: DeviceObject) -> Self {
        Device {
            id: d.id,
            name: d.name,
            is_active: d.is_active,
        }
    }
}

/// Élément de playlist : `track` peut être null (piste supprimée)
#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistItemObject {
    #[serde(default)]
    pub(crate) track: Option<TrackObject>,
    #[serde(default)]
    pub(crate) is_local: bool,
}

/// Page paginée de `/playlists/{id}/tracks`
#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistTracksPage {
    #[serde(default)]
    pub(crate) items: Vec<Option<PlaylistItemObject>>,
    #[serde(default)]
    pub(crate) next: Option<String>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_now_playing_joins_artists() {
        let response: CurrentlyPlayingResponse = serde_json::from_value(json!({
            "is_playing": true,
            "item": {
                "uri": "spotify:track:1",
                "name": "Song",
                "type": "track",
                "artists": [{"name": "A"}, {"name": "B"}],
                "album": {"images": [{"url": "https://i/1"}, {"url": "https://i/2"}]}
            }
        }))
        .unwrap();

        let snapshot = response.into_snapshot();
        assert!(snapshot.is_playing);
        let track = snapshot.current.track().unwrap();
        assert_eq!(track.artist, "A, B");
        assert_eq!(track.album_art.as_deref(), Some("https://i/1"));
    }

    #[test]
    fn test_null_item_is_nothing_playing() {
        let response: CurrentlyPlayingResponse =
            serde_json::from_value(json!({"is_playing": true, "item": null})).unwrap();
        let snapshot = response.into_snapshot();
        assert_eq!(snapshot.current, NowPlaying::Nothing);
        assert!(snapshot.is_playing);
    }

    #[test]
    fn test_candidate_filters() {
        let local: TrackObject = serde_json::from_value(json!({
            "uri": "spotify:local:x", "name": "L", "is_local": true, "artists": []
        }))
        .unwrap();
        assert!(local.into_candidate().is_none());

        let episode: TrackObject = serde_json::from_value(json!({
            "uri": "spotify:episode:e", "name": "E", "type": "episode"
        }))
        .unwrap();
        assert!(episode.into_candidate().is_none());

        let track: TrackObject = serde_json::from_value(json!({
            "uri": "spotify:track:t", "name": "T", "type": "track",
            "artists": [{"name": "First"}, {"name": "Second"}]
        }))
        .unwrap();
        let track = track.into_candidate().unwrap();
        assert_eq!(track.artist, "First");
        assert!(track.album_art.is_none());
    }
}
