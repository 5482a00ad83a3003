//! Endpoints `/playlists` : liste des pistes d'une playlist

use super::SpotifyApi;
use crate::auth::AccessToken;
use crate::error::Result;
use crate::models::{PlaylistTracksPage, Track, TrackObject};
use tracing::{debug, warn};
use url::Url;

/// Taille de page maximale acceptée par Spotify
const PAGE_LIMIT: &str = "100";

/// Garde-fou contre une pagination qui ne se terminerait pas
const MAX_PAGES: usize = 100;

impl SpotifyApi {
    /// Récupère toutes les pistes jouables d'une playlist
    ///
    /// Suit le lien `next` de page en page. Les éléments nuls, les fichiers
    /// locaux et les épisodes sont écartés. Une playlist sans piste jouable
    /// donne un vecteur vide.
    pub async fn get_playlist_tracks(
        &self,
        playlist_id: &str,
        token: &AccessToken,
    ) -> Result<Vec<Track>> {
        debug!("Fetching tracks for playlist {}", playlist_id);

        let mut url = self.endpoint_url(&format!("/playlists/{}/tracks", playlist_id))?;
        url.query_pairs_mut().append_pair("limit", PAGE_LIMIT);

        let mut tracks = Vec::new();
        let mut next: Option<Url> = Some(url);
        let mut pages = 0;

        while let Some(page_url) = next.take() {
            if pages == MAX_PAGES {
                warn!(
                    "Playlist {} has more than {} pages, keeping the first {} tracks",
                    playlist_id,
                    MAX_PAGES,
                    tracks.len()
                );
                break;
            }
            pages += 1;

            let page: PlaylistTracksPage = self.get(page_url, token).await?;
            tracks.extend(Self::playable_tracks(page.items));
            next = page.next.as_deref().map(Url::parse).transpose()?;
        }

        debug!(
            "Playlist {}: {} playable tracks over {} page(s)",
            playlist_id,
            tracks.len(),
            pages
        );
        Ok(tracks)
    }

    fn playable_tracks(
        items: Vec<Option<crate::models::PlaylistItemObject>>,
    ) -> impl Iterator<Item = Track> {
        items
            .into_iter()
            .flatten()
            .filter(|item| !item.is_local)
            .filter_map(|item| item.track)
            .filter_map(TrackObject::into_candidate)
    }
}
