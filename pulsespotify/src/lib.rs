//! # pulsespotify - Client Spotify Web API pour PulseDJ
//!
//! Cette crate fournit le client HTTP utilisé par PulseDJ pour piloter la
//! lecture sur le compte Spotify de l'utilisateur.
//!
//! ## Vue d'ensemble
//!
//! `pulsespotify` couvre uniquement les endpoints dont l'orchestrateur a besoin :
//! - lecture de l'état courant (`/me/player/currently-playing`, `/me/player`)
//! - commandes de lecture (play, pause, piste suivante)
//! - ajout d'une piste à la file d'attente (`/me/player/queue`)
//! - liste des pistes d'une playlist (`/playlists/{id}/tracks`)
//!
//! L'obtention du token OAuth n'est pas gérée ici : le token est fourni par un
//! [`TokenStore`] alimenté par le flux de login externe. Le client se contente
//! de le transmettre en `Bearer` et de signaler les 401 via
//! [`SpotifyError::Unauthorized`].
//!
//! ## Structure des modules
//!
//! ```text
//! pulsespotify/
//! ├── src/
//! │   ├── lib.rs              # Module principal (ce fichier)
//! │   ├── client.rs           # Client haut-niveau (builder)
//! │   ├── models.rs           # Track, PlaybackSnapshot, Device
//! │   ├── playlist_ref.rs     # Extraction de l'identifiant de playlist
//! │   ├── auth.rs             # AccessToken et TokenStore
//! │   ├── config_ext.rs       # Extension de pulseconfig::Config
//! │   ├── api/
//! │   │   ├── mod.rs          # Requêtes HTTP bas-niveau
//! │   │   ├── player.rs       # Endpoints /me/player
//! │   │   └── playlist.rs     # Endpoints /playlists
//! │   └── error.rs            # Gestion des erreurs
//! ```
//!
//! ## Utilisation
//!
//! ```rust,no_run
//! use pulsespotify::{AccessToken, SpotifyClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = SpotifyClient::new()?;
//!     let token = AccessToken::new("BQD...").expect("non-empty token");
//!
//!     let tracks = client
//!         .fetch_candidates("https://open.spotify.com/playlist/5arPxjufbwwMkIu8YGbF5U?si=xyz", &token)
//!         .await?;
//!     println!("{} pistes candidates", tracks.len());
//!
//!     let snapshot = client.current_playback(&token).await?;
//!     println!("En cours : {:?}", snapshot.current);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod config_ext;
pub mod error;
pub mod models;
pub mod playlist_ref;

pub use auth::{AccessToken, MemoryTokenStore, TokenStore};
pub use client::{ClientBuilder, SpotifyClient};
pub use config_ext::{ConfigTokenStore, SpotifyConfigExt};
pub use error::{Result, SpotifyError};
pub use models::{Device, NowPlaying, PlaybackSnapshot, Track};
pub use playlist_ref::parse_playlist_ref;
