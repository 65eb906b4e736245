//! Plex Media Server integration.
//!
//! The catalog index and the library only talk to the server through the
//! [`PlexServer`] trait, so tests can swap in `testing::MockPlexServer`.

mod http;
mod session;
mod types;

pub use http::PlexHttpClient;
pub use session::connect;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::codec::UrlResolver;

/// Errors that can occur when talking to a Plex server or plex.tv.
#[derive(Debug, Error)]
pub enum PlexError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Signing in to plex.tv failed for good.
    #[error("Login failed: {0}")]
    Login(String),

    /// The account has no server with the configured name.
    #[error("Server not found on account: {0}")]
    ServerNotFound(String),
}

/// Remote catalog operations the index and library rely on.
#[async_trait]
pub trait PlexServer: Send + Sync {
    /// List every library section of the server.
    async fn list_sections(&self) -> Result<Vec<Section>, PlexError>;

    /// List the artists of one section (a single listing call).
    async fn list_artists(&self, section: &Section) -> Result<Vec<RemoteArtist>, PlexError>;

    /// List the albums of one artist.
    async fn list_albums(&self, artist: &RemoteArtist) -> Result<Vec<RemoteAlbum>, PlexError>;

    /// List the tracks of one album, in server order.
    async fn list_tracks(&self, album: &RemoteAlbum) -> Result<Vec<RemoteTrack>, PlexError>;

    /// Fetch a single metadata item by rating key.
    async fn fetch_item(&self, id: &str) -> Result<RemoteItem, PlexError>;

    /// Fetch the direct children of a metadata item.
    async fn fetch_children(&self, id: &str) -> Result<Vec<RemoteItem>, PlexError>;

    /// Run a raw path query such as `/library/metadata/42/allLeaves`.
    async fn query(&self, path: &str) -> Result<Vec<RemoteItem>, PlexError>;

    /// Server-side free-text search.
    async fn search(&self, text: &str) -> Result<Vec<RemoteItem>, PlexError>;

    /// Resolver producing absolute URLs for binary resources (artwork).
    fn resolver(&self) -> UrlResolver;
}
