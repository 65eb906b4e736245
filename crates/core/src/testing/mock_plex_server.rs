//! Mock Plex server for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::codec::{strip_prefix, UrlResolver};
use crate::plex::{
    PlexError, PlexServer, RemoteAlbum, RemoteArtist, RemoteItem, RemoteTrack, Section,
};

/// A recorded server call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedPlexCall {
    ListSections,
    ListArtists { section: String },
    ListAlbums { artist: String },
    ListTracks { album: String },
    FetchItem { id: String },
    FetchChildren { id: String },
    Query { path: String },
    Search { text: String },
}

/// A call that keeps failing until cleared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MockFailure {
    Sections,
    /// Artist listing of the section with this key.
    Artists(String),
    /// Album listing of the artist with this rating key.
    Albums(String),
    /// Track listing of the album with this rating key.
    Tracks(String),
    /// `fetch_item`, `fetch_children` and `query` for this id.
    Fetch(String),
    Search,
}

/// Mock implementation of the PlexServer trait.
///
/// Provides controllable behavior for testing:
/// - Serve a configurable section/artist/album/track hierarchy
/// - Track calls for assertions
/// - Simulate failures, one-shot or sticky
/// - Delay album listings to shuffle completion order
#[derive(Debug)]
pub struct MockPlexServer {
    sections: Arc<RwLock<Vec<Section>>>,
    /// Artists by section key.
    artists: Arc<RwLock<HashMap<String, Vec<RemoteArtist>>>>,
    /// Albums by artist rating key.
    albums: Arc<RwLock<HashMap<String, Vec<RemoteAlbum>>>>,
    /// Tracks by album rating key.
    tracks: Arc<RwLock<HashMap<String, Vec<RemoteTrack>>>>,
    /// Album listing delays by artist rating key.
    album_delays: Arc<RwLock<HashMap<String, Duration>>>,
    failures: Arc<RwLock<HashSet<MockFailure>>>,
    calls: Arc<RwLock<Vec<RecordedPlexCall>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<PlexError>>>,
    resolver: UrlResolver,
}

impl Default for MockPlexServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlexServer {
    pub const BASE_URL: &'static str = "http://mock-plex:32400";
    pub const TOKEN: &'static str = "mock-token";

    pub fn new() -> Self {
        Self {
            sections: Arc::new(RwLock::new(Vec::new())),
            artists: Arc::new(RwLock::new(HashMap::new())),
            albums: Arc::new(RwLock::new(HashMap::new())),
            tracks: Arc::new(RwLock::new(HashMap::new())),
            album_delays: Arc::new(RwLock::new(HashMap::new())),
            failures: Arc::new(RwLock::new(HashSet::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            resolver: UrlResolver::new(Self::BASE_URL, Some(Self::TOKEN.to_string())),
        }
    }

    // =========================================================================
    // Catalog Configuration
    // =========================================================================

    pub async fn add_section(&self, section: Section) {
        self.sections.write().await.push(section);
    }

    /// Add an artist to a section, without albums.
    pub async fn add_artist(&self, section_key: &str, artist: RemoteArtist) {
        self.artists
            .write()
            .await
            .entry(section_key.to_string())
            .or_default()
            .push(artist);
    }

    /// Add an album with its tracks under an artist.
    pub async fn add_album(&self, artist_key: &str, album: RemoteAlbum, tracks: Vec<RemoteTrack>) {
        self.tracks
            .write()
            .await
            .insert(album.rating_key.clone(), tracks);
        self.albums
            .write()
            .await
            .entry(artist_key.to_string())
            .or_default()
            .push(album);
    }

    /// Add an artist to a section together with its albums and tracks.
    pub async fn add_discography(
        &self,
        section_key: &str,
        artist: RemoteArtist,
        albums: Vec<(RemoteAlbum, Vec<RemoteTrack>)>,
    ) {
        let artist_key = artist.rating_key.clone();
        self.add_artist(section_key, artist).await;
        for (album, tracks) in albums {
            self.add_album(&artist_key, album, tracks).await;
        }
    }

    /// Make album listings of this artist take `delay`.
    pub async fn set_album_delay(&self, artist_key: &str, delay: Duration) {
        self.album_delays
            .write()
            .await
            .insert(artist_key.to_string(), delay);
    }

    // =========================================================================
    // Call Recording
    // =========================================================================

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedPlexCall> {
        self.calls.read().await.clone()
    }

    /// Clear recorded calls.
    pub async fn clear_recorded(&self) {
        self.calls.write().await.clear();
    }

    /// Number of recorded calls matching `predicate`.
    pub async fn count_calls(&self, predicate: impl Fn(&RecordedPlexCall) -> bool) -> usize {
        self.calls.read().await.iter().filter(|c| predicate(c)).count()
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: PlexError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make a call fail every time until [`Self::clear_failures`].
    pub async fn fail(&self, failure: MockFailure) {
        self.failures.write().await.insert(failure);
    }

    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
        *self.next_error.write().await = None;
    }

    async fn begin(
        &self,
        call: RecordedPlexCall,
        failure: Option<MockFailure>,
    ) -> Result<(), PlexError> {
        self.calls.write().await.push(call);

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if let Some(failure) = failure {
            if self.failures.read().await.contains(&failure) {
                return Err(PlexError::Api {
                    status: 500,
                    message: format!("injected failure: {:?}", failure),
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    async fn find_artist(&self, key: &str) -> Option<RemoteArtist> {
        self.artists
            .read()
            .await
            .values()
            .flatten()
            .find(|a| a.rating_key == key)
            .cloned()
    }

    async fn find_album(&self, key: &str) -> Option<RemoteAlbum> {
        self.albums
            .read()
            .await
            .values()
            .flatten()
            .find(|a| a.rating_key == key)
            .cloned()
    }

    async fn find_track(&self, key: &str) -> Option<RemoteTrack> {
        self.tracks
            .read()
            .await
            .values()
            .flatten()
            .find(|t| t.rating_key == key)
            .cloned()
    }

    async fn albums_of(&self, artist_key: &str) -> Vec<RemoteAlbum> {
        self.albums
            .read()
            .await
            .get(artist_key)
            .cloned()
            .unwrap_or_default()
    }

    async fn tracks_of(&self, album_key: &str) -> Vec<RemoteTrack> {
        self.tracks
            .read()
            .await
            .get(album_key)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl PlexServer for MockPlexServer {
    async fn list_sections(&self) -> Result<Vec<Section>, PlexError> {
        self.begin(RecordedPlexCall::ListSections, Some(MockFailure::Sections))
            .await?;
        Ok(self.sections.read().await.clone())
    }

    async fn list_artists(&self, section: &Section) -> Result<Vec<RemoteArtist>, PlexError> {
        self.begin(
            RecordedPlexCall::ListArtists {
                section: section.key.clone(),
            },
            Some(MockFailure::Artists(section.key.clone())),
        )
        .await?;
        Ok(self
            .artists
            .read()
            .await
            .get(&section.key)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_albums(&self, artist: &RemoteArtist) -> Result<Vec<RemoteAlbum>, PlexError> {
        self.begin(
            RecordedPlexCall::ListAlbums {
                artist: artist.rating_key.clone(),
            },
            Some(MockFailure::Albums(artist.rating_key.clone())),
        )
        .await?;

        let delay = self.album_delays.read().await.get(&artist.rating_key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.albums_of(&artist.rating_key).await)
    }

    async fn list_tracks(&self, album: &RemoteAlbum) -> Result<Vec<RemoteTrack>, PlexError> {
        self.begin(
            RecordedPlexCall::ListTracks {
                album: album.rating_key.clone(),
            },
            Some(MockFailure::Tracks(album.rating_key.clone())),
        )
        .await?;
        Ok(self.tracks_of(&album.rating_key).await)
    }

    async fn fetch_item(&self, id: &str) -> Result<RemoteItem, PlexError> {
        let id = strip_prefix(id);
        self.begin(
            RecordedPlexCall::FetchItem { id: id.to_string() },
            Some(MockFailure::Fetch(id.to_string())),
        )
        .await?;

        if let Some(artist) = self.find_artist(id).await {
            return Ok(RemoteItem::Artist(artist));
        }
        if let Some(album) = self.find_album(id).await {
            return Ok(RemoteItem::Album(album));
        }
        if let Some(track) = self.find_track(id).await {
            return Ok(RemoteItem::Track(track));
        }
        Err(PlexError::NotFound(id.to_string()))
    }

    async fn fetch_children(&self, id: &str) -> Result<Vec<RemoteItem>, PlexError> {
        let id = strip_prefix(id);
        self.begin(
            RecordedPlexCall::FetchChildren { id: id.to_string() },
            Some(MockFailure::Fetch(id.to_string())),
        )
        .await?;

        if self.find_artist(id).await.is_some() {
            let albums = self.albums_of(id).await;
            return Ok(albums.into_iter().map(RemoteItem::Album).collect());
        }
        if self.find_album(id).await.is_some() {
            let tracks = self.tracks_of(id).await;
            return Ok(tracks.into_iter().map(RemoteItem::Track).collect());
        }
        if self.find_track(id).await.is_some() {
            return Ok(Vec::new());
        }
        Err(PlexError::NotFound(id.to_string()))
    }

    /// Understands `/library/metadata/{artist}/allLeaves`.
    async fn query(&self, path: &str) -> Result<Vec<RemoteItem>, PlexError> {
        let id = path
            .strip_suffix("/allLeaves")
            .map(strip_prefix)
            .unwrap_or(path)
            .to_string();
        self.begin(
            RecordedPlexCall::Query {
                path: path.to_string(),
            },
            Some(MockFailure::Fetch(id.clone())),
        )
        .await?;

        if !path.ends_with("/allLeaves") || self.find_artist(&id).await.is_none() {
            return Err(PlexError::NotFound(path.to_string()));
        }

        let mut items = Vec::new();
        for album in self.albums_of(&id).await {
            items.extend(
                self.tracks_of(&album.rating_key)
                    .await
                    .into_iter()
                    .map(RemoteItem::Track),
            );
        }
        Ok(items)
    }

    /// Case-insensitive title match: artists, then albums, then tracks.
    async fn search(&self, text: &str) -> Result<Vec<RemoteItem>, PlexError> {
        self.begin(
            RecordedPlexCall::Search {
                text: text.to_string(),
            },
            Some(MockFailure::Search),
        )
        .await?;

        let needle = text.to_lowercase();
        let hit = |title: &str| title.to_lowercase().contains(&needle);
        let mut items = Vec::new();

        for section in self.sections.read().await.iter() {
            if let Some(artists) = self.artists.read().await.get(&section.key) {
                items.extend(
                    artists
                        .iter()
                        .filter(|a| hit(&a.title))
                        .cloned()
                        .map(RemoteItem::Artist),
                );
            }
        }
        let mut albums: Vec<RemoteAlbum> = self
            .albums
            .read()
            .await
            .values()
            .flatten()
            .filter(|a| hit(&a.title))
            .cloned()
            .collect();
        albums.sort_by(|a, b| a.rating_key.cmp(&b.rating_key));
        items.extend(albums.into_iter().map(RemoteItem::Album));

        let mut tracks: Vec<RemoteTrack> = self
            .tracks
            .read()
            .await
            .values()
            .flatten()
            .filter(|t| hit(&t.title))
            .cloned()
            .collect();
        tracks.sort_by(|a, b| a.rating_key.cmp(&b.rating_key));
        items.extend(tracks.into_iter().map(RemoteItem::Track));

        Ok(items)
    }

    fn resolver(&self) -> UrlResolver {
        self.resolver.clone()
    }
}
