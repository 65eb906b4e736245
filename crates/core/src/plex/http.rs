//! Plex Media Server HTTP client.
//!
//! Plex answers with XML unless asked otherwise, so every request sends
//! `Accept: application/json` and reads the `MediaContainer` envelope.

use std::sync::Arc;
use std::time::{Duration, Instant as StdInstant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use super::types::{RemoteAlbum, RemoteArtist, RemoteItem, RemoteTrack, Section};
use super::{PlexError, PlexServer};
use crate::codec::{UrlResolver, METADATA_PREFIX};
use crate::config::PlexConfig;
use crate::metrics::{REMOTE_REQUESTS, REMOTE_REQUEST_DURATION};

/// Product name sent in `X-Plex-Product`.
pub(crate) const PRODUCT: &str = "plexdex";

/// Plex metadata type number for artists in `/library/sections/{key}/all`.
const ARTIST_TYPE: &str = "8";

/// Headers every Plex endpoint expects from a client.
pub(crate) fn client_headers(client_id: &str) -> Result<HeaderMap, PlexError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert("X-Plex-Product", HeaderValue::from_static(PRODUCT));
    headers.insert(
        "X-Plex-Version",
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    headers.insert(
        "X-Plex-Client-Identifier",
        HeaderValue::from_str(client_id)
            .map_err(|e| PlexError::Parse(format!("Invalid client identifier: {}", e)))?,
    );
    Ok(headers)
}

/// Plex server client.
pub struct PlexHttpClient {
    client: Client,
    base_url: String,
    token: String,
    last_request: Arc<Mutex<Option<Instant>>>,
    request_interval: Duration,
}

impl PlexHttpClient {
    /// Create a client for a server reachable at `base_url`.
    pub fn new(
        base_url: &str,
        token: &str,
        client_id: &str,
        config: &PlexConfig,
    ) -> Result<Self, PlexError> {
        let mut headers = client_headers(client_id)?;
        headers.insert(
            "X-Plex-Token",
            HeaderValue::from_str(token)
                .map_err(|e| PlexError::Parse(format!("Invalid token: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            token: token.to_string(),
            last_request: Arc::new(Mutex::new(None)),
            request_interval: Duration::from_millis(config.request_interval_ms),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Space requests out if an interval is configured.
    async fn wait_for_rate_limit(&self) {
        if self.request_interval.is_zero() {
            return;
        }

        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.request_interval {
                let wait_time = self.request_interval - elapsed;
                debug!("Plex request spacing: waiting {:?}", wait_time);
                sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }

    /// GET a path and unwrap the `MediaContainer` envelope.
    async fn get_container(
        &self,
        operation: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<MediaContainer, PlexError> {
        self.wait_for_rate_limit().await;

        let url = format!("{}{}", self.base_url, path);
        debug!("Plex {}: GET {}", operation, path);

        let started = StdInstant::now();
        let result = self.send(&url, path, query).await;

        REMOTE_REQUEST_DURATION
            .with_label_values(&[operation])
            .observe(started.elapsed().as_secs_f64());
        let status = if result.is_ok() { "success" } else { "error" };
        REMOTE_REQUESTS
            .with_label_values(&[operation, status])
            .inc();

        result
    }

    async fn send(
        &self,
        url: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<MediaContainer, PlexError> {
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if status == 404 {
            return Err(PlexError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Plex returned {} for {}", status, path);
            return Err(PlexError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let envelope: PlexResponse = response.json().await.map_err(|e| {
            PlexError::Parse(format!("Failed to parse response for {}: {}", path, e))
        })?;

        Ok(envelope.media_container)
    }

    async fn items(&self, operation: &str, path: &str) -> Result<Vec<RemoteItem>, PlexError> {
        let container = self.get_container(operation, path, &[]).await?;
        Ok(container.into_items())
    }
}

#[async_trait]
impl PlexServer for PlexHttpClient {
    async fn list_sections(&self) -> Result<Vec<Section>, PlexError> {
        let container = self
            .get_container("list_sections", "/library/sections", &[])
            .await?;

        Ok(container
            .directories
            .into_iter()
            .filter_map(PlexMetadata::into_section)
            .collect())
    }

    async fn list_artists(&self, section: &Section) -> Result<Vec<RemoteArtist>, PlexError> {
        let path = format!("/library/sections/{}/all", section.key);
        let container = self
            .get_container("list_artists", &path, &[("type", ARTIST_TYPE)])
            .await?;

        Ok(container
            .into_items()
            .into_iter()
            .filter_map(|item| match item {
                RemoteItem::Artist(artist) => Some(artist),
                _ => None,
            })
            .collect())
    }

    async fn list_albums(&self, artist: &RemoteArtist) -> Result<Vec<RemoteAlbum>, PlexError> {
        let path = format!("{}{}/children", METADATA_PREFIX, artist.rating_key);
        Ok(self
            .items("list_albums", &path)
            .await?
            .into_iter()
            .filter_map(|item| match item {
                RemoteItem::Album(album) => Some(album),
                _ => None,
            })
            .collect())
    }

    async fn list_tracks(&self, album: &RemoteAlbum) -> Result<Vec<RemoteTrack>, PlexError> {
        let path = format!("{}{}/children", METADATA_PREFIX, album.rating_key);
        Ok(self
            .items("list_tracks", &path)
            .await?
            .into_iter()
            .filter_map(|item| match item {
                RemoteItem::Track(track) => Some(track),
                _ => None,
            })
            .collect())
    }

    async fn fetch_item(&self, id: &str) -> Result<RemoteItem, PlexError> {
        let path = format!("{}{}", METADATA_PREFIX, id);
        self.items("fetch_item", &path)
            .await?
            .into_iter()
            .next()
            .ok_or(PlexError::NotFound(path))
    }

    async fn fetch_children(&self, id: &str) -> Result<Vec<RemoteItem>, PlexError> {
        let path = format!("{}{}/children", METADATA_PREFIX, id);
        self.items("fetch_children", &path).await
    }

    async fn query(&self, path: &str) -> Result<Vec<RemoteItem>, PlexError> {
        self.items("query", path).await
    }

    async fn search(&self, text: &str) -> Result<Vec<RemoteItem>, PlexError> {
        let container = self
            .get_container("search", "/search", &[("query", text)])
            .await?;
        Ok(container.into_items())
    }

    fn resolver(&self) -> UrlResolver {
        UrlResolver::new(&self.base_url, Some(self.token.clone()))
    }
}

// ============================================================================
// Plex API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct PlexResponse {
    #[serde(rename = "MediaContainer")]
    media_container: MediaContainer,
}

#[derive(Debug, Default, Deserialize)]
struct MediaContainer {
    #[serde(rename = "Directory", default)]
    directories: Vec<PlexMetadata>,
    #[serde(rename = "Metadata", default)]
    metadata: Vec<PlexMetadata>,
}

impl MediaContainer {
    /// Items from both lists; older servers return artists and albums as
    /// `Directory` entries in search results.
    fn into_items(self) -> Vec<RemoteItem> {
        self.directories
            .into_iter()
            .chain(self.metadata)
            .filter_map(PlexMetadata::into_item)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlexMetadata {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    rating_key: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    parent_key: Option<String>,
    #[serde(default)]
    parent_title: Option<String>,
    #[serde(default)]
    grandparent_key: Option<String>,
    #[serde(default)]
    grandparent_title: Option<String>,
    #[serde(default)]
    year: Option<u32>,
    #[serde(default)]
    thumb: Option<String>,
    #[serde(default)]
    art: Option<String>,
    #[serde(default)]
    leaf_count: Option<u32>,
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    duration: Option<u64>,
    #[serde(default)]
    summary: Option<String>,
}

impl PlexMetadata {
    fn into_section(self) -> Option<Section> {
        Some(Section {
            key: self.key?,
            title: self.title.unwrap_or_default(),
            section_type: self.kind.unwrap_or_default(),
        })
    }

    /// Classify a raw record. Entries without a rating key are skipped.
    fn into_item(self) -> Option<RemoteItem> {
        let rating_key = self.rating_key?;
        let title = self.title.unwrap_or_default();
        let kind = self.kind.unwrap_or_default();

        let item = match kind.as_str() {
            "artist" => RemoteItem::Artist(RemoteArtist {
                rating_key,
                title,
                thumb: self.thumb,
                art: self.art,
            }),
            "album" => RemoteItem::Album(RemoteAlbum {
                rating_key,
                title,
                parent_key: self.parent_key,
                parent_title: self.parent_title,
                year: self.year,
                thumb: self.thumb,
                art: self.art,
                leaf_count: self.leaf_count,
            }),
            "track" => RemoteItem::Track(RemoteTrack {
                rating_key,
                title,
                parent_key: self.parent_key,
                parent_title: self.parent_title,
                grandparent_key: self.grandparent_key,
                grandparent_title: self.grandparent_title,
                index: self.index,
                duration_ms: self.duration,
                summary: self.summary,
            }),
            _ => RemoteItem::Other {
                kind,
                rating_key,
                title,
            },
        };
        Some(item)
    }
}
