//! Browse, lookup and search over a Plex music library.
//!
//! Listings come from the catalog index where it holds the data and from
//! the server otherwise. Every public operation is memoized per argument
//! set for the configured TTL, so a hit performs no remote call and emits
//! none of the operation's own log lines. Failed remote calls are logged,
//! answered with an empty result and never cached.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::codec::{
    decode, encode, PlexUri, UriKind, UrlResolver, METADATA_PREFIX, ROOT_URI, SCHEME, SEARCH_URI,
};
use crate::config::CacheConfig;
use crate::index::{CatalogIndex, CatalogNode, IndexStats, NodeItem};
use crate::models::{Image, Ref, SearchQuery, SearchResult, Track};
use crate::plex::{PlexError, PlexServer, RemoteItem};
use crate::wrap::{wrap_album, wrap_artist, wrap_item, wrap_track, SearchHit, WrapError};

/// Name of the browse root.
pub const ROOT_NAME: &str = "Plex Music";

type SearchKey = (SearchQuery, Option<Vec<String>>, bool);

pub struct PlexLibrary {
    server: Arc<dyn PlexServer>,
    index: Arc<CatalogIndex>,
    resolver: UrlResolver,
    browse_cache: TtlCache<String, Vec<Ref>>,
    lookup_cache: TtlCache<String, Vec<Track>>,
    search_cache: TtlCache<SearchKey, SearchResult>,
}

impl PlexLibrary {
    pub fn new(
        server: Arc<dyn PlexServer>,
        index: Arc<CatalogIndex>,
        config: &CacheConfig,
    ) -> Self {
        let ttl = config.ttl();
        Self {
            resolver: server.resolver(),
            server,
            index,
            browse_cache: TtlCache::new("browse", ttl),
            lookup_cache: TtlCache::new("lookup", ttl),
            search_cache: TtlCache::new("search", ttl),
        }
    }

    pub fn root_directory() -> Ref {
        Ref::directory(ROOT_URI, ROOT_NAME)
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    pub fn index_stats(&self) -> IndexStats {
        self.index.stats()
    }

    // =========================================================================
    // Browse
    // =========================================================================

    /// Entries below `uri`. Unknown or malformed URIs and remote failures
    /// yield an empty list.
    pub async fn browse(&self, uri: &str) -> Vec<Ref> {
        let refs = self
            .browse_cache
            .get_or_try_compute(uri.to_string(), || self.browse_uncached(uri))
            .await;

        refs.unwrap_or_else(|e| {
            warn!("Failed to browse {}: {}", uri, e);
            Vec::new()
        })
    }

    async fn browse_uncached(&self, uri: &str) -> Result<Vec<Ref>, PlexError> {
        debug!("browse: {}", uri);
        if uri.is_empty() {
            return Ok(Vec::new());
        }

        let target = match PlexUri::parse(uri) {
            Ok(target) => target,
            Err(_) => {
                debug!("Unknown uri for browse request: {}", uri);
                return Ok(Vec::new());
            }
        };

        let refs = match target {
            PlexUri::Root => vec![
                Ref::directory(format!("{}:album", SCHEME), "Albums"),
                Ref::directory(format!("{}:artist", SCHEME), "Artists"),
            ],
            PlexUri::AllAlbums => {
                let refs: Vec<Ref> = self.index.albums().filter_map(node_ref).collect();
                debug!("{} albums found", refs.len());
                refs
            }
            PlexUri::AllArtists => self.index.artists().iter().filter_map(node_ref).collect(),
            PlexUri::Album(id) => match self.index.find_album(&id) {
                Some(album) if !album.children().is_empty() => {
                    album.children().iter().filter_map(node_ref).collect()
                }
                _ => remote_refs(&self.server.fetch_children(&id).await?),
            },
            PlexUri::Artist(id) => match self.index.find_artist(&id) {
                Some(artist) if !artist.children().is_empty() => {
                    artist.children().iter().filter_map(node_ref).collect()
                }
                _ => remote_refs(&self.server.fetch_children(&id).await?),
            },
            PlexUri::ArtistTracks(id) => {
                let tracks: Vec<Ref> = self
                    .index
                    .find_artist(&id)
                    .into_iter()
                    .flat_map(|artist| artist.children())
                    .flat_map(|album| album.children())
                    .filter_map(node_ref)
                    .collect();
                if tracks.is_empty() {
                    let path = format!("{}{}/allLeaves", METADATA_PREFIX, id);
                    remote_refs(&self.server.query(&path).await?)
                } else {
                    tracks
                }
            }
            PlexUri::Track(_) => {
                debug!("Tracks are not browsable: {}", uri);
                Vec::new()
            }
        };
        Ok(refs)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Tracks addressed by an artist, album or track URI. Always asks the
    /// server.
    pub async fn lookup(&self, uri: &str) -> Vec<Track> {
        let tracks = self
            .lookup_cache
            .get_or_try_compute(uri.to_string(), || self.lookup_uncached(uri))
            .await;

        tracks.unwrap_or_else(|e| {
            warn!("Failed to look up {}: {}", uri, e);
            Vec::new()
        })
    }

    async fn lookup_uncached(&self, uri: &str) -> Result<Vec<Track>, PlexError> {
        let (kind, id) = match decode(uri) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!("Ignoring lookup of {}: {}", uri, e);
                return Ok(Vec::new());
            }
        };

        let items = match kind {
            UriKind::Artist => {
                self.server
                    .query(&format!("{}{}/allLeaves", METADATA_PREFIX, id))
                    .await?
            }
            UriKind::Album => self.server.fetch_children(&id).await?,
            UriKind::Track => vec![self.server.fetch_item(&id).await?],
        };

        Ok(items
            .iter()
            .filter_map(|item| match item {
                RemoteItem::Track(track) => keep_wrapped(wrap_track(track)),
                _ => None,
            })
            .collect())
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Search the index, falling back to the server when it has nothing.
    ///
    /// `uris` limits the search to URI roots; roots outside the `plex`
    /// scheme never match.
    pub async fn search(
        &self,
        query: &SearchQuery,
        uris: Option<&[String]>,
        exact: bool,
    ) -> SearchResult {
        let key = (query.clone(), uris.map(|u| u.to_vec()), exact);
        let result = self
            .search_cache
            .get_or_try_compute(key, || self.search_uncached(query, uris, exact))
            .await;

        result.unwrap_or_else(|e| {
            warn!("Plex search failed: {}", e);
            SearchResult::empty(search_uri(query))
        })
    }

    async fn search_uncached(
        &self,
        query: &SearchQuery,
        uris: Option<&[String]>,
        exact: bool,
    ) -> Result<SearchResult, PlexError> {
        let uri = search_uri(query);
        let Some(text) = query.text() else {
            debug!("Ignored search without query");
            return Ok(SearchResult::empty(uri));
        };

        if let Some(roots) = uris {
            let ours = format!("{}:", SCHEME);
            if !roots.iter().any(|root| root.starts_with(&ours)) {
                debug!("No {} roots among {:?}, skipping search", SCHEME, roots);
                return Ok(SearchResult::empty(uri));
            }
        }

        let nodes = if exact {
            self.index.search_exact(&text)
        } else {
            self.index.search(&text)
        };
        if !nodes.is_empty() {
            info!("Using indexed search results for query '{}'", text);
            let hits: Vec<SearchHit> = nodes
                .into_iter()
                .filter_map(|node| self.wrap_node(node))
                .collect();
            return Ok(SearchResult::from_hits(uri, hits));
        }

        debug!("Searching Plex with query '{}'", text);
        let items = self.server.search(&text).await?;

        let folded = text.to_lowercase();
        let hits: Vec<SearchHit> = items
            .iter()
            .filter(|item| !exact || item.title().to_lowercase() == folded)
            .filter_map(|item| keep_wrapped(wrap_item(item, &self.resolver)).flatten())
            .collect();
        Ok(SearchResult::from_hits(uri, hits))
    }

    fn wrap_node(&self, node: &CatalogNode) -> Option<SearchHit> {
        match node.item() {
            NodeItem::Root => None,
            NodeItem::Artist(artist) => Some(SearchHit::Artist(wrap_artist(artist))),
            NodeItem::Album(album) => {
                keep_wrapped(wrap_album(album, &self.resolver)).map(SearchHit::Album)
            }
            NodeItem::Track(track) => keep_wrapped(wrap_track(track)).map(SearchHit::Track),
        }
    }

    // =========================================================================
    // Images
    // =========================================================================

    /// Artwork per URI. Not provided by this backend yet: always empty.
    pub fn get_images(&self, uris: &[String]) -> HashMap<String, Vec<Image>> {
        debug!("get_images for {} uris", uris.len());
        HashMap::new()
    }
}

/// `plex:search` for a query without text, `plex:search:<text>` otherwise.
fn search_uri(query: &SearchQuery) -> String {
    match query.text() {
        Some(text) => format!("{}:{}", SEARCH_URI, urlencoding::encode(&text)),
        None => SEARCH_URI.to_string(),
    }
}

fn remote_refs(items: &[RemoteItem]) -> Vec<Ref> {
    items.iter().filter_map(item_ref).collect()
}

fn keep_wrapped<T>(result: Result<T, WrapError>) -> Option<T> {
    result
        .map_err(|e| warn!("Skipping malformed item: {}", e))
        .ok()
}

/// Ref for an indexed node. The first key is used for merged artists.
fn node_ref(node: &CatalogNode) -> Option<Ref> {
    match node.item() {
        NodeItem::Root => None,
        NodeItem::Artist(artist) => Some(Ref::directory(
            encode(&artist.rating_key, UriKind::Artist),
            node.name(),
        )),
        NodeItem::Album(album) => Some(Ref::directory(
            encode(&album.rating_key, UriKind::Album),
            node.name(),
        )),
        NodeItem::Track(track) => Some(Ref::track(
            encode(&track.rating_key, UriKind::Track),
            node.name(),
        )),
    }
}

fn item_ref(item: &RemoteItem) -> Option<Ref> {
    match item {
        RemoteItem::Artist(artist) => Some(Ref::directory(
            encode(&artist.rating_key, UriKind::Artist),
            &artist.title,
        )),
        RemoteItem::Album(album) => Some(Ref::directory(
            encode(&album.rating_key, UriKind::Album),
            &album.title,
        )),
        RemoteItem::Track(track) => Some(Ref::track(
            encode(&track.rating_key, UriKind::Track),
            &track.title,
        )),
        RemoteItem::Other { kind, rating_key, .. } => {
            debug!("Skipping {} {} in listing", kind, rating_key);
            None
        }
    }
}
