//! Conversion of Plex records into host records.

use thiserror::Error;

use crate::codec::{encode, UriKind, UrlResolver};
use crate::models::{Album, Artist, SearchResult, Track};
use crate::plex::{RemoteAlbum, RemoteArtist, RemoteItem, RemoteTrack};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WrapError {
    #[error("{kind} {rating_key} is missing field '{field}'")]
    MissingField {
        kind: &'static str,
        rating_key: String,
        field: &'static str,
    },
}

fn require<'a>(
    value: &'a Option<String>,
    kind: &'static str,
    rating_key: &str,
    field: &'static str,
) -> Result<&'a str, WrapError> {
    value.as_deref().ok_or_else(|| WrapError::MissingField {
        kind,
        rating_key: rating_key.to_string(),
        field,
    })
}

pub fn wrap_artist(artist: &RemoteArtist) -> Artist {
    Artist {
        uri: encode(&artist.rating_key, UriKind::Artist),
        name: artist.title.clone(),
    }
}

/// Wrap a track. The album and artist keys must be present.
pub fn wrap_track(track: &RemoteTrack) -> Result<Track, WrapError> {
    let artist_key = require(&track.grandparent_key, "track", &track.rating_key, "grandparentKey")?;
    let album_key = require(&track.parent_key, "track", &track.rating_key, "parentKey")?;

    Ok(Track {
        uri: encode(&track.rating_key, UriKind::Track),
        name: track.title.clone(),
        artists: vec![Artist {
            uri: encode(artist_key, UriKind::Artist),
            name: track.grandparent_title.clone().unwrap_or_default(),
        }],
        album: Some(Album {
            uri: encode(album_key, UriKind::Album),
            name: track.parent_title.clone().unwrap_or_default(),
            artists: Vec::new(),
            num_tracks: None,
            num_discs: None,
            date: None,
            images: Vec::new(),
        }),
        track_no: track.index,
        length_ms: track.duration_ms,
        comment: track.summary.clone().filter(|s| !s.is_empty()),
    })
}

/// Wrap an album, resolving thumbnail and full artwork to absolute URLs.
pub fn wrap_album(album: &RemoteAlbum, resolver: &UrlResolver) -> Result<Album, WrapError> {
    let artist_key = require(&album.parent_key, "album", &album.rating_key, "parentKey")?;

    let images = [&album.thumb, &album.art]
        .into_iter()
        .flatten()
        .map(|path| resolver.resolve(path))
        .collect();

    Ok(Album {
        uri: encode(&album.rating_key, UriKind::Album),
        name: album.title.clone(),
        artists: vec![Artist {
            uri: encode(artist_key, UriKind::Artist),
            name: album.parent_title.clone().unwrap_or_default(),
        }],
        num_tracks: album.leaf_count,
        num_discs: None,
        date: album.year.map(|y| y.to_string()),
        images,
    })
}

/// A wrapped search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchHit {
    Artist(Artist),
    Album(Album),
    Track(Track),
}

/// Wrap any remote item. Items we do not expose yield `Ok(None)`.
pub fn wrap_item(
    item: &RemoteItem,
    resolver: &UrlResolver,
) -> Result<Option<SearchHit>, WrapError> {
    Ok(match item {
        RemoteItem::Artist(artist) => Some(SearchHit::Artist(wrap_artist(artist))),
        RemoteItem::Album(album) => Some(SearchHit::Album(wrap_album(album, resolver)?)),
        RemoteItem::Track(track) => Some(SearchHit::Track(wrap_track(track)?)),
        RemoteItem::Other { .. } => None,
    })
}

impl SearchResult {
    /// Sort hits into their buckets, keeping the order they arrive in.
    pub fn from_hits(uri: impl Into<String>, hits: impl IntoIterator<Item = SearchHit>) -> Self {
        let mut result = SearchResult::empty(uri);
        for hit in hits {
            match hit {
                SearchHit::Artist(artist) => result.artists.push(artist),
                SearchHit::Album(album) => result.albums.push(album),
                SearchHit::Track(track) => result.tracks.push(track),
            }
        }
        result
    }
}
