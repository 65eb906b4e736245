//! Mapping between Plex rating keys and `plex:` URIs.
//!
//! Outward URIs have the shape `plex:<kind>:<id>`, where `<id>` is the
//! rating key with the `/library/metadata/` prefix removed. Listing URIs
//! (`plex:directory`, `plex:album`, `plex:artist`, `plex:artist:<id>:all`)
//! are parsed by [`PlexUri::parse`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// URI scheme owned by this backend.
pub const SCHEME: &str = "plex";

/// Path prefix of every metadata key on a Plex server.
pub const METADATA_PREFIX: &str = "/library/metadata/";

/// URI of the browse root.
pub const ROOT_URI: &str = "plex:directory";

/// URI used for search results.
pub const SEARCH_URI: &str = "plex:search";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Malformed URI: {0}")]
    MalformedUri(String),
}

/// Entity kind carried in a URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UriKind {
    Artist,
    Album,
    Track,
}

impl UriKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UriKind::Artist => "artist",
            UriKind::Album => "album",
            UriKind::Track => "track",
        }
    }
}

impl fmt::Display for UriKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UriKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "artist" => Ok(UriKind::Artist),
            "album" => Ok(UriKind::Album),
            "track" => Ok(UriKind::Track),
            _ => Err(CodecError::MalformedUri(format!("unknown kind '{}'", s))),
        }
    }
}

/// Strip the metadata path prefix from a rating key or metadata key.
pub fn strip_prefix(raw_id: &str) -> &str {
    raw_id.strip_prefix(METADATA_PREFIX).unwrap_or(raw_id)
}

/// Build `plex:<kind>:<id>` from a raw remote identifier.
pub fn encode(raw_id: &str, kind: UriKind) -> String {
    format!("{}:{}:{}", SCHEME, kind, strip_prefix(raw_id))
}

/// Split `plex:<kind>:<id>` back into its kind and id.
pub fn decode(uri: &str) -> Result<(UriKind, String), CodecError> {
    let parts: Vec<&str> = uri.split(':').collect();
    match parts.as_slice() {
        [scheme, kind, id] if *scheme == SCHEME && !id.is_empty() => {
            let kind = kind
                .parse::<UriKind>()
                .map_err(|_| CodecError::MalformedUri(uri.to_string()))?;
            Ok((kind, id.to_string()))
        }
        _ => Err(CodecError::MalformedUri(uri.to_string())),
    }
}

/// Every URI shape the library understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlexUri {
    /// `plex:directory`
    Root,
    /// `plex:album`
    AllAlbums,
    /// `plex:album:<id>`
    Album(String),
    /// `plex:artist`
    AllArtists,
    /// `plex:artist:<id>`
    Artist(String),
    /// `plex:artist:<id>:all`
    ArtistTracks(String),
    /// `plex:track:<id>`
    Track(String),
}

impl PlexUri {
    pub fn parse(uri: &str) -> Result<Self, CodecError> {
        let malformed = || CodecError::MalformedUri(uri.to_string());
        let parts: Vec<&str> = uri.split(':').collect();

        if parts.first() != Some(&SCHEME) {
            return Err(malformed());
        }

        match &parts[1..] {
            ["directory"] => Ok(PlexUri::Root),
            ["album"] => Ok(PlexUri::AllAlbums),
            ["artist"] => Ok(PlexUri::AllArtists),
            ["artist", id, "all"] if !id.is_empty() => Ok(PlexUri::ArtistTracks(id.to_string())),
            [_, _] => {
                let (kind, id) = decode(uri)?;
                Ok(match kind {
                    UriKind::Artist => PlexUri::Artist(id),
                    UriKind::Album => PlexUri::Album(id),
                    UriKind::Track => PlexUri::Track(id),
                })
            }
            _ => Err(malformed()),
        }
    }
}

/// Turns stripped ids and resource paths into absolute server URLs.
///
/// Only used for binary resources such as artwork; these URLs are never
/// part of the browsing URI scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlResolver {
    base_url: String,
    token: Option<String>,
}

impl UrlResolver {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Absolute URL for `id`. Bare ids get the metadata prefix back,
    /// paths are used as-is.
    pub fn resolve(&self, id: &str) -> String {
        let path = if id.starts_with('/') {
            id.to_string()
        } else {
            format!("{}{}", METADATA_PREFIX, id)
        };

        match &self.token {
            Some(token) => {
                let delim = if path.contains('?') { '&' } else { '?' };
                format!(
                    "{}{}{}X-Plex-Token={}",
                    self.base_url,
                    path,
                    delim,
                    urlencoding::encode(token)
                )
            }
            None => format!("{}{}", self.base_url, path),
        }
    }
}
