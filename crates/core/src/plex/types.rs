//! Records returned by the Plex server.

use serde::{Deserialize, Serialize};

/// Section type Plex uses for music libraries.
pub const MUSIC_SECTION_TYPE: &str = "artist";

/// A library section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    /// Section key used in `/library/sections/{key}`.
    pub key: String,
    /// Display title.
    pub title: String,
    /// Plex section type (`artist` for music).
    pub section_type: String,
}

impl Section {
    pub fn is_music(&self) -> bool {
        self.section_type == MUSIC_SECTION_TYPE
    }
}

/// An artist as listed by a music section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteArtist {
    pub rating_key: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art: Option<String>,
}

/// An album.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteAlbum {
    pub rating_key: String,
    pub title: String,
    /// Key of the album artist, e.g. `/library/metadata/41`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art: Option<String>,
    /// Number of tracks as reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_count: Option<u32>,
}

/// A track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteTrack {
    pub rating_key: String,
    pub title: String,
    /// Album key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_title: Option<String>,
    /// Artist key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grandparent_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grandparent_title: Option<String>,
    /// Position on the album (1-indexed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Any metadata item, classified once when it is parsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemoteItem {
    Artist(RemoteArtist),
    Album(RemoteAlbum),
    Track(RemoteTrack),
    /// Playlists, clips, photos and anything else we do not index.
    Other {
        kind: String,
        rating_key: String,
        title: String,
    },
}

impl RemoteItem {
    pub fn rating_key(&self) -> &str {
        match self {
            RemoteItem::Artist(a) => &a.rating_key,
            RemoteItem::Album(a) => &a.rating_key,
            RemoteItem::Track(t) => &t.rating_key,
            RemoteItem::Other { rating_key, .. } => rating_key,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            RemoteItem::Artist(a) => &a.title,
            RemoteItem::Album(a) => &a.title,
            RemoteItem::Track(t) => &t.title,
            RemoteItem::Other { title, .. } => title,
        }
    }

    /// Plex type name of the item.
    pub fn kind(&self) -> &str {
        match self {
            RemoteItem::Artist(_) => "artist",
            RemoteItem::Album(_) => "album",
            RemoteItem::Track(_) => "track",
            RemoteItem::Other { kind, .. } => kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_is_music() {
        let music = Section {
            key: "1".to_string(),
            title: "Music".to_string(),
            section_type: "artist".to_string(),
        };
        let movies = Section {
            key: "2".to_string(),
            title: "Movies".to_string(),
            section_type: "movie".to_string(),
        };
        assert!(music.is_music());
        assert!(!movies.is_music());
    }

    #[test]
    fn test_remote_item_accessors() {
        let item = RemoteItem::Other {
            kind: "playlist".to_string(),
            rating_key: "900".to_string(),
            title: "Road Trip".to_string(),
        };
        assert_eq!(item.kind(), "playlist");
        assert_eq!(item.rating_key(), "900");
        assert_eq!(item.title(), "Road Trip");
    }
}
