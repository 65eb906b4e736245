//! Testing utilities and a mock Plex server.
//!
//! # Example
//!
//! ```rust,ignore
//! use plexdex_core::testing::{fixtures, MockPlexServer};
//!
//! let server = MockPlexServer::new();
//! server.add_section(fixtures::section("1", "Music")).await;
//! server
//!     .add_discography("1", fixtures::remote_artist("10", "Daft Punk"), vec![/* albums */])
//!     .await;
//!
//! let index = CatalogIndex::build(&server, &IndexConfig::default()).await?;
//! ```

mod mock_plex_server;

pub use mock_plex_server::{MockFailure, MockPlexServer, RecordedPlexCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::codec::METADATA_PREFIX;
    use crate::plex::{RemoteAlbum, RemoteArtist, RemoteTrack, Section, MUSIC_SECTION_TYPE};

    /// A music section.
    pub fn section(key: &str, title: &str) -> Section {
        Section {
            key: key.to_string(),
            title: title.to_string(),
            section_type: MUSIC_SECTION_TYPE.to_string(),
        }
    }

    pub fn remote_artist(key: &str, title: &str) -> RemoteArtist {
        RemoteArtist {
            rating_key: key.to_string(),
            title: title.to_string(),
            thumb: None,
            art: None,
        }
    }

    /// An album whose parent key points at `artist_key`.
    pub fn remote_album(
        key: &str,
        title: &str,
        artist_key: &str,
        artist_title: &str,
    ) -> RemoteAlbum {
        RemoteAlbum {
            rating_key: key.to_string(),
            title: title.to_string(),
            parent_key: Some(format!("{}{}", METADATA_PREFIX, artist_key)),
            parent_title: Some(artist_title.to_string()),
            year: None,
            thumb: None,
            art: None,
            leaf_count: None,
        }
    }

    /// A track with album and artist keys filled in.
    pub fn remote_track(
        key: &str,
        title: &str,
        album_key: &str,
        album_title: &str,
        artist_key: &str,
        artist_title: &str,
    ) -> RemoteTrack {
        RemoteTrack {
            rating_key: key.to_string(),
            title: title.to_string(),
            parent_key: Some(format!("{}{}", METADATA_PREFIX, album_key)),
            parent_title: Some(album_title.to_string()),
            grandparent_key: Some(format!("{}{}", METADATA_PREFIX, artist_key)),
            grandparent_title: Some(artist_title.to_string()),
            index: None,
            duration_ms: Some(240_000),
            summary: None,
        }
    }

    /// `count` numbered tracks for an album, keyed `{album_key}-{n}`.
    pub fn album_tracks(album: &RemoteAlbum, count: u32) -> Vec<RemoteTrack> {
        let artist_key = album
            .parent_key
            .as_deref()
            .map(crate::codec::strip_prefix)
            .unwrap_or_default();
        let artist_title = album.parent_title.as_deref().unwrap_or_default();

        (1..=count)
            .map(|n| {
                let mut track = remote_track(
                    &format!("{}-{}", album.rating_key, n),
                    &format!("Track {}", n),
                    &album.rating_key,
                    &album.title,
                    artist_key,
                    artist_title,
                );
                track.index = Some(n);
                track
            })
            .collect()
    }
}
