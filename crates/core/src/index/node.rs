//! Catalog tree nodes.
//!
//! Nesting is fixed: root → artists → albums → tracks. The constructors and
//! the crate-private mutators below are the only way to grow a tree, and
//! each of them only accepts the next level down.

use serde::Serialize;

use crate::plex::{RemoteAlbum, RemoteArtist, RemoteTrack};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Artist,
    Album,
    Track,
}

/// Remote record behind a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeItem {
    Root,
    Artist(RemoteArtist),
    Album(RemoteAlbum),
    Track(RemoteTrack),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogNode {
    name: String,
    /// Lowercased name used for matching.
    folded: String,
    item: NodeItem,
    /// Rating keys that address this node. Artists merged from several
    /// sections carry one key per section.
    keys: Vec<String>,
    children: Vec<CatalogNode>,
}

impl CatalogNode {
    fn new(name: String, item: NodeItem, keys: Vec<String>, children: Vec<CatalogNode>) -> Self {
        Self {
            folded: name.to_lowercase(),
            name,
            item,
            keys,
            children,
        }
    }

    pub fn root() -> Self {
        Self::new(String::new(), NodeItem::Root, Vec::new(), Vec::new())
    }

    /// A new artist node without albums.
    pub fn artist(artist: RemoteArtist) -> Self {
        Self::new(
            artist.title.clone(),
            NodeItem::Artist(artist.clone()),
            vec![artist.rating_key],
            Vec::new(),
        )
    }

    /// An album node holding its tracks in server order.
    pub fn album(album: RemoteAlbum, tracks: Vec<RemoteTrack>) -> Self {
        let children = tracks.into_iter().map(CatalogNode::track).collect();
        Self::new(
            album.title.clone(),
            NodeItem::Album(album.clone()),
            vec![album.rating_key],
            children,
        )
    }

    fn track(track: RemoteTrack) -> Self {
        Self::new(
            track.title.clone(),
            NodeItem::Track(track.clone()),
            vec![track.rating_key],
            Vec::new(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn folded_name(&self) -> &str {
        &self.folded
    }

    pub fn item(&self) -> &NodeItem {
        &self.item
    }

    pub fn kind(&self) -> NodeKind {
        match self.item {
            NodeItem::Root => NodeKind::Root,
            NodeItem::Artist(_) => NodeKind::Artist,
            NodeItem::Album(_) => NodeKind::Album,
            NodeItem::Track(_) => NodeKind::Track,
        }
    }

    pub fn children(&self) -> &[CatalogNode] {
        &self.children
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Whether `key` (with or without the metadata prefix) addresses this node.
    pub fn answers_to(&self, key: &str) -> bool {
        let key = crate::codec::strip_prefix(key);
        self.keys.iter().any(|k| k == key)
    }

    /// Attach a new artist to the root.
    pub(crate) fn push_artist(&mut self, artist: CatalogNode) -> usize {
        debug_assert_eq!(self.kind(), NodeKind::Root);
        debug_assert_eq!(artist.kind(), NodeKind::Artist);
        self.children.push(artist);
        self.children.len() - 1
    }

    pub(crate) fn artist_mut(&mut self, index: usize) -> Option<&mut CatalogNode> {
        debug_assert_eq!(self.kind(), NodeKind::Root);
        self.children.get_mut(index)
    }

    /// Merge albums contributed by `source` into this artist node.
    pub(crate) fn merge_albums(&mut self, source: &RemoteArtist, albums: Vec<CatalogNode>) {
        debug_assert_eq!(self.kind(), NodeKind::Artist);
        debug_assert!(albums.iter().all(|a| a.kind() == NodeKind::Album));
        if !self.keys.contains(&source.rating_key) {
            self.keys.push(source.rating_key.clone());
        }
        self.children.extend(albums);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_album_node_holds_tracks_in_order() {
        let album = fixtures::remote_album("10", "Homework", "1", "Daft Punk");
        let tracks = vec![
            fixtures::remote_track("11", "Daftendirekt", "10", "Homework", "1", "Daft Punk"),
            fixtures::remote_track("12", "WDPK 83.7 FM", "10", "Homework", "1", "Daft Punk"),
        ];
        let node = CatalogNode::album(album, tracks);

        assert_eq!(node.kind(), NodeKind::Album);
        let names: Vec<&str> = node.children().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["Daftendirekt", "WDPK 83.7 FM"]);
        assert!(node.children().iter().all(|c| c.kind() == NodeKind::Track));
    }

    #[test]
    fn test_merge_albums_records_source_key() {
        let mut artist = CatalogNode::artist(fixtures::remote_artist("1", "Daft Punk"));
        let other = fixtures::remote_artist("2", "Daft Punk");
        let album = CatalogNode::album(
            fixtures::remote_album("20", "Homework", "2", "Daft Punk"),
            vec![],
        );

        artist.merge_albums(&other, vec![album]);

        assert!(artist.answers_to("1"));
        assert!(artist.answers_to("/library/metadata/2"));
        assert!(!artist.answers_to("3"));
        assert_eq!(artist.children().len(), 1);
    }

    #[test]
    fn test_folded_name() {
        let node = CatalogNode::artist(fixtures::remote_artist("1", "ABBA"));
        assert_eq!(node.folded_name(), "abba");
        assert_eq!(node.name(), "ABBA");
    }
}
