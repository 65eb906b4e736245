//! In-memory catalog index.
//!
//! The tree is built once, before anything is served, and is never mutated
//! afterwards. Readers share it through `Arc<CatalogIndex>` without locking.

mod builder;
mod node;
mod search;

pub use node::{CatalogNode, NodeItem, NodeKind};
pub use search::{search, search_exact};

use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::IndexConfig;
use crate::metrics::{INDEX_BUILD_DURATION, INDEX_NODES};
use crate::plex::{PlexError, PlexServer, Section};

/// Failures that leave no usable index. Per-artist and per-album fetch
/// failures are contained during the build and never surface here.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Failed to enumerate library sections: {0}")]
    Sections(#[source] PlexError),

    #[error("Failed to enumerate artists of section '{section}': {source}")]
    Artists {
        section: String,
        #[source]
        source: PlexError,
    },
}

/// Size of a built index.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IndexStats {
    pub sections: Vec<String>,
    pub artists: usize,
    pub albums: usize,
    pub tracks: usize,
    pub build_duration_ms: u64,
}

#[derive(Debug)]
pub struct CatalogIndex {
    root: CatalogNode,
    sections: Vec<Section>,
    build_duration: Duration,
}

impl CatalogIndex {
    /// Crawl every configured music section and build the tree.
    pub async fn build(server: &dyn PlexServer, config: &IndexConfig) -> Result<Self, IndexError> {
        let started = Instant::now();
        let (root, sections) = builder::build_tree(server, config).await?;

        let index = Self {
            root,
            sections,
            build_duration: started.elapsed(),
        };

        let stats = index.stats();
        INDEX_BUILD_DURATION.observe(index.build_duration.as_secs_f64());
        INDEX_NODES.with_label_values(&["artist"]).set(stats.artists as i64);
        INDEX_NODES.with_label_values(&["album"]).set(stats.albums as i64);
        INDEX_NODES.with_label_values(&["track"]).set(stats.tracks as i64);
        info!(
            "Catalog index ready: {} artists, {} albums, {} tracks from {} sections in {:?}",
            stats.artists,
            stats.albums,
            stats.tracks,
            stats.sections.len(),
            index.build_duration
        );

        Ok(index)
    }

    /// An index with no sections, for hosts that serve nothing yet.
    pub fn empty() -> Self {
        Self {
            root: CatalogNode::root(),
            sections: Vec::new(),
            build_duration: Duration::ZERO,
        }
    }

    pub fn root(&self) -> &CatalogNode {
        &self.root
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn artists(&self) -> &[CatalogNode] {
        self.root.children()
    }

    /// Every album node, artist by artist.
    pub fn albums(&self) -> impl Iterator<Item = &CatalogNode> {
        self.artists().iter().flat_map(|a| a.children())
    }

    /// Artist node addressed by `key`, including keys merged into it.
    pub fn find_artist(&self, key: &str) -> Option<&CatalogNode> {
        self.artists().iter().find(|a| a.answers_to(key))
    }

    pub fn find_album(&self, key: &str) -> Option<&CatalogNode> {
        self.albums().find(|a| a.answers_to(key))
    }

    pub fn search(&self, query: &str) -> Vec<&CatalogNode> {
        search(&self.root, query)
    }

    pub fn search_exact(&self, query: &str) -> Vec<&CatalogNode> {
        search_exact(&self.root, query)
    }

    pub fn stats(&self) -> IndexStats {
        let albums = self.albums().count();
        let tracks = self.albums().map(|a| a.children().len()).sum();
        IndexStats {
            sections: self.sections.iter().map(|s| s.title.clone()).collect(),
            artists: self.artists().len(),
            albums,
            tracks,
            build_duration_ms: self.build_duration.as_millis() as u64,
        }
    }
}
