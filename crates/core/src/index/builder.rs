//! Crawl the remote catalog into a tree.
//!
//! Sections are processed one after another. Within a section, the merge
//! decision for each artist is taken in discovery order against the root,
//! then artists are populated (albums, then tracks per album) with up to
//! `workers` artists in flight. Populated albums are attached in discovery
//! order once they are all back, so the root is only ever touched from
//! this task.

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use super::node::CatalogNode;
use super::IndexError;
use crate::config::IndexConfig;
use crate::metrics::{MERGE_AMBIGUITIES, POPULATION_FAILURES};
use crate::plex::{PlexServer, RemoteArtist, Section};

/// Where an incoming artist goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MergeTarget {
    /// No artist with this name yet.
    New,
    /// Exactly one artist with this name, at this root index.
    Existing(usize),
    /// Several artists already share the name; the data cannot be placed.
    Ambiguous(usize),
}

/// Exact, case-sensitive name lookup among the root's artists.
pub(crate) fn find_merge_target(artists: &[CatalogNode], name: &str) -> MergeTarget {
    let mut matches = artists
        .iter()
        .enumerate()
        .filter(|(_, node)| node.name() == name)
        .map(|(i, _)| i);

    match (matches.next(), matches.next()) {
        (None, _) => MergeTarget::New,
        (Some(i), None) => MergeTarget::Existing(i),
        (Some(_), Some(_)) => MergeTarget::Ambiguous(2 + matches.count()),
    }
}

/// Music sections to index, honoring the configured title filter.
fn select_sections(sections: Vec<Section>, config: &IndexConfig) -> Vec<Section> {
    let music: Vec<Section> = sections
        .into_iter()
        .filter(|s| s.is_music())
        .filter(|s| config.sections.is_empty() || config.sections.contains(&s.title))
        .collect();

    for wanted in &config.sections {
        if !music.iter().any(|s| &s.title == wanted) {
            warn!("Configured music section '{}' not found on server", wanted);
        }
    }

    music
}

pub(super) async fn build_tree(
    server: &dyn PlexServer,
    config: &IndexConfig,
) -> Result<(CatalogNode, Vec<Section>), IndexError> {
    let sections = server.list_sections().await.map_err(IndexError::Sections)?;
    let sections = select_sections(sections, config);

    info!("Initializing Plex catalog index...");
    let mut root = CatalogNode::root();

    for section in &sections {
        info!("Indexing music section {}", section.title);
        let artists = server
            .list_artists(section)
            .await
            .map_err(|source| IndexError::Artists {
                section: section.title.clone(),
                source,
            })?;

        let jobs = plan_merges(&mut root, artists);

        let populated: Vec<(usize, RemoteArtist, Vec<CatalogNode>)> = stream::iter(jobs)
            .map(|(target, artist)| async move {
                let albums = populate(server, &artist).await;
                (target, artist, albums)
            })
            .buffered(config.workers.max(1))
            .collect()
            .await;

        for (target, artist, albums) in populated {
            if let Some(node) = root.artist_mut(target) {
                node.merge_albums(&artist, albums);
            }
        }
    }

    Ok((root, sections))
}

/// Decide the target node of every artist, creating nodes for new names.
/// Ambiguous artists are logged and dropped.
fn plan_merges(root: &mut CatalogNode, artists: Vec<RemoteArtist>) -> Vec<(usize, RemoteArtist)> {
    let mut jobs = Vec::with_capacity(artists.len());

    for artist in artists {
        match find_merge_target(root.children(), &artist.title) {
            MergeTarget::New => {
                debug!("Adding artist '{}'", artist.title);
                let target = root.push_artist(CatalogNode::artist(artist.clone()));
                jobs.push((target, artist));
            }
            MergeTarget::Existing(target) => {
                info!("Appending to existing artist '{}'", artist.title);
                jobs.push((target, artist));
            }
            MergeTarget::Ambiguous(count) => {
                error!(
                    "Multiple results ({}) found for artist '{}', skipping {}",
                    count, artist.title, artist.rating_key
                );
                MERGE_AMBIGUITIES.inc();
            }
        }
    }

    jobs
}

/// Fetch one artist's albums and their tracks. Failures are contained:
/// no albums on album-listing failure, an empty album on track-listing
/// failure.
async fn populate(server: &dyn PlexServer, artist: &RemoteArtist) -> Vec<CatalogNode> {
    let albums = match server.list_albums(artist).await {
        Ok(albums) => albums,
        Err(e) => {
            error!("Error fetching albums for artist '{}': {}", artist.title, e);
            POPULATION_FAILURES.with_label_values(&["albums"]).inc();
            return Vec::new();
        }
    };

    let mut nodes = Vec::with_capacity(albums.len());
    for album in albums {
        let tracks = match server.list_tracks(&album).await {
            Ok(tracks) => tracks,
            Err(e) => {
                error!(
                    "Error fetching tracks for album '{}' of '{}': {}",
                    album.title, artist.title, e
                );
                POPULATION_FAILURES.with_label_values(&["tracks"]).inc();
                Vec::new()
            }
        };
        nodes.push(CatalogNode::album(album, tracks));
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn artists(names: &[&str]) -> Vec<CatalogNode> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| CatalogNode::artist(fixtures::remote_artist(&i.to_string(), name)))
            .collect()
    }

    #[test]
    fn test_find_merge_target_new() {
        let nodes = artists(&["Air", "Justice"]);
        assert_eq!(find_merge_target(&nodes, "Daft Punk"), MergeTarget::New);
        assert_eq!(find_merge_target(&[], "Daft Punk"), MergeTarget::New);
    }

    #[test]
    fn test_find_merge_target_is_case_sensitive() {
        let nodes = artists(&["Air", "Daft Punk"]);
        assert_eq!(find_merge_target(&nodes, "Daft Punk"), MergeTarget::Existing(1));
        assert_eq!(find_merge_target(&nodes, "daft punk"), MergeTarget::New);
    }

    #[test]
    fn test_find_merge_target_ambiguous() {
        let nodes = artists(&["Daft Punk", "Air", "Daft Punk", "Daft Punk"]);
        assert_eq!(find_merge_target(&nodes, "Daft Punk"), MergeTarget::Ambiguous(3));
    }

    #[test]
    fn test_plan_merges_skips_ambiguous_artist() {
        let mut root = CatalogNode::root();
        for node in artists(&["Daft Punk", "Daft Punk"]) {
            root.push_artist(node);
        }

        let jobs = plan_merges(
            &mut root,
            vec![
                fixtures::remote_artist("10", "Daft Punk"),
                fixtures::remote_artist("11", "Air"),
            ],
        );

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].1.title, "Air");
        assert_eq!(root.children().len(), 3);
    }

    #[test]
    fn test_plan_merges_same_name_within_one_section() {
        let mut root = CatalogNode::root();
        let jobs = plan_merges(
            &mut root,
            vec![
                fixtures::remote_artist("1", "Daft Punk"),
                fixtures::remote_artist("2", "Daft Punk"),
            ],
        );

        assert_eq!(root.children().len(), 1);
        assert_eq!(jobs.iter().map(|(t, _)| *t).collect::<Vec<_>>(), vec![0, 0]);
    }

    #[test]
    fn test_select_sections_filters_music_and_titles() {
        let sections = vec![
            fixtures::section("1", "Music"),
            fixtures::section("2", "Vinyl"),
            Section {
                key: "3".to_string(),
                title: "Movies".to_string(),
                section_type: "movie".to_string(),
            },
        ];

        let all = select_sections(sections.clone(), &IndexConfig::default());
        assert_eq!(all.len(), 2);

        let config = IndexConfig {
            workers: 1,
            sections: vec!["Vinyl".to_string(), "Movies".to_string()],
        };
        let picked = select_sections(sections, &config);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].title, "Vinyl");
    }
}
