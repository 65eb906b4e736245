//! Catalog index build integration tests.
//!
//! These tests build the index against the mock server and check the merge,
//! tree shape and failure containment rules.

use std::time::Duration;

use plexdex_core::{
    index::NodeKind,
    plex::Section,
    testing::{fixtures, MockFailure, MockPlexServer, RecordedPlexCall},
    CatalogIndex, CatalogNode, IndexConfig, IndexError,
};

/// Two music sections that both carry "Daft Punk", plus "Air" in the first.
async fn two_section_server() -> MockPlexServer {
    let server = MockPlexServer::new();
    server.add_section(fixtures::section("1", "Music")).await;
    server.add_section(fixtures::section("2", "Vinyl")).await;

    let discovery = fixtures::remote_album("100", "Discovery", "10", "Daft Punk");
    let discovery_tracks = fixtures::album_tracks(&discovery, 3);
    server
        .add_discography(
            "1",
            fixtures::remote_artist("10", "Daft Punk"),
            vec![(discovery, discovery_tracks)],
        )
        .await;

    let moon_safari = fixtures::remote_album("300", "Moon Safari", "30", "Air");
    let moon_safari_tracks = fixtures::album_tracks(&moon_safari, 2);
    server
        .add_discography(
            "1",
            fixtures::remote_artist("30", "Air"),
            vec![(moon_safari, moon_safari_tracks)],
        )
        .await;

    let homework = fixtures::remote_album("200", "Homework", "20", "Daft Punk");
    let homework_tracks = fixtures::album_tracks(&homework, 1);
    server
        .add_discography(
            "2",
            fixtures::remote_artist("20", "Daft Punk"),
            vec![(homework, homework_tracks)],
        )
        .await;

    server
}

fn names(nodes: &[CatalogNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.name()).collect()
}

fn assert_shape(node: &CatalogNode, depth: usize) {
    let expected = match depth {
        0 => NodeKind::Root,
        1 => NodeKind::Artist,
        2 => NodeKind::Album,
        _ => NodeKind::Track,
    };
    assert_eq!(node.kind(), expected, "'{}' at depth {}", node.name(), depth);
    if depth == 3 {
        assert!(node.children().is_empty());
    }
    for child in node.children() {
        assert_shape(child, depth + 1);
    }
}

#[tokio::test]
async fn test_same_named_artists_are_merged_across_sections() {
    let server = two_section_server().await;
    let index = CatalogIndex::build(&server, &IndexConfig::default())
        .await
        .unwrap();

    assert_eq!(names(index.artists()), vec!["Daft Punk", "Air"]);

    let daft_punk = &index.artists()[0];
    assert_eq!(names(daft_punk.children()), vec!["Discovery", "Homework"]);
    assert_eq!(daft_punk.keys(), &["10".to_string(), "20".to_string()]);

    let by_first = index.find_artist("10").unwrap();
    let by_second = index.find_artist("20").unwrap();
    assert!(std::ptr::eq(by_first, by_second));
}

#[tokio::test]
async fn test_tree_has_fixed_depths() {
    let server = two_section_server().await;
    let index = CatalogIndex::build(&server, &IndexConfig::default())
        .await
        .unwrap();

    assert_shape(index.root(), 0);

    let discovery = index.find_album("100").unwrap();
    assert_eq!(
        names(discovery.children()),
        vec!["Track 1", "Track 2", "Track 3"]
    );
}

#[tokio::test]
async fn test_stats() {
    let server = two_section_server().await;
    let index = CatalogIndex::build(&server, &IndexConfig::default())
        .await
        .unwrap();

    let stats = index.stats();
    assert_eq!(stats.sections, vec!["Music", "Vinyl"]);
    assert_eq!(stats.artists, 2);
    assert_eq!(stats.albums, 3);
    assert_eq!(stats.tracks, 6);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_population_keeps_discovery_order() {
    let server = MockPlexServer::new();
    server.add_section(fixtures::section("1", "Music")).await;

    let artists = ["Aphex Twin", "Boards of Canada", "Caribou", "Boards of Canada"];
    for (i, name) in artists.iter().enumerate() {
        let key = format!("{}", i + 1);
        let album = fixtures::remote_album(
            &format!("{}00", i + 1),
            &format!("Album {}", i + 1),
            &key,
            name,
        );
        server
            .add_discography("1", fixtures::remote_artist(&key, name), vec![(album, vec![])])
            .await;
        // earlier artists answer last
        server
            .set_album_delay(&key, Duration::from_millis(100 * (artists.len() - i) as u64))
            .await;
    }

    let config = IndexConfig {
        workers: 4,
        sections: Vec::new(),
    };
    let index = CatalogIndex::build(&server, &config).await.unwrap();

    assert_eq!(
        names(index.artists()),
        vec!["Aphex Twin", "Boards of Canada", "Caribou"]
    );
    assert_eq!(
        names(index.artists()[1].children()),
        vec!["Album 2", "Album 4"]
    );
}

#[tokio::test]
async fn test_album_listing_failure_leaves_artist_empty() {
    let server = two_section_server().await;
    server.fail(MockFailure::Albums("30".to_string())).await;

    let index = CatalogIndex::build(&server, &IndexConfig::default())
        .await
        .unwrap();

    let air = index.find_artist("30").unwrap();
    assert!(air.children().is_empty());
    assert_eq!(index.find_artist("10").unwrap().children().len(), 2);
}

#[tokio::test]
async fn test_track_listing_failure_keeps_album() {
    let server = two_section_server().await;
    server.fail(MockFailure::Tracks("100".to_string())).await;

    let index = CatalogIndex::build(&server, &IndexConfig::default())
        .await
        .unwrap();

    let discovery = index.find_album("100").unwrap();
    assert!(discovery.children().is_empty());
    assert_eq!(index.find_album("200").unwrap().children().len(), 1);
}

#[tokio::test]
async fn test_section_listing_failure_is_fatal() {
    let server = two_section_server().await;
    server.fail(MockFailure::Sections).await;

    let result = CatalogIndex::build(&server, &IndexConfig::default()).await;
    assert!(matches!(result, Err(IndexError::Sections(_))));
}

#[tokio::test]
async fn test_artist_listing_failure_is_fatal() {
    let server = two_section_server().await;
    server.fail(MockFailure::Artists("2".to_string())).await;

    match CatalogIndex::build(&server, &IndexConfig::default()).await {
        Err(IndexError::Artists { section, .. }) => assert_eq!(section, "Vinyl"),
        other => panic!("expected artist listing failure, got {:?}", other.map(|i| i.stats())),
    }
}

#[tokio::test]
async fn test_only_configured_music_sections_are_crawled() {
    let server = two_section_server().await;
    server
        .add_section(Section {
            key: "3".to_string(),
            title: "Movies".to_string(),
            section_type: "movie".to_string(),
        })
        .await;

    let config = IndexConfig {
        workers: 1,
        sections: vec!["Vinyl".to_string()],
    };
    let index = CatalogIndex::build(&server, &config).await.unwrap();

    assert_eq!(names(index.artists()), vec!["Daft Punk"]);
    assert_eq!(index.artists()[0].keys(), &["20".to_string()]);

    let listed: Vec<RecordedPlexCall> = server
        .recorded_calls()
        .await
        .into_iter()
        .filter(|c| matches!(c, RecordedPlexCall::ListArtists { .. }))
        .collect();
    assert_eq!(
        listed,
        vec![RecordedPlexCall::ListArtists {
            section: "2".to_string()
        }]
    );
}

#[tokio::test]
async fn test_empty_server() {
    let server = MockPlexServer::new();
    let index = CatalogIndex::build(&server, &IndexConfig::default())
        .await
        .unwrap();

    assert!(index.artists().is_empty());
    assert!(index.search("anything").is_empty());
}
