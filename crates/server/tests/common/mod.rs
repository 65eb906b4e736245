//! Common test utilities for API testing with a mock Plex server.
//!
//! This module provides a test fixture that builds the catalog index from a
//! `MockPlexServer` and serves the router in-process.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use plexdex_core::{
    testing::MockPlexServer, CacheConfig, CatalogIndex, Config, IndexConfig, PlexConfig,
    PlexLibrary, ServerConfig,
};

/// Re-export fixtures for test convenience
pub use plexdex_core::testing::fixtures;

/// Test fixture for API testing with a mock Plex server.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_browse_root() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.get("/api/v1/library/browse?uri=plex:directory").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock Plex server - inspect calls, inject failures
    pub plex: Arc<MockPlexServer>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Fixture over the default two-section catalog.
    pub async fn new() -> Self {
        Self::with_server(default_catalog().await).await
    }

    /// Build the index from `plex` and serve it.
    pub async fn with_server(plex: Arc<MockPlexServer>) -> Self {
        let config = Config {
            plex: PlexConfig::direct(MockPlexServer::BASE_URL, MockPlexServer::TOKEN),
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            cache: CacheConfig::default(),
            index: IndexConfig::default(),
        };

        let index = CatalogIndex::build(plex.as_ref(), &config.index)
            .await
            .expect("Failed to build index");
        plex.clear_recorded().await;

        let library = Arc::new(PlexLibrary::new(
            Arc::clone(&plex) as Arc<dyn plexdex_core::PlexServer>,
            Arc::new(index),
            &config.cache,
        ));
        let state = Arc::new(plexdex_server::state::AppState::new(config, library));
        let router = plexdex_server::api::create_router(state);

        Self { router, plex }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| {
                    Value::String(String::from_utf8_lossy(&body_bytes).into_owned())
                })
        };

        TestResponse { status, body }
    }
}

/// "Daft Punk" in sections Music (Discovery) and Vinyl (Homework), and
/// "Air" in Music (Moon Safari).
pub async fn default_catalog() -> Arc<MockPlexServer> {
    let plex = Arc::new(MockPlexServer::new());
    plex.add_section(fixtures::section("1", "Music")).await;
    plex.add_section(fixtures::section("2", "Vinyl")).await;

    let discovery = fixtures::remote_album("100", "Discovery", "10", "Daft Punk");
    let discovery_tracks = vec![
        fixtures::remote_track("101", "One More Time", "100", "Discovery", "10", "Daft Punk"),
        fixtures::remote_track("102", "Aerodynamic", "100", "Discovery", "10", "Daft Punk"),
        fixtures::remote_track("103", "Digital Love", "100", "Discovery", "10", "Daft Punk"),
    ];
    plex.add_discography(
        "1",
        fixtures::remote_artist("10", "Daft Punk"),
        vec![(discovery, discovery_tracks)],
    )
    .await;

    let moon_safari = fixtures::remote_album("300", "Moon Safari", "30", "Air");
    let moon_safari_tracks = fixtures::album_tracks(&moon_safari, 2);
    plex.add_discography(
        "1",
        fixtures::remote_artist("30", "Air"),
        vec![(moon_safari, moon_safari_tracks)],
    )
    .await;

    let homework = fixtures::remote_album("200", "Homework", "20", "Daft Punk");
    let homework_tracks = fixtures::album_tracks(&homework, 1);
    plex.add_discography(
        "2",
        fixtures::remote_artist("20", "Daft Punk"),
        vec![(homework, homework_tracks)],
    )
    .await;

    plex
}
