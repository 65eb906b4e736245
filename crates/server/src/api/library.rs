//! Library API handlers.
//!
//! Browse and lookup never fail: unknown URIs and remote errors come back
//! as empty lists. Only malformed request bodies are rejected.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use plexdex_core::{Image, IndexStats, PlexLibrary, Ref, SearchQuery, SearchResult, Track};

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UriParams {
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: SearchQuery,
    /// URI roots to limit the search to.
    #[serde(default)]
    pub uris: Option<Vec<String>>,
    #[serde(default)]
    pub exact: bool,
}

#[derive(Debug, Deserialize)]
pub struct ImagesRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(rejection: JsonRejection) -> ApiError {
    (
        rejection.status(),
        Json(ErrorResponse {
            error: rejection.body_text(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/library/root
pub async fn root() -> Json<Ref> {
    Json(PlexLibrary::root_directory())
}

/// GET /api/v1/library/browse?uri=plex:artist
pub async fn browse(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UriParams>,
) -> Json<Vec<Ref>> {
    Json(state.library().browse(&params.uri).await)
}

/// GET /api/v1/library/lookup?uri=plex:album:123
pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UriParams>,
) -> Json<Vec<Track>> {
    Json(state.library().lookup(&params.uri).await)
}

/// POST /api/v1/library/search
pub async fn search(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResult>, ApiError> {
    let Json(request) = payload.map_err(bad_request)?;
    let result = state
        .library()
        .search(&request.query, request.uris.as_deref(), request.exact)
        .await;
    Ok(Json(result))
}

/// POST /api/v1/library/images
pub async fn get_images(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ImagesRequest>, JsonRejection>,
) -> Result<Json<HashMap<String, Vec<Image>>>, ApiError> {
    let Json(request) = payload.map_err(bad_request)?;
    Ok(Json(state.library().get_images(&request.uris)))
}

/// GET /api/v1/library/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<IndexStats> {
    Json(state.library().index_stats())
}
