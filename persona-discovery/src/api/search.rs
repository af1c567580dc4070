//! Stateless search API
//!
//! GET /search, GET /sources, GET /sources/status,
//! GET /sources/:source_id/details/:external_id

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ApiError, ApiResult};
use crate::search::SearchOutcome;
use crate::types::{GenreId, SearchOptions, SearchResult};
use crate::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// First source with results wins
    #[default]
    Sequential,
    /// All sources concurrently, merged and re-ranked
    Aggregated,
}

/// GET /search query
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub genre: GenreId,
    #[serde(default)]
    pub mode: SearchMode,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /sources response entry
#[derive(Debug, Serialize)]
pub struct SourceInfo {
    pub source_id: String,
    pub supported_genres: Vec<GenreId>,
}

/// GET /search
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<SearchOutcome>> {
    if params.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query is required".to_string()));
    }

    let router = state.orchestrator.router();
    let options = SearchOptions {
        limit: params.limit,
        page: None,
    };
    let outcome = match params.mode {
        SearchMode::Sequential => router.search(&params.query, params.genre, &options).await,
        SearchMode::Aggregated => SearchOutcome {
            results: router
                .search_aggregated(&params.query, params.genre, &options)
                .await,
            cached: false,
        },
    };
    Ok(Json(outcome))
}

/// GET /sources
pub async fn list_sources(State(state): State<AppState>) -> Json<Vec<SourceInfo>> {
    let router = state.orchestrator.router();
    let sources = router
        .source_ids()
        .into_iter()
        .filter_map(|id| router.source(&id))
        .map(|adapter| SourceInfo {
            source_id: adapter.source_id().to_string(),
            supported_genres: adapter.supported_genres().to_vec(),
        })
        .collect();
    Json(sources)
}

/// GET /sources/status
pub async fn source_status(State(state): State<AppState>) -> Json<BTreeMap<String, bool>> {
    Json(state.orchestrator.router().test_all_sources().await)
}

/// GET /sources/:source_id/details/:external_id
pub async fn source_details(
    State(state): State<AppState>,
    Path((source_id, external_id)): Path<(String, String)>,
) -> ApiResult<Json<SearchResult>> {
    state
        .orchestrator
        .router()
        .get_details(&source_id, &external_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!("{} has no entity {}", source_id, external_id))
        })
}

/// Build search routes
pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search))
        .route("/sources", get(list_sources))
        .route("/sources/status", get(source_status))
        .route(
            "/sources/:source_id/details/:external_id",
            get(source_details),
        )
}
