//! Session API handlers
//!
//! POST /sessions, GET /sessions/:id, GET /users/:user_id/sessions,
//! POST /sessions/:id/{actions,search,select,customize,generate,finalize,abandon},
//! GET /sessions/:id/analytics

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extraction::CharacterDraft;
use crate::search::SearchOutcome;
use crate::session::{DraftModifications, Session, SessionAnalytics};
use crate::types::SearchOptions;
use crate::AppState;

const DEFAULT_LIST_LIMIT: usize = 10;

/// POST /sessions request
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: String,
}

/// GET /users/:user_id/sessions query
#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// POST /sessions/:id/search request
#[derive(Debug, Deserialize)]
pub struct SessionSearchRequest {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// POST /sessions/:id/select request
#[derive(Debug, Deserialize)]
pub struct SelectResultRequest {
    /// Id of a result from the session's last search
    pub result_id: String,
}

/// POST /sessions/:id/finalize request
///
/// Without a draft the session's working draft is finalized.
#[derive(Debug, Default, Deserialize)]
pub struct FinalizeRequest {
    #[serde(default)]
    pub draft: Option<CharacterDraft>,
    #[serde(default)]
    pub character_id: Option<String>,
}

/// POST /sessions
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    if request.user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("user_id is required".to_string()));
    }

    let session = state.orchestrator.start_session(&request.user_id).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.orchestrator.session(session_id).await?))
}

/// GET /users/:user_id/sessions
pub async fn list_user_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ListSessionsQuery>,
) -> ApiResult<Json<Vec<Session>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    Ok(Json(state.orchestrator.user_sessions(&user_id, limit).await?))
}

/// POST /sessions/:id/actions
///
/// Body is a raw `{"type": ..., "data": ...}` action.
pub async fn post_action(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(action): Json<serde_json::Value>,
) -> ApiResult<Json<Session>> {
    Ok(Json(
        state.orchestrator.progress_json(session_id, action).await?,
    ))
}

/// POST /sessions/:id/search
pub async fn search_in_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SessionSearchRequest>,
) -> ApiResult<Json<SearchOutcome>> {
    if request.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query is required".to_string()));
    }

    let options = SearchOptions {
        limit: request.limit,
        page: None,
    };
    let outcome = state
        .orchestrator
        .perform_search(session_id, &request.query, &options)
        .await?;
    Ok(Json(outcome))
}

/// POST /sessions/:id/select
pub async fn select_result(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SelectResultRequest>,
) -> ApiResult<Json<CharacterDraft>> {
    let draft = state
        .orchestrator
        .select_search_result_by_id(session_id, &request.result_id)
        .await?;
    Ok(Json(draft))
}

/// POST /sessions/:id/customize
///
/// Applies the modifications to the session's working draft.
pub async fn customize(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(modifications): Json<DraftModifications>,
) -> ApiResult<Json<CharacterDraft>> {
    let session = state.orchestrator.session(session_id).await?;
    let draft = session.working_draft().unwrap_or_default();

    let updated = state
        .orchestrator
        .apply_customizations(session_id, draft, modifications)
        .await?;
    Ok(Json(updated))
}

/// POST /sessions/:id/generate
pub async fn generate(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<CharacterDraft>> {
    Ok(Json(state.orchestrator.generate_character(session_id).await?))
}

/// POST /sessions/:id/finalize
pub async fn finalize(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<FinalizeRequest>,
) -> ApiResult<Json<Session>> {
    let draft = match request.draft {
        Some(draft) => draft,
        None => state
            .orchestrator
            .session(session_id)
            .await?
            .working_draft()
            .ok_or_else(|| ApiError::BadRequest("session has no draft to finalize".to_string()))?,
    };

    let session = state
        .orchestrator
        .finalize(session_id, &draft, request.character_id)
        .await?;
    Ok(Json(session))
}

/// POST /sessions/:id/abandon
pub async fn abandon(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.orchestrator.abandon(session_id).await?))
}

/// GET /sessions/:id/analytics
pub async fn analytics(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionAnalytics>> {
    Ok(Json(
        state.orchestrator.session_analytics(session_id).await?,
    ))
}

/// Build session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:session_id", get(get_session))
        .route("/users/:user_id/sessions", get(list_user_sessions))
        .route("/sessions/:session_id/actions", post(post_action))
        .route("/sessions/:session_id/search", post(search_in_session))
        .route("/sessions/:session_id/select", post(select_result))
        .route("/sessions/:session_id/customize", post(customize))
        .route("/sessions/:session_id/generate", post(generate))
        .route("/sessions/:session_id/finalize", post(finalize))
        .route("/sessions/:session_id/abandon", post(abandon))
        .route("/sessions/:session_id/analytics", get(analytics))
}
