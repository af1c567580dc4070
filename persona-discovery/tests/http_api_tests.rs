//! HTTP API integration tests

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use helpers::{memory_store, naruto_candidate, orchestrator, ScriptedGeneration, StubAdapter};
use http_body_util::BodyExt;
use persona_discovery::types::GenreId;
use persona_discovery::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

fn test_app() -> Router {
    let anilist = StubAdapter::new("anilist", &[GenreId::Roleplay])
        .returning_results(vec![naruto_candidate("anilist")])
        .into_arc();
    let (orchestrator, events) = orchestrator(
        GenreId::Roleplay,
        vec![anilist],
        Arc::new(ScriptedGeneration::new()),
        memory_store(),
    );
    build_router(AppState::new(Arc::new(orchestrator), events))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_session(app: &Router) -> String {
    let (status, body) = send(app, "POST", "/sessions", Some(json!({"user_id": "user-1"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "persona-discovery");
    assert_eq!(body["sources"], 1);
}

#[tokio::test]
async fn test_create_session() {
    let app = test_app();
    let (status, body) = send(&app, "POST", "/sessions", Some(json!({"user_id": "user-1"}))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_id"], "user-1");
    assert_eq!(body["current_step"], "type");

    let (status, _) = send(&app, "POST", "/sessions", Some(json!({"user_id": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_session_is_404() {
    let app = test_app();
    let uri = format!("/sessions/{}", Uuid::new_v4());
    let (status, body) = send(&app, "GET", &uri, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn test_unknown_action_is_400() {
    let app = test_app();
    let id = create_session(&app).await;
    let uri = format!("/sessions/{}/actions", id);

    let (status, body) = send(&app, "POST", &uri, Some(json!({"type": "teleport", "data": {}}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "UNKNOWN_ACTION");

    let (status, body) = send(&app, "POST", &uri, Some(json!({"data": {}}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MALFORMED_ACTION");
}

#[tokio::test]
async fn test_session_search_requires_genre() {
    let app = test_app();
    let id = create_session(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/sessions/{}/search", id),
        Some(json!({"query": "Naruto"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "GENRE_NOT_SELECTED");
}

#[tokio::test]
async fn test_session_flow_over_http() {
    let app = test_app();
    let id = create_session(&app).await;
    let actions = format!("/sessions/{}/actions", id);

    let (status, body) = send(
        &app,
        "POST",
        &actions,
        Some(json!({"type": "select_genre", "data": {"genre": "roleplay"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected_genre"], "roleplay");

    let (status, body) = send(
        &app,
        "POST",
        &actions,
        Some(json!({"type": "select_type", "data": {"type": "existing"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_step"], "search");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/sessions/{}/search", id),
        Some(json!({"query": "Naruto"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], false);
    let result_id = body["results"][0]["id"].as_str().unwrap().to_string();

    let (status, draft) = send(
        &app,
        "POST",
        &format!("/sessions/{}/select", id),
        Some(json!({"result_id": result_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["name"], "Naruto Uzumaki");

    let (status, draft) = send(
        &app,
        "POST",
        &format!("/sessions/{}/customize", id),
        Some(json!({"occupation": "Hokage"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["occupation"], "Hokage");

    let (status, session) = send(
        &app,
        "POST",
        &format!("/sessions/{}/finalize", id),
        Some(json!({"character_id": "char-42"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["result_character_id"], "char-42");
    assert!(session["completed_at"].is_string());

    let (status, body) = send(&app, "POST", &format!("/sessions/{}/abandon", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "SESSION_FINISHED");

    let (status, analytics) =
        send(&app, "GET", &format!("/sessions/{}/analytics", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(analytics["completed"], true);
    assert_eq!(analytics["interaction_count"], 6);

    let (status, sessions) = send(&app, "GET", "/users/user-1/sessions?limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sessions.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_finalize_without_draft_is_400() {
    let app = test_app();
    let id = create_session(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/sessions/{}/finalize", id),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_finalize_invalid_draft_is_422() {
    let app = test_app();
    let id = create_session(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/sessions/{}/finalize", id),
        Some(json!({"draft": {"name": "<>"}})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_stateless_search_and_sources() {
    let app = test_app();

    let (status, body) = send(&app, "GET", "/search?query=Naruto&genre=roleplay", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        "GET",
        "/search?query=Naruto&genre=roleplay&mode=aggregated&limit=3",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], false);

    let (status, _) = send(&app, "GET", "/search?query=%20&genre=roleplay", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, sources) = send(&app, "GET", "/sources", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sources[0]["source_id"], "anilist");
    assert_eq!(sources[0]["supported_genres"], json!(["roleplay"]));

    let (status, statuses) = send(&app, "GET", "/sources/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(statuses["anilist"], true);

    let (status, body) = send(&app, "GET", "/sources/nowhere/details/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "UNKNOWN_SOURCE");
}

#[tokio::test]
async fn test_genre_catalogue() {
    let app = test_app();

    let (status, genres) = send(&app, "GET", "/genres", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(genres.as_array().unwrap().len(), 6);

    let (status, roleplay) = send(&app, "GET", "/genres/roleplay", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roleplay["name"], "Roleplay Partner");
    assert_eq!(roleplay["subgenres"][0]["id"], "fantasy-adventure");

    let id = create_session(&app).await;
    let (status, body) = send(
        &app,
        "POST",
        &format!("/sessions/{}/actions", id),
        Some(json!({"type": "select_genre", "data": {"genre": "roleplay", "archetype": "gentle-soul"}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MALFORMED_ACTION");
}
