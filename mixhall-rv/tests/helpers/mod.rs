//! Shared test helpers
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use mixhall_common::db::memory_pool;
use mixhall_common::payload::{CreationKind, CrewMember, SongDraft};
use mixhall_rv::{build_router, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::util::ServiceExt;

/// Fresh in-memory database with the full schema
pub async fn test_pool() -> SqlitePool {
    memory_pool().await.expect("schema init should succeed")
}

/// App with auth disabled (shared_secret = 0)
pub fn test_app(pool: SqlitePool) -> Router {
    build_router(AppState::new(pool, 0))
}

/// App gating reviewer routes on a shared secret
pub fn test_app_with_secret(pool: SqlitePool, secret: i64) -> Router {
    build_router(AppState::new(pool, secret))
}

/// Send a JSON POST carrying the reviewer secret header
pub async fn post_json_as_reviewer(
    app: &Router,
    uri: &str,
    body: Value,
    secret: i64,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-mixhall-secret", secret.to_string())
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// A minimal valid draft
pub fn draft(title: &str) -> SongDraft {
    SongDraft {
        title: title.to_string(),
        subtitle: String::new(),
        description: "integration test".into(),
        lyrics: "la la la".into(),
        audio_url: "https://cdn.example/test.mp3".into(),
        cover_url: "https://cdn.example/test.webp".into(),
        duration_seconds: 184,
        crew: vec![CrewMember {
            role: "composer".into(),
            user_id: Some(7),
            name: Some("Ada".into()),
        }],
        links: vec![],
        creation: CreationKind::Original,
        origin: None,
        tags: vec!["test".into()],
        explicit: false,
    }
}

/// Send a JSON POST through the router
pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Send a GET through the router
pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("request should not fail at the transport level");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be JSON")
    };
    (status, json)
}
