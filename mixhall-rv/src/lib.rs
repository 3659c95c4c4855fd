//! mixhall-rv library - song publishing review service
//!
//! Hosts the review workflow engine (submit/approve/reject), the review
//! queue projection, and their HTTP surface.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod queue;
pub mod workflow;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Shared secret gating reviewer endpoints (0 disables checking)
    pub shared_secret: i64,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, shared_secret: i64) -> Self {
        Self { db, shared_secret }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Reviewer routes (require the shared secret)
    let reviewer = Router::new()
        .route("/api/submissions/:id/approve", post(api::review::approve))
        .route("/api/submissions/:id/reject", post(api::review::reject))
        .route("/api/queue/pending", get(api::queue::pending))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::reviewer_auth,
        ));

    // Submitter-facing routes
    let public = Router::new()
        .route(
            "/api/submissions",
            post(api::submissions::submit).get(api::submissions::list),
        )
        .route("/api/submissions/:id", get(api::submissions::detail))
        .route("/api/queue/history", get(api::queue::history))
        .merge(api::health::health_routes());

    Router::new()
        .merge(reviewer)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
