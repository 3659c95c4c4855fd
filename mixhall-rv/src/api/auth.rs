//! Reviewer authentication middleware
//!
//! Role policy is an external concern; this service only distinguishes
//! submitters from reviewers. Reviewer endpoints are gated on a shared
//! secret carried in the `X-Mixhall-Secret` header. A configured secret
//! of 0 disables checking.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::AppState;

const SECRET_HEADER: &str = "x-mixhall-secret";

pub async fn reviewer_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if state.shared_secret == 0 {
        // Auth disabled - pass through without validation
        return Ok(next.run(request).await);
    }

    let provided = request
        .headers()
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or(AuthError::MissingSecret)?;

    if provided != state.shared_secret {
        warn!("Reviewer auth failed: wrong shared secret");
        return Err(AuthError::WrongSecret);
    }

    Ok(next.run(request).await)
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    MissingSecret,
    WrongSecret,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingSecret => "Missing reviewer secret",
            AuthError::WrongSecret => "Invalid reviewer secret",
        };
        let body = Json(json!({ "error": message }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}
