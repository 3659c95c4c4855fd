//! HTTP API handlers for mixhall-rv

pub mod auth;
pub mod health;
pub mod queue;
pub mod review;
pub mod submissions;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mixhall_common::Error;
use serde_json::json;
use tracing::error;

/// Wrapper mapping the domain error taxonomy to HTTP responses
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidPayload(_) | Error::MissingComment => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_)
            | Error::IdentityTaken(_)
            | Error::InvalidReference(_)
            | Error::InvalidState(_) => StatusCode::CONFLICT,
            Error::Contention => StatusCode::SERVICE_UNAVAILABLE,
            Error::Database(_) | Error::Io(_) | Error::Config(_) | Error::Internal(_) => {
                error!("Request failed: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}
