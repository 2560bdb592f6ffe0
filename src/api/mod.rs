//! REST API endpoints.
//!
//! Axum-based HTTP API over comparison sessions: open a session, send it
//! commands, read its view snapshot and per-game aggregates.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::session::SessionError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::UnknownRow { .. } => ApiError::NotFound(e.to_string()),
            SessionError::InvalidPeriod(_) | SessionError::PeriodTooLong { .. } | SessionError::EmptyTeam => {
                ApiError::BadRequest(e.to_string())
            }
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/teams", get(routes::teams::list_teams))
        .route("/api/sessions", post(routes::sessions::create_session))
        .route(
            "/api/sessions/:id",
            get(routes::sessions::get_session).delete(routes::sessions::delete_session),
        )
        .route(
            "/api/sessions/:id/aggregates",
            get(routes::sessions::get_aggregates),
        )
        .route(
            "/api/sessions/:id/commands",
            post(routes::sessions::post_command),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured origin; `*` allows any.
pub fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(AllowOrigin::exact(value)),
        Err(_) => {
            warn!("Ignoring invalid CORS origin: {}", origin);
            layer
        }
    }
}
