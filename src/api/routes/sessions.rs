use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::StatCategory;
use crate::session::{Command, ComparisonSession, PanelAggregates, PanelId, SessionInit, SessionView};

#[derive(Debug, Serialize)]
pub struct CreatedSession {
    pub id: Uuid,
    pub view: SessionView,
}

pub async fn create_session(
    State(state): State<AppState>,
    Json(init): Json<SessionInit>,
) -> Result<(StatusCode, Json<CreatedSession>), ApiError> {
    let session = ComparisonSession::open(
        state.source.clone(),
        state.directory.clone(),
        state.settings,
        init,
    )
    .await?;

    let id = Uuid::new_v4();
    let view = session.snapshot().await;
    state.sessions.write().await.insert(id, session);
    info!("Created session {}", id);

    Ok((StatusCode::CREATED, Json(CreatedSession { id, view })))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let (_, session) = state.session(&id).await?;
    Ok(Json(session.snapshot().await))
}

#[derive(Debug, Deserialize)]
pub struct AggregateParams {
    pub panel: String,
    pub category: Option<String>,
}

pub async fn get_aggregates(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<AggregateParams>,
) -> Result<Json<PanelAggregates>, ApiError> {
    let panel: PanelId = params.panel.parse().map_err(ApiError::BadRequest)?;
    let category = match params.category.as_deref() {
        Some(c) => c.parse::<StatCategory>().map_err(ApiError::BadRequest)?,
        None => StatCategory::Performance,
    };

    let (_, session) = state.session(&id).await?;
    Ok(Json(session.aggregates(panel, category).await))
}

pub async fn post_command(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(command): Json<Command>,
) -> Result<Json<SessionView>, ApiError> {
    let (_, session) = state.session(&id).await?;
    session.execute(command).await?;
    Ok(Json(session.snapshot().await))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let (id, _) = state.session(&id).await?;
    state.sessions.write().await.remove(&id);
    info!("Closed session {}", id);
    Ok(StatusCode::NO_CONTENT)
}
