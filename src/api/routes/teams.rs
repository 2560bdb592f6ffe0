use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::models::TeamInfo;

#[derive(Debug, Serialize)]
pub struct TeamListResponse {
    pub teams: Vec<TeamInfo>,
}

pub async fn list_teams(State(state): State<AppState>) -> Json<TeamListResponse> {
    Json(TeamListResponse {
        teams: state.directory.all(),
    })
}
