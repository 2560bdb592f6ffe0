use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::api::ApiError;
use crate::directory::TeamDirectory;
use crate::session::{ComparisonSession, SessionSettings};
use crate::source::StatsSource;

/// Open sessions, keyed by id. Each is independent of the others.
pub type SessionMap = Arc<tokio::sync::RwLock<HashMap<Uuid, ComparisonSession>>>;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn StatsSource>,
    pub directory: Arc<dyn TeamDirectory>,
    pub settings: SessionSettings,
    pub sessions: SessionMap,
}

impl AppState {
    pub fn new(source: Arc<dyn StatsSource>, directory: Arc<dyn TeamDirectory>, settings: SessionSettings) -> Self {
        Self {
            source,
            directory,
            settings,
            sessions: Arc::new(tokio::sync::RwLock::new(HashMap::new())),
        }
    }

    /// Look up a session by its id string.
    pub async fn session(&self, id: &str) -> Result<(Uuid, ComparisonSession), ApiError> {
        let id = Uuid::parse_str(id).map_err(|_| ApiError::BadRequest(format!("Invalid session id: {}", id)))?;
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .map(|s| (id, s))
            .ok_or_else(|| ApiError::NotFound(format!("Session {}", id)))
    }
}
