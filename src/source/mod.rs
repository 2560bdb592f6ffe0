//! Read-only statistics data sources.
//!
//! `StatsSource` is the contract the engine consumes. The production
//! implementation is `fetch::HubClient`; `MockSource` is a scripted
//! in-memory double for tests and offline demos.

mod mock;

pub use mock::MockSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::fetch::FetchError;
use crate::models::{FormGames, HeadToHead, MapsResponse, MatchResult, Roster, StatsBlob};

/// Lookback and size bounds for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub months: u32,
    pub limit: Option<u32>,
}

/// Trait for statistics services.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &'static str;

    /// All of a team's results over the last `months`.
    async fn match_history(&self, team: &str, months: u32) -> Result<Vec<MatchResult>, FetchError>;

    /// Games between exactly these two teams, from `team_a`'s perspective.
    async fn head_to_head(
        &self,
        team_a: &str,
        team_b: &str,
        query: ListQuery,
    ) -> Result<HeadToHead, FetchError>;

    /// A team's most recent games regardless of opponent.
    async fn form(&self, team: &str, query: ListQuery) -> Result<FormGames, FetchError>;

    /// A team's per-map record.
    async fn maps(&self, team: &str, months: u32) -> Result<MapsResponse, FetchError>;

    /// Players who appeared for a team, with game counts.
    async fn roster(&self, team: &str, months: u32) -> Result<Roster, FetchError>;

    /// Detailed per-player stats for one game.
    async fn game_stats(&self, stats_ref: &str) -> Result<StatsBlob, FetchError>;
}
