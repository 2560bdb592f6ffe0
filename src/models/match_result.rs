//! Completed game records as returned by the statistics service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a game from the perspective of `our_tag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    #[serde(alias = "W", alias = "Win")]
    Win,
    #[serde(alias = "L", alias = "Loss")]
    Loss,
    #[serde(alias = "D", alias = "Draw")]
    Draw,
}

impl Outcome {
    /// Derive the outcome from the two scores.
    pub fn from_scores(ours: i32, theirs: i32) -> Self {
        match ours.cmp(&theirs) {
            std::cmp::Ordering::Greater => Outcome::Win,
            std::cmp::Ordering::Less => Outcome::Loss,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    /// Sort ordinal: Win=2, Draw=1, Loss=0.
    pub fn ordinal(self) -> u8 {
        match self {
            Outcome::Win => 2,
            Outcome::Draw => 1,
            Outcome::Loss => 0,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Win => write!(f, "W"),
            Outcome::Loss => write!(f, "L"),
            Outcome::Draw => write!(f, "D"),
        }
    }
}

/// One completed game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// Opaque identifier
    pub id: String,

    /// Map name (e.g. "dm3")
    pub map: String,

    /// When the game was played
    pub played_at: DateTime<Utc>,

    /// Short tag of the team whose perspective this record takes
    pub our_tag: String,

    /// Short tag of the opposing team
    pub opponent_tag: String,

    pub our_score: i32,
    pub opponent_score: i32,

    pub result: Outcome,

    /// Reference for fetching the detailed stats blob (absent on legacy records)
    #[serde(default)]
    pub stats_ref: Option<String>,
}

impl MatchResult {
    /// Frag difference from our perspective.
    pub fn frag_diff(&self) -> i32 {
        self.our_score - self.opponent_score
    }
}

/// Head-to-head response: games between exactly two teams.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadToHead {
    #[serde(default)]
    pub team_a: String,
    #[serde(default)]
    pub team_b: String,
    #[serde(default)]
    pub games: Vec<MatchResult>,
}

/// Recent-form response for one team.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormGames {
    #[serde(default)]
    pub games: Vec<MatchResult>,
}
