//! Read-only team display metadata (name, logo) keyed by tag.

use std::collections::HashMap;

use crate::models::TeamInfo;

/// Source of team display metadata.
pub trait TeamDirectory: Send + Sync {
    fn lookup(&self, tag: &str) -> Option<TeamInfo>;

    /// Every known team, sorted by tag.
    fn all(&self) -> Vec<TeamInfo>;
}

/// Directory backed by a fixed list, usually the `[[teams]]` config entries.
///
/// Tags match case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct StaticTeamDirectory {
    teams: HashMap<String, TeamInfo>,
}

impl StaticTeamDirectory {
    pub fn new(teams: impl IntoIterator<Item = TeamInfo>) -> Self {
        let teams = teams
            .into_iter()
            .map(|t| (t.tag.trim().to_lowercase(), t))
            .collect();
        Self { teams }
    }
}

impl TeamDirectory for StaticTeamDirectory {
    fn lookup(&self, tag: &str) -> Option<TeamInfo> {
        self.teams.get(&tag.trim().to_lowercase()).cloned()
    }

    fn all(&self) -> Vec<TeamInfo> {
        let mut teams: Vec<TeamInfo> = self.teams.values().cloned().collect();
        teams.sort_by(|a, b| a.tag.cmp(&b.tag));
        teams
    }
}
