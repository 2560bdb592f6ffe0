//! Per-team list data: map strength, roster and directory metadata.

use serde::{Deserialize, Serialize};

/// One team's record on one map over the lookback period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapStat {
    pub map: String,
    #[serde(default)]
    pub games: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    /// Win rate in percent (0-100)
    #[serde(default)]
    pub win_rate: f64,
    #[serde(default)]
    pub avg_frag_diff: f64,
}

/// Maps response for one team.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapsResponse {
    #[serde(default)]
    pub maps: Vec<MapStat>,
}

/// A player who appeared for a team, with their game count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player: String,
    #[serde(default)]
    pub games: u32,
}

/// Roster response for one team.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub players: Vec<RosterEntry>,
}

/// Display metadata for a team, from the team directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub tag: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_stat_wire_format() {
        let json = r#"{"map":"dm2","games":12,"wins":8,"losses":4,"winRate":66.7,"avgFragDiff":14.5}"#;
        let stat: MapStat = serde_json::from_str(json).unwrap();
        assert_eq!(stat.games, 12);
        assert!((stat.win_rate - 66.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_map_stat_missing_fields_default_to_zero() {
        let stat: MapStat = serde_json::from_str(r#"{"map":"e1m2"}"#).unwrap();
        assert_eq!(stat.games, 0);
        assert_eq!(stat.win_rate, 0.0);
    }

    #[test]
    fn test_roster_wire_format() {
        let json = r#"{"players":[{"player":"bps","games":14},{"player":"milton"}]}"#;
        let roster: Roster = serde_json::from_str(json).unwrap();
        assert_eq!(roster.players.len(), 2);
        assert_eq!(roster.players[1].games, 0);
    }
}
