//! Raw per-game statistics document.
//!
//! Mirrors the detailed stats JSON produced by the game server and relayed
//! by the statistics service. Every field is optional on the wire: bots,
//! observers and older server builds routinely omit whole sections, so a
//! missing (or `null`) field always deserializes to zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Detailed statistics for one game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsBlob {
    #[serde(default, deserialize_with = "null_as_default")]
    pub map: String,

    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub mode: Option<String>,

    /// Game length in seconds
    #[serde(default)]
    pub duration: Option<u32>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub teams: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub players: Vec<RawPlayer>,
}

impl StatsBlob {
    /// Players that actually took part in the game.
    ///
    /// A ping of zero marks a placeholder slot (disconnected client,
    /// spectator, server-side bot) and the whole record is skipped.
    pub fn participants(&self) -> impl Iterator<Item = &RawPlayer> {
        self.players.iter().filter(|p| p.ping != 0)
    }

    /// Participants playing for `team` (case-insensitive tag match).
    pub fn participants_for<'a>(&'a self, team: &'a str) -> impl Iterator<Item = &'a RawPlayer> {
        self.participants()
            .filter(move |p| p.team.trim().eq_ignore_ascii_case(team.trim()))
    }
}

/// One player's raw record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPlayer {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub team: String,

    /// Connection quality; zero means non-participant
    #[serde(default, deserialize_with = "null_as_default")]
    pub ping: i32,

    #[serde(default)]
    pub login: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub stats: RawPlayerStats,

    #[serde(default, deserialize_with = "null_as_default")]
    pub dmg: RawDamage,

    #[serde(default, deserialize_with = "null_as_default")]
    pub weapons: BTreeMap<String, RawWeapon>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub items: BTreeMap<String, RawItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPlayerStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub frags: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub deaths: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub kills: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tk: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suicides: u64,
    #[serde(rename = "spawn-frags", default, deserialize_with = "null_as_default")]
    pub spawn_frags: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDamage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub given: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub taken: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team: u64,
    #[serde(rename = "self", default, deserialize_with = "null_as_default")]
    pub self_damage: u64,
    /// Average damage taken per death, when the server reports it
    #[serde(rename = "taken-to-die", default)]
    pub taken_to_die: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawWeapon {
    #[serde(default, deserialize_with = "null_as_default")]
    pub acc: RawAccuracy,
    #[serde(default, deserialize_with = "null_as_default")]
    pub kills: RawWeaponKills,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pickups: RawPickups,
    #[serde(default, deserialize_with = "null_as_default")]
    pub damage: RawWeaponDamage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAccuracy {
    #[serde(default, deserialize_with = "null_as_default")]
    pub attacks: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hits: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawWeaponKills {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub enemy: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPickups {
    #[serde(default, deserialize_with = "null_as_default")]
    pub taken: u64,
    #[serde(rename = "total-taken", default, deserialize_with = "null_as_default")]
    pub total_taken: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dropped: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawWeaponDamage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub enemy: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub took: u64,
    /// Seconds held (powerups only)
    #[serde(default)]
    pub time: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "map": "dm3",
        "mode": "4on4",
        "duration": 1200,
        "teams": ["FOO", "BAR"],
        "players": [
            {
                "name": "alpha", "team": "FOO", "ping": 25,
                "stats": {"frags": 40, "deaths": 20, "kills": 42, "tk": 1, "suicides": 1, "spawn-frags": 3},
                "dmg": {"given": 9000, "taken": 7000, "taken-to-die": 350.0},
                "weapons": {
                    "rl": {"acc": {"attacks": 200, "hits": 80}, "kills": {"total": 30}, "pickups": {"taken": 5, "dropped": 2}},
                    "lg": {"acc": {"attacks": 1000, "hits": 310}}
                },
                "items": {"ra": {"took": 6}, "q": {"took": 1, "time": 30}}
            },
            {
                "name": "spec", "team": "FOO", "ping": 0
            },
            {
                "name": "bravo", "team": "bar", "ping": 38,
                "stats": null,
                "dmg": {"given": null}
            }
        ]
    }"#;

    #[test]
    fn test_blob_parses_partial_players() {
        let blob: StatsBlob = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(blob.players.len(), 3);
        assert_eq!(blob.players[0].weapons["rl"].acc.hits, 80);
        assert_eq!(blob.players[0].dmg.taken_to_die, Some(350.0));
        assert_eq!(blob.players[2].stats, RawPlayerStats::default());
        assert_eq!(blob.players[2].dmg.given, 0);
    }

    #[test]
    fn test_participants_skip_zero_ping() {
        let blob: StatsBlob = serde_json::from_str(SAMPLE).unwrap();
        let names: Vec<_> = blob.participants().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "bravo"]);
    }

    #[test]
    fn test_participants_for_is_case_insensitive() {
        let blob: StatsBlob = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(blob.participants_for("BAR").count(), 1);
        assert_eq!(blob.participants_for("foo").count(), 1);
        assert_eq!(blob.participants_for("BAZ").count(), 0);
    }

    #[test]
    fn test_empty_blob() {
        let blob: StatsBlob = serde_json::from_str("{}").unwrap();
        assert!(blob.players.is_empty());
        assert_eq!(blob.participants().count(), 0);
    }
}
