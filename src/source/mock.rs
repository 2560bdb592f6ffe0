//! Scripted in-memory statistics source.
//!
//! Call keys have the form `history:TAG`, `h2h:A:B`, `form:TAG`,
//! `maps:TAG`, `roster:TAG` and `game:REF`. Any key can be made to fail
//! (`fail`) or to block until released (`hold` / `release`), which is how
//! tests force a particular completion order.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Semaphore;

use super::{ListQuery, StatsSource};
use crate::fetch::FetchError;
use crate::models::{
    FormGames, HeadToHead, MapStat, MapsResponse, MatchResult, Outcome, RawAccuracy, RawDamage,
    RawItem, RawPlayer, RawPlayerStats, RawWeapon, Roster, RosterEntry, StatsBlob,
};

#[derive(Default)]
struct MockState {
    history: HashMap<String, Vec<MatchResult>>,
    h2h: HashMap<(String, String), Vec<MatchResult>>,
    form: HashMap<String, Vec<MatchResult>>,
    maps: HashMap<String, Vec<MapStat>>,
    rosters: HashMap<String, Vec<RosterEntry>>,
    games: HashMap<String, StatsBlob>,
    failing: HashSet<String>,
    gates: HashMap<String, Arc<Semaphore>>,
    calls: HashMap<String, usize>,
    log: Vec<String>,
}

/// Scripted `StatsSource` with call counting and failure injection.
#[derive(Default)]
pub struct MockSource {
    state: Mutex<MockState>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_history(self, team: &str, games: Vec<MatchResult>) -> Self {
        self.lock().history.insert(team.to_string(), games);
        self
    }

    pub fn with_head_to_head(self, team_a: &str, team_b: &str, games: Vec<MatchResult>) -> Self {
        self.lock()
            .h2h
            .insert((team_a.to_string(), team_b.to_string()), games);
        self
    }

    pub fn with_form(self, team: &str, games: Vec<MatchResult>) -> Self {
        self.lock().form.insert(team.to_string(), games);
        self
    }

    pub fn with_maps(self, team: &str, maps: Vec<MapStat>) -> Self {
        self.lock().maps.insert(team.to_string(), maps);
        self
    }

    pub fn with_roster(self, team: &str, players: Vec<RosterEntry>) -> Self {
        self.lock().rosters.insert(team.to_string(), players);
        self
    }

    pub fn with_game(self, stats_ref: &str, blob: StatsBlob) -> Self {
        self.lock().games.insert(stats_ref.to_string(), blob);
        self
    }

    /// Make every call on `key` fail until `recover` is called.
    pub fn fail(&self, key: &str) {
        self.lock().failing.insert(key.to_string());
    }

    pub fn recover(&self, key: &str) {
        self.lock().failing.remove(key);
    }

    /// Block calls on `key` until `release`.
    pub fn hold(&self, key: &str) {
        self.lock()
            .gates
            .insert(key.to_string(), Arc::new(Semaphore::new(0)));
    }

    /// Let every call blocked on `key` through.
    pub fn release(&self, key: &str) {
        if let Some(gate) = self.lock().gates.remove(key) {
            gate.close();
        }
    }

    /// Number of calls made on `key`.
    pub fn calls(&self, key: &str) -> usize {
        self.lock().calls.get(key).copied().unwrap_or(0)
    }

    /// Every call in order, with its lookback (e.g. `form:FOO?months=3`).
    pub fn log(&self) -> Vec<String> {
        self.lock().log.clone()
    }

    async fn enter(&self, key: &str, months: Option<u32>) -> Result<(), FetchError> {
        let gate = {
            let mut state = self.lock();
            *state.calls.entry(key.to_string()).or_default() += 1;
            state.log.push(match months {
                Some(m) => format!("{}?months={}", key, m),
                None => key.to_string(),
            });
            state.gates.get(key).cloned()
        };

        if let Some(gate) = gate {
            // Closed on release; no permit is ever handed out.
            let _ = gate.acquire().await;
        }

        if self.lock().failing.contains(key) {
            return Err(FetchError::HttpStatus {
                status: 503,
                message: format!("mock failure for {}", key),
            });
        }
        Ok(())
    }

    /// A small FOO vs BAR data set, dated relative to now.
    pub fn demo() -> Self {
        let now = Utc::now();
        let game = |id: &str, map: &str, us: &str, them: &str, ours: i32, theirs: i32, days_ago: i64| {
            MatchResult {
                id: id.to_string(),
                map: map.to_string(),
                played_at: now - Duration::days(days_ago),
                our_tag: us.to_string(),
                opponent_tag: them.to_string(),
                our_score: ours,
                opponent_score: theirs,
                result: Outcome::from_scores(ours, theirs),
                stats_ref: Some(format!("demo-{}", id)),
            }
        };
        let map = |name: &str, games: u32, wins: u32, diff: f64| MapStat {
            map: name.to_string(),
            games,
            wins,
            losses: games - wins,
            win_rate: crate::calculate::rate(wins as u64, games as u64),
            avg_frag_diff: diff,
        };

        let h2h = vec![
            game("h1", "dm3", "FOO", "BAR", 20, 15, 10),
            game("h2", "e1m2", "FOO", "BAR", 10, 18, 24),
        ];
        let foo_form = vec![
            game("h1", "dm3", "FOO", "BAR", 20, 15, 10),
            game("f1", "dm2", "FOO", "QUX", 41, 12, 13),
            game("f2", "dm3", "FOO", "ZAP", 33, 35, 20),
            game("h2", "e1m2", "FOO", "BAR", 10, 18, 24),
        ];
        let bar_form = vec![
            game("b1", "e1m2", "BAR", "QUX", 28, 20, 3),
            game("h1r", "dm3", "BAR", "FOO", 15, 20, 10),
            game("b2", "dm2", "BAR", "ZAP", 25, 25, 17),
        ];

        let mut source = MockSource::new()
            .with_history("FOO", foo_form.clone())
            .with_head_to_head("FOO", "BAR", h2h)
            .with_form("FOO", foo_form)
            .with_form("BAR", bar_form.clone())
            .with_history("BAR", bar_form)
            .with_maps(
                "FOO",
                vec![map("dm3", 14, 9, 12.5), map("dm2", 8, 6, 20.0), map("e1m2", 5, 1, -9.0)],
            )
            .with_maps(
                "BAR",
                vec![map("dm3", 11, 7, 6.0), map("e1m2", 9, 7, 15.0), map("aerowalk", 2, 0, -30.0)],
            )
            .with_roster(
                "FOO",
                vec![
                    RosterEntry { player: "alpha".into(), games: 14 },
                    RosterEntry { player: "bravo".into(), games: 12 },
                ],
            )
            .with_roster(
                "BAR",
                vec![
                    RosterEntry { player: "xray".into(), games: 11 },
                    RosterEntry { player: "yankee".into(), games: 9 },
                ],
            );

        for (id, map_name, foo_scale, bar_scale) in [
            ("h1", "dm3", 2u64, 1u64),
            ("h2", "e1m2", 1, 2),
            ("f1", "dm2", 3, 1),
            ("f2", "dm3", 1, 1),
            ("h1r", "dm3", 2, 1),
        ] {
            source = source.with_game(
                &format!("demo-{}", id),
                demo_blob(map_name, foo_scale, bar_scale),
            );
        }
        source
    }
}

fn demo_player(name: &str, team: &str, scale: u64) -> RawPlayer {
    let mut weapons = std::collections::BTreeMap::new();
    weapons.insert(
        "rl".to_string(),
        RawWeapon {
            acc: RawAccuracy {
                attacks: 60 * scale,
                hits: 25 * scale,
            },
            ..Default::default()
        },
    );
    weapons.insert(
        "lg".to_string(),
        RawWeapon {
            acc: RawAccuracy {
                attacks: 400,
                hits: 100 + 20 * scale,
            },
            ..Default::default()
        },
    );
    let mut items = std::collections::BTreeMap::new();
    items.insert("ra".to_string(), RawItem { took: 2 * scale, time: None });
    items.insert("ya".to_string(), RawItem { took: 3, time: None });
    items.insert("mh".to_string(), RawItem { took: scale, time: None });

    RawPlayer {
        name: name.to_string(),
        team: team.to_string(),
        ping: 24,
        login: None,
        stats: RawPlayerStats {
            frags: 8 * scale as i64,
            deaths: 10,
            kills: 9 * scale,
            tk: 0,
            suicides: 1,
            spawn_frags: scale,
        },
        dmg: RawDamage {
            given: 4000 * scale,
            taken: 5000,
            team: 120,
            self_damage: 200,
            taken_to_die: None,
        },
        weapons,
        items,
    }
}

fn demo_blob(map: &str, foo_scale: u64, bar_scale: u64) -> StatsBlob {
    StatsBlob {
        map: map.to_string(),
        date: None,
        mode: Some("2on2".to_string()),
        duration: Some(600),
        teams: vec!["FOO".to_string(), "BAR".to_string()],
        players: vec![
            demo_player("alpha", "FOO", foo_scale),
            demo_player("bravo", "FOO", 1),
            demo_player("xray", "BAR", bar_scale),
            demo_player("yankee", "BAR", 1),
            RawPlayer {
                name: "[observer]".to_string(),
                team: "FOO".to_string(),
                ping: 0,
                ..Default::default()
            },
        ],
    }
}

/// The same game seen from the other side.
fn mirror(result: &MatchResult) -> MatchResult {
    MatchResult {
        our_tag: result.opponent_tag.clone(),
        opponent_tag: result.our_tag.clone(),
        our_score: result.opponent_score,
        opponent_score: result.our_score,
        result: Outcome::from_scores(result.opponent_score, result.our_score),
        ..result.clone()
    }
}

#[async_trait]
impl StatsSource for MockSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn match_history(&self, team: &str, months: u32) -> Result<Vec<MatchResult>, FetchError> {
        self.enter(&format!("history:{}", team), Some(months)).await?;
        Ok(self.lock().history.get(team).cloned().unwrap_or_default())
    }

    async fn head_to_head(
        &self,
        team_a: &str,
        team_b: &str,
        query: ListQuery,
    ) -> Result<HeadToHead, FetchError> {
        self.enter(&format!("h2h:{}:{}", team_a, team_b), Some(query.months))
            .await?;
        let state = self.lock();
        let games = if let Some(games) = state.h2h.get(&(team_a.to_string(), team_b.to_string())) {
            games.clone()
        } else if let Some(games) = state.h2h.get(&(team_b.to_string(), team_a.to_string())) {
            games.iter().map(mirror).collect()
        } else {
            Vec::new()
        };
        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(HeadToHead {
            team_a: team_a.to_string(),
            team_b: team_b.to_string(),
            games: games.into_iter().take(limit).collect(),
        })
    }

    async fn form(&self, team: &str, query: ListQuery) -> Result<FormGames, FetchError> {
        self.enter(&format!("form:{}", team), Some(query.months)).await?;
        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        let games = self
            .lock()
            .form
            .get(team)
            .map(|g| g.iter().take(limit).cloned().collect())
            .unwrap_or_default();
        Ok(FormGames { games })
    }

    async fn maps(&self, team: &str, months: u32) -> Result<MapsResponse, FetchError> {
        self.enter(&format!("maps:{}", team), Some(months)).await?;
        Ok(MapsResponse {
            maps: self.lock().maps.get(team).cloned().unwrap_or_default(),
        })
    }

    async fn roster(&self, team: &str, months: u32) -> Result<Roster, FetchError> {
        self.enter(&format!("roster:{}", team), Some(months)).await?;
        Ok(Roster {
            players: self.lock().rosters.get(team).cloned().unwrap_or_default(),
        })
    }

    async fn game_stats(&self, stats_ref: &str) -> Result<StatsBlob, FetchError> {
        self.enter(&format!("game:{}", stats_ref), None).await?;
        self.lock()
            .games
            .get(stats_ref)
            .cloned()
            .ok_or_else(|| FetchError::HttpStatus {
                status: 404,
                message: format!("no stats for {}", stats_ref),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_counts_and_logs_calls() {
        let source = MockSource::demo();
        source.form("FOO", ListQuery { months: 3, limit: Some(2) }).await.unwrap();
        source.form("FOO", ListQuery { months: 6, limit: None }).await.unwrap();

        assert_eq!(source.calls("form:FOO"), 2);
        assert_eq!(source.calls("form:BAR"), 0);
        assert_eq!(source.log(), vec!["form:FOO?months=3", "form:FOO?months=6"]);
    }

    #[tokio::test]
    async fn test_mock_limit_applies() {
        let source = MockSource::demo();
        let form = source.form("FOO", ListQuery { months: 3, limit: Some(2) }).await.unwrap();
        assert_eq!(form.games.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let source = MockSource::demo();
        source.fail("maps:BAR");
        assert!(source.maps("BAR", 3).await.is_err());
        assert!(source.maps("FOO", 3).await.is_ok());

        source.recover("maps:BAR");
        assert_eq!(source.maps("BAR", 3).await.unwrap().maps.len(), 3);
    }

    #[tokio::test]
    async fn test_mock_head_to_head_mirrors_reverse_pairing() {
        let source = MockSource::demo();
        let h2h = source
            .head_to_head("BAR", "FOO", ListQuery { months: 3, limit: None })
            .await
            .unwrap();
        assert_eq!(h2h.games.len(), 2);
        assert!(h2h.games.iter().all(|g| g.our_tag == "BAR"));
        assert_eq!(h2h.games[0].result, Outcome::Loss);
        assert_eq!(h2h.games[0].our_score, 15);
    }

    #[tokio::test]
    async fn test_mock_unknown_game_is_not_found() {
        let source = MockSource::new();
        match source.game_stats("missing").await {
            Err(FetchError::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected 404, got {:?}", other.map(|b| b.map)),
        }
    }

    #[tokio::test]
    async fn test_mock_hold_and_release() {
        let source = Arc::new(MockSource::demo());
        source.hold("maps:FOO");

        let handle = {
            let source = source.clone();
            tokio::spawn(async move { source.maps("FOO", 3).await })
        };
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());

        source.release("maps:FOO");
        let maps = handle.await.unwrap().unwrap();
        assert_eq!(maps.maps.len(), 3);
    }
}
