//! Per-map strength comparison between two teams.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::MapStat;

/// Win rate at or above which a team counts as strong on a map.
const STRONG_WIN_RATE: f64 = 60.0;
/// Win rate below which a team counts as weak on a map.
const WEAK_WIN_RATE: f64 = 40.0;
/// Win-rate gap for "dominates".
const DOMINATES_GAP: f64 = 30.0;
/// Win-rate gap for "favors".
const FAVORS_GAP: f64 = 15.0;

/// One map with both teams' records side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedMapRow {
    pub map: String,
    pub team_a: Option<MapStat>,
    pub team_b: Option<MapStat>,
    pub label: String,
}

impl MergedMapRow {
    pub fn combined_games(&self) -> u32 {
        self.team_a.as_ref().map_or(0, |s| s.games) + self.team_b.as_ref().map_or(0, |s| s.games)
    }
}

/// Qualitative label for one map. Checks run in a fixed priority order.
pub fn classify(a: Option<&MapStat>, b: Option<&MapStat>, tag_a: &str, tag_b: &str) -> String {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        (Some(_), None) => return format!("{} plays, {} doesn't", tag_a, tag_b),
        (None, Some(_)) => return format!("{} plays, {} doesn't", tag_b, tag_a),
        (None, None) => return "Even".to_string(),
    };

    if a.win_rate >= STRONG_WIN_RATE && b.win_rate >= STRONG_WIN_RATE {
        return "Both teams strong".to_string();
    }

    let diff = a.win_rate - b.win_rate;
    if diff >= DOMINATES_GAP {
        return format!("{} dominates", tag_a);
    }
    if diff <= -DOMINATES_GAP {
        return format!("{} dominates", tag_b);
    }
    if diff >= FAVORS_GAP {
        return format!("{} favors", tag_a);
    }
    if diff <= -FAVORS_GAP {
        return format!("{} favors", tag_b);
    }

    if a.win_rate < WEAK_WIN_RATE && b.win_rate < WEAK_WIN_RATE {
        return "Neither team favors".to_string();
    }

    "Even".to_string()
}

/// Full outer join of two teams' map lists, busiest maps first.
///
/// Ties on combined games fall back to map name so the output is fully
/// deterministic.
pub fn merge(maps_a: &[MapStat], maps_b: &[MapStat], tag_a: &str, tag_b: &str) -> Vec<MergedMapRow> {
    let mut joined: BTreeMap<&str, (Option<&MapStat>, Option<&MapStat>)> = BTreeMap::new();

    for stat in maps_a {
        joined.entry(stat.map.as_str()).or_default().0 = Some(stat);
    }
    for stat in maps_b {
        joined.entry(stat.map.as_str()).or_default().1 = Some(stat);
    }

    let mut rows: Vec<MergedMapRow> = joined
        .into_iter()
        .map(|(map, (a, b))| MergedMapRow {
            map: map.to_string(),
            label: classify(a, b, tag_a, tag_b),
            team_a: a.cloned(),
            team_b: b.cloned(),
        })
        .collect();

    // BTreeMap already yields map-name order; the stable sort keeps it for ties.
    rows.sort_by(|x, y| y.combined_games().cmp(&x.combined_games()));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stat(map: &str, games: u32, win_rate: f64) -> MapStat {
        let wins = (games as f64 * win_rate / 100.0).round() as u32;
        MapStat {
            map: map.to_string(),
            games,
            wins,
            losses: games - wins,
            win_rate,
            avg_frag_diff: 0.0,
        }
    }

    #[test]
    fn test_classify_priority_both_strong_before_favors() {
        let a = stat("dm3", 10, 65.0);
        let b = stat("dm3", 10, 62.0);
        assert_eq!(classify(Some(&a), Some(&b), "FOO", "BAR"), "Both teams strong");

        // Even a 30+ gap loses to "both strong"
        let a = stat("dm3", 10, 95.0);
        let b = stat("dm3", 10, 60.0);
        assert_eq!(classify(Some(&a), Some(&b), "FOO", "BAR"), "Both teams strong");
    }

    #[test]
    fn test_classify_dominates_before_both_weak() {
        let a = stat("dm3", 10, 35.0);
        let b = stat("dm3", 10, 0.0);
        assert_eq!(classify(Some(&a), Some(&b), "FOO", "BAR"), "FOO dominates");
        assert_eq!(classify(Some(&b), Some(&a), "FOO", "BAR"), "BAR dominates");
    }

    #[test]
    fn test_classify_favors() {
        let a = stat("dm2", 10, 55.0);
        let b = stat("dm2", 10, 40.0);
        assert_eq!(classify(Some(&a), Some(&b), "FOO", "BAR"), "FOO favors");
        assert_eq!(classify(Some(&b), Some(&a), "FOO", "BAR"), "BAR favors");
    }

    #[test]
    fn test_classify_neither_and_even() {
        let a = stat("e1m2", 10, 30.0);
        let b = stat("e1m2", 10, 25.0);
        assert_eq!(classify(Some(&a), Some(&b), "FOO", "BAR"), "Neither team favors");

        let a = stat("e1m2", 10, 50.0);
        let b = stat("e1m2", 10, 45.0);
        assert_eq!(classify(Some(&a), Some(&b), "FOO", "BAR"), "Even");
    }

    #[test]
    fn test_classify_one_side_missing() {
        let a = stat("dm4", 3, 100.0);
        assert_eq!(classify(Some(&a), None, "FOO", "BAR"), "FOO plays, BAR doesn't");
        assert_eq!(classify(None, Some(&a), "FOO", "BAR"), "BAR plays, FOO doesn't");
    }

    #[test]
    fn test_classify_is_deterministic() {
        let a = stat("dm3", 10, 70.0);
        let b = stat("dm3", 10, 50.0);
        let first = classify(Some(&a), Some(&b), "FOO", "BAR");
        for _ in 0..10 {
            assert_eq!(classify(Some(&a), Some(&b), "FOO", "BAR"), first);
        }
    }

    #[test]
    fn test_merge_is_full_outer_join() {
        let maps_a = vec![stat("dm3", 10, 60.0), stat("dm2", 4, 50.0)];
        let maps_b = vec![stat("dm3", 8, 50.0), stat("e1m2", 6, 33.0)];

        let rows = merge(&maps_a, &maps_b, "FOO", "BAR");
        assert_eq!(rows.len(), 3);

        let dm2 = rows.iter().find(|r| r.map == "dm2").unwrap();
        assert!(dm2.team_a.is_some());
        assert!(dm2.team_b.is_none());
        assert_eq!(dm2.label, "FOO plays, BAR doesn't");

        let e1m2 = rows.iter().find(|r| r.map == "e1m2").unwrap();
        assert!(e1m2.team_a.is_none());
        assert_eq!(e1m2.label, "BAR plays, FOO doesn't");
    }

    #[test]
    fn test_merge_sorted_by_combined_games() {
        let maps_a = vec![stat("dm2", 4, 50.0), stat("dm3", 10, 60.0), stat("aerowalk", 1, 0.0)];
        let maps_b = vec![stat("e1m2", 6, 33.0), stat("dm3", 8, 50.0), stat("aerowalk", 3, 0.0)];

        let rows = merge(&maps_a, &maps_b, "FOO", "BAR");
        let order: Vec<(&str, u32)> = rows
            .iter()
            .map(|r| (r.map.as_str(), r.combined_games()))
            .collect();
        assert_eq!(
            order,
            vec![("dm3", 18), ("e1m2", 6), ("aerowalk", 4), ("dm2", 4)]
        );
    }

    #[test]
    fn test_merge_empty_inputs() {
        assert!(merge(&[], &[], "FOO", "BAR").is_empty());
    }
}
