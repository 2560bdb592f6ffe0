//! Result list filtering and column sorting.
//!
//! Neither operation mutates its input; both return a fresh list. Sorting is
//! stable, so rows that compare equal keep their input order in either
//! direction.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::MatchResult;

/// Optional exact-match constraints. `None` means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultFilter {
    #[serde(default)]
    pub map: Option<String>,
    #[serde(default)]
    pub opponent: Option<String>,
}

impl ResultFilter {
    pub fn matches(&self, result: &MatchResult) -> bool {
        self.map.as_deref().map_or(true, |m| result.map == m)
            && self
                .opponent
                .as_deref()
                .map_or(true, |o| result.opponent_tag == o)
    }
}

/// Filter results by map and/or opponent.
pub fn filter(results: &[MatchResult], criteria: &ResultFilter) -> Vec<MatchResult> {
    results
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Date,
    Map,
    OurScore,
    OpponentScore,
    Opponent,
    Result,
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "date" => Ok(SortColumn::Date),
            "map" => Ok(SortColumn::Map),
            "our_score" => Ok(SortColumn::OurScore),
            "opponent_score" => Ok(SortColumn::OpponentScore),
            "opponent" | "opponent_tag" => Ok(SortColumn::Opponent),
            "result" => Ok(SortColumn::Result),
            other => Err(format!("unknown sort column: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// The active sort column and direction of a result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: SortColumn::Date,
            direction: SortDirection::Desc,
        }
    }
}

impl SortState {
    /// Apply a header click: the active column toggles direction, a new
    /// column starts descending.
    pub fn click(&mut self, column: SortColumn) {
        if self.column == column {
            self.direction = self.direction.flipped();
        } else {
            self.column = column;
            self.direction = SortDirection::Desc;
        }
    }
}

fn compare(a: &MatchResult, b: &MatchResult, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Date => a.played_at.cmp(&b.played_at),
        SortColumn::Map => a.map.cmp(&b.map),
        SortColumn::OurScore => a.our_score.cmp(&b.our_score),
        SortColumn::OpponentScore => a.opponent_score.cmp(&b.opponent_score),
        SortColumn::Opponent => a.opponent_tag.cmp(&b.opponent_tag),
        SortColumn::Result => a.result.ordinal().cmp(&b.result.ordinal()),
    }
}

/// Stable sort by one column.
pub fn sort(results: &[MatchResult], column: SortColumn, direction: SortDirection) -> Vec<MatchResult> {
    let mut sorted = results.to_vec();
    sorted.sort_by(|a, b| {
        let ord = compare(a, b, column);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    sorted
}

/// Filter then sort, as the results table renders it.
pub fn filter_and_sort(results: &[MatchResult], criteria: &ResultFilter, state: SortState) -> Vec<MatchResult> {
    sort(&filter(results, criteria), state.column, state.direction)
}

/// Distinct map names, for the filter dropdown.
pub fn distinct_maps(results: &[MatchResult]) -> Vec<String> {
    results
        .iter()
        .map(|r| r.map.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct opponent tags, for the filter dropdown.
pub fn distinct_opponents(results: &[MatchResult]) -> Vec<String> {
    results
        .iter()
        .map(|r| r.opponent_tag.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::test_support::result;
    use pretty_assertions::assert_eq;

    fn ids(results: &[MatchResult]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    fn sample() -> Vec<MatchResult> {
        vec![
            result("a", "dm3", "BAR", 20, 15, 3),
            result("b", "e1m2", "BAR", 10, 18, 1),
            result("c", "dm2", "BAZ", 12, 12, 3),
            result("d", "dm3", "QUX", 30, 5, 5),
        ]
    }

    #[test]
    fn test_filter_no_constraint_keeps_all() {
        let all = sample();
        assert_eq!(filter(&all, &ResultFilter::default()), all);
    }

    #[test]
    fn test_filter_by_map_and_opponent() {
        let all = sample();
        let by_map = filter(
            &all,
            &ResultFilter {
                map: Some("dm3".into()),
                opponent: None,
            },
        );
        assert_eq!(ids(&by_map), vec!["a", "d"]);

        let both = filter(
            &all,
            &ResultFilter {
                map: Some("dm3".into()),
                opponent: Some("BAR".into()),
            },
        );
        assert_eq!(ids(&both), vec!["a"]);

        let none = filter(
            &all,
            &ResultFilter {
                map: Some("ztndm3".into()),
                opponent: None,
            },
        );
        assert!(none.is_empty());
    }

    #[test]
    fn test_sort_date_toggle_keeps_ties_in_input_order() {
        let all = sample();
        // a and c share a timestamp
        let desc = sort(&all, SortColumn::Date, SortDirection::Desc);
        assert_eq!(ids(&desc), vec!["d", "a", "c", "b"]);

        let asc = sort(&all, SortColumn::Date, SortDirection::Asc);
        assert_eq!(ids(&asc), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_sort_does_not_mutate_input() {
        let all = sample();
        let before = all.clone();
        let _ = sort(&all, SortColumn::OurScore, SortDirection::Asc);
        assert_eq!(all, before);
    }

    #[test]
    fn test_sort_by_result_ordinal() {
        let sorted = sort(&sample(), SortColumn::Result, SortDirection::Desc);
        assert_eq!(ids(&sorted), vec!["a", "d", "c", "b"]);
    }

    #[test]
    fn test_sort_by_map_and_opponent_lexicographic() {
        let sorted = sort(&sample(), SortColumn::Map, SortDirection::Asc);
        assert_eq!(ids(&sorted), vec!["c", "a", "d", "b"]);

        let sorted = sort(&sample(), SortColumn::Opponent, SortDirection::Asc);
        assert_eq!(ids(&sorted), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_sort_state_click() {
        let mut state = SortState::default();
        assert_eq!(state.direction, SortDirection::Desc);

        state.click(SortColumn::Date);
        assert_eq!(state.direction, SortDirection::Asc);

        state.click(SortColumn::Map);
        assert_eq!(state.column, SortColumn::Map);
        assert_eq!(state.direction, SortDirection::Desc);

        state.click(SortColumn::Map);
        assert_eq!(state.direction, SortDirection::Asc);

        state.click(SortColumn::OurScore);
        assert_eq!(state.direction, SortDirection::Desc);
    }

    #[test]
    fn test_sort_column_from_str() {
        assert_eq!("our-score".parse::<SortColumn>(), Ok(SortColumn::OurScore));
        assert_eq!("opponent_tag".parse::<SortColumn>(), Ok(SortColumn::Opponent));
        assert!("elo".parse::<SortColumn>().is_err());
    }

    #[test]
    fn test_distinct_values() {
        let all = sample();
        assert_eq!(distinct_maps(&all), vec!["dm2", "dm3", "e1m2"]);
        assert_eq!(distinct_opponents(&all), vec!["BAR", "BAZ", "QUX"]);
    }
}
