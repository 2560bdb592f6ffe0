//! Weekly activity histogram.

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{MatchResult, Outcome};

/// Games played in one calendar week (Monday to Sunday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityBin {
    pub week_start: NaiveDate,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl ActivityBin {
    fn empty(week_start: NaiveDate) -> Self {
        Self {
            week_start,
            games: 0,
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Bucket results into one bin per week, from the week containing
/// `today - period_months` through the week containing `today`.
///
/// Every week in the window gets a bin, including empty ones, so the
/// histogram has a fixed width for a given period. Games dated outside the
/// window (or after `today`) are ignored.
pub fn bucket_weekly(results: &[MatchResult], period_months: u32, today: NaiveDate) -> Vec<ActivityBin> {
    let lookback = today
        .checked_sub_months(Months::new(period_months))
        .unwrap_or_else(|| {
            // Out of calendar range: start at the oldest game instead.
            results
                .iter()
                .map(|r| r.played_at.date_naive())
                .min()
                .unwrap_or(today)
        });
    let first = week_start(lookback);
    let last = week_start(today);
    let weeks = ((last - first).num_days() / 7 + 1) as usize;

    let mut bins: Vec<ActivityBin> = (0..weeks)
        .map(|i| ActivityBin::empty(first + Duration::weeks(i as i64)))
        .collect();

    for r in results {
        let date = r.played_at.date_naive();
        if date < first || date > today {
            continue;
        }
        let idx = ((date - first).num_days() / 7) as usize;
        if let Some(bin) = bins.get_mut(idx) {
            bin.games += 1;
            match r.result {
                Outcome::Win => bin.wins += 1,
                Outcome::Loss => bin.losses += 1,
                Outcome::Draw => bin.draws += 1,
            }
        }
    }

    bins
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::test_support::result;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_start_is_monday() {
        // 2026-03-04 is a Wednesday
        assert_eq!(week_start(date(2026, 3, 4)), date(2026, 3, 2));
        assert_eq!(week_start(date(2026, 3, 2)), date(2026, 3, 2));
        assert_eq!(week_start(date(2026, 3, 8)), date(2026, 3, 2));
    }

    #[test]
    fn test_bins_are_monday_aligned_and_contiguous() {
        let bins = bucket_weekly(&[], 3, date(2026, 3, 20));
        assert!(!bins.is_empty());
        assert!(bins.iter().all(|b| b.week_start.weekday() == Weekday::Mon));
        for pair in bins.windows(2) {
            assert_eq!(pair[1].week_start - pair[0].week_start, Duration::weeks(1));
        }
        assert_eq!(bins.first().unwrap().week_start, week_start(date(2025, 12, 20)));
        assert_eq!(bins.last().unwrap().week_start, date(2026, 3, 16));
    }

    #[test]
    fn test_games_land_in_their_week() {
        let games = vec![
            result("a", "dm3", "BAR", 20, 10, 2),  // Mon
            result("b", "dm3", "BAR", 10, 20, 8),  // Sun, same week
            result("c", "dm2", "BAZ", 10, 10, 9),  // next Mon
        ];
        let bins = bucket_weekly(&games, 1, date(2026, 3, 20));

        let w1 = bins.iter().find(|b| b.week_start == date(2026, 3, 2)).unwrap();
        assert_eq!((w1.games, w1.wins, w1.losses, w1.draws), (2, 1, 1, 0));

        let w2 = bins.iter().find(|b| b.week_start == date(2026, 3, 9)).unwrap();
        assert_eq!((w2.games, w2.draws), (1, 1));

        let total: u32 = bins.iter().map(|b| b.games).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_games_outside_window_ignored() {
        let games = vec![
            result("old", "dm3", "BAR", 20, 10, 1),
            result("future", "dm3", "BAR", 20, 10, 28),
        ];
        // One month back from 2026-04-20 starts the week of 2026-03-16.
        let bins = bucket_weekly(&games, 1, date(2026, 4, 20));
        assert_eq!(bins.iter().map(|b| b.games).sum::<u32>(), 1);

        let bins = bucket_weekly(&games, 1, date(2026, 3, 20));
        assert_eq!(bins.iter().map(|b| b.games).sum::<u32>(), 1);
    }

    #[test]
    fn test_zero_period_is_single_week() {
        let bins = bucket_weekly(&[], 0, date(2026, 3, 20));
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].week_start, date(2026, 3, 16));
    }
}
