//! Statistics calculation engine.
//!
//! Pure functions over fetched data:
//! - Player extraction and team aggregation
//! - Weekly activity histograms
//! - Result list filtering and sorting
//! - Per-map strength comparison
//! - Win/loss summaries

pub mod activity;
pub mod aggregate;
pub mod filter;
pub mod maps;

use serde::{Deserialize, Serialize};

use crate::models::{MatchResult, Outcome};

/// `numerator / denominator * 100`, or 0 when the denominator is 0.
pub fn rate(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

/// Calculate win rate (percent) from wins/losses/draws.
pub fn calculate_win_rate(wins: u32, losses: u32, draws: u32) -> f64 {
    rate(wins as u64, (wins + losses + draws) as u64)
}

/// Win/loss summary of a result list, from the `our_tag` perspective.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Percent (0-100)
    pub win_rate: f64,
    pub frags_for: i64,
    pub frags_against: i64,
}

impl ResultSummary {
    pub fn frag_diff(&self) -> i64 {
        self.frags_for - self.frags_against
    }
}

/// Summarize a list of results.
pub fn summarize(results: &[MatchResult]) -> ResultSummary {
    let mut summary = ResultSummary::default();

    for r in results {
        summary.games += 1;
        match r.result {
            Outcome::Win => summary.wins += 1,
            Outcome::Loss => summary.losses += 1,
            Outcome::Draw => summary.draws += 1,
        }
        summary.frags_for += r.our_score as i64;
        summary.frags_against += r.opponent_score as i64;
    }

    summary.win_rate = calculate_win_rate(summary.wins, summary.losses, summary.draws);
    summary
}

/// Render a result list as a compact form string, most recent first ("WWLDW").
pub fn form_string(results: &[MatchResult], limit: usize) -> String {
    let mut sorted: Vec<&MatchResult> = results.iter().collect();
    sorted.sort_by(|a, b| b.played_at.cmp(&a.played_at));
    sorted
        .iter()
        .take(limit)
        .map(|r| r.result.to_string())
        .collect()
}
