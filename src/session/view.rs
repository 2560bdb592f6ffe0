//! Serializable snapshots of a session, as read by the view layer.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::calculate::activity::{bucket_weekly, ActivityBin};
use crate::calculate::aggregate::{player_lines, team_aggregate};
use crate::calculate::filter::{distinct_maps, distinct_opponents, filter_and_sort, ResultFilter, SortState};
use crate::calculate::maps::{merge, MergedMapRow};
use crate::calculate::{form_string, summarize, ResultSummary};
use crate::models::{
    FetchSlot, Loadable, MapStat, MatchResult, PlayerGameStat, RosterEntry, StatCategory, TeamAggregate,
    TeamInfo,
};
use crate::selection::{SelectionState, Side};

use super::state::SessionState;
use super::{PanelId, SubMode};

/// Games shown in a form string.
const FORM_STRING_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Idle,
    Loading,
    Failed,
    Ready,
}

/// One list-level fetch as the view sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListView<T> {
    pub status: SlotStatus,
    pub error: Option<String>,
    pub items: Vec<T>,
}

impl<T: Clone> ListView<T> {
    fn of(slot: &FetchSlot<Vec<T>>) -> Self {
        Self::mapped(slot, |items| items.to_vec())
    }

    fn mapped(slot: &FetchSlot<Vec<T>>, f: impl FnOnce(&[T]) -> Vec<T>) -> Self {
        let (status, error, items) = match slot {
            FetchSlot::Idle => (SlotStatus::Idle, None, Vec::new()),
            FetchSlot::Loading => (SlotStatus::Loading, None, Vec::new()),
            FetchSlot::Failed(e) => (SlotStatus::Failed, Some(e.clone()), Vec::new()),
            FetchSlot::Ready(items) => (SlotStatus::Ready, None, f(items)),
        };
        Self { status, error, items }
    }
}

/// Team A's match history browse list.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsView {
    /// Filtered and sorted
    pub list: ListView<MatchResult>,
    pub filter: ResultFilter,
    pub sort: SortState,
    pub map_options: Vec<String>,
    pub opponent_options: Vec<String>,
    /// Summary of the filtered rows
    pub summary: ResultSummary,
    pub activity: Vec<ActivityBin>,
    pub selection: SelectionState,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeadToHeadView {
    pub list: ListView<MatchResult>,
    pub summary: ResultSummary,
    pub selection: SelectionState,
}

/// Form, roster and map data for one team.
#[derive(Debug, Clone, Serialize)]
pub struct SideView {
    pub team: String,
    pub form: ListView<MatchResult>,
    pub form_summary: ResultSummary,
    pub form_string: String,
    pub roster: ListView<RosterEntry>,
    pub maps: ListView<MapStat>,
    pub selection: SelectionState,
}

/// Everything the view reads from a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub team_a: String,
    pub team_b: Option<String>,
    pub period_months: u32,
    pub sub_mode: SubMode,
    pub labels: BTreeMap<String, Loadable<TeamInfo>>,
    pub results: ResultsView,
    pub head_to_head: HeadToHeadView,
    pub side_a: SideView,
    pub side_b: Option<SideView>,
    pub merged_maps: Vec<MergedMapRow>,
    pub cached_games: usize,
}

/// Team aggregates for the game a panel currently shows.
#[derive(Debug, Clone, Serialize)]
pub struct PanelAggregates {
    pub panel: PanelId,
    pub category: StatCategory,
    pub game: Option<MatchResult>,
    pub ours: Loadable<TeamAggregate>,
    pub theirs: Loadable<TeamAggregate>,
    pub players: Vec<PlayerGameStat>,
}

fn ready_summary(slot: &FetchSlot<Vec<MatchResult>>) -> ResultSummary {
    slot.ready().map(|g| summarize(g)).unwrap_or_default()
}

impl SessionState {
    pub(super) fn visible_results(&self) -> Vec<MatchResult> {
        filter_and_sort(self.rows(PanelId::Results), &self.filter, self.sort)
    }

    pub(super) fn histogram(&self, today: NaiveDate) -> Vec<ActivityBin> {
        bucket_weekly(self.rows(PanelId::Results), self.period_months, today)
    }

    /// Merged map rows; empty until both teams' maps are in.
    pub(super) fn merged_maps(&self) -> Vec<MergedMapRow> {
        match (&self.team_b, self.side_a.maps.ready(), self.side_b.maps.ready()) {
            (Some(tag_b), Some(a), Some(b)) => merge(a, b, &self.team_a, tag_b),
            _ => Vec::new(),
        }
    }

    pub(super) fn aggregates(&self, panel: PanelId, category: StatCategory) -> PanelAggregates {
        let selection = self.panels.get(panel).state();
        let game = selection
            .target_id
            .as_deref()
            .and_then(|id| self.find_row(panel, id))
            .cloned();

        let (ours, theirs, players) = match (&game, &selection.stats_blob) {
            (Some(g), Some(blob)) => {
                let mut players = player_lines(blob, &g.our_tag, category);
                players.extend(player_lines(blob, &g.opponent_tag, category));
                (
                    team_aggregate(blob, &g.our_tag, category),
                    team_aggregate(blob, &g.opponent_tag, category),
                    players,
                )
            }
            _ => (Loadable::NotLoaded, Loadable::NotLoaded, Vec::new()),
        };

        PanelAggregates {
            panel,
            category,
            game,
            ours,
            theirs,
            players,
        }
    }

    fn side_view(&self, side: Side, team: &str) -> SideView {
        let data = self.side(side);
        let panel = match side {
            Side::Left => PanelId::FormA,
            Side::Right => PanelId::FormB,
        };
        SideView {
            team: team.to_string(),
            form: ListView::of(&data.form),
            form_summary: ready_summary(&data.form),
            form_string: data
                .form
                .ready()
                .map(|g| form_string(g, FORM_STRING_LEN))
                .unwrap_or_default(),
            roster: ListView::of(&data.roster),
            maps: ListView::of(&data.maps),
            selection: self.panels.get(panel).state().clone(),
        }
    }

    pub(super) fn view(&self, today: NaiveDate, cached_games: usize) -> SessionView {
        let history = self.rows(PanelId::Results);
        let visible = self.visible_results();

        let results = ResultsView {
            list: ListView::mapped(&self.history, |_| visible.clone()),
            filter: self.filter.clone(),
            sort: self.sort,
            map_options: distinct_maps(history),
            opponent_options: distinct_opponents(history),
            summary: summarize(&visible),
            activity: self.histogram(today),
            selection: self.panels.get(PanelId::Results).state().clone(),
        };

        SessionView {
            team_a: self.team_a.clone(),
            team_b: self.team_b.clone(),
            period_months: self.period_months,
            sub_mode: self.sub_mode,
            labels: self
                .labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            results,
            head_to_head: HeadToHeadView {
                list: ListView::of(&self.head_to_head),
                summary: ready_summary(&self.head_to_head),
                selection: self.panels.get(PanelId::HeadToHead).state().clone(),
            },
            side_a: self.side_view(Side::Left, &self.team_a),
            side_b: self.team_b.as_deref().map(|b| self.side_view(Side::Right, b)),
            merged_maps: self.merged_maps(),
            cached_games,
        }
    }
}
