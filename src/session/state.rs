use std::collections::HashMap;
use std::fmt;

use crate::calculate::filter::{ResultFilter, SortState};
use crate::directory::TeamDirectory;
use crate::models::{FetchSlot, Loadable, MapStat, MatchResult, RosterEntry, TeamInfo};
use crate::selection::{SelectionController, Side};
use crate::source::ListQuery;

use super::{PanelId, SessionSettings, SubMode};

/// List data for one side of the comparison.
#[derive(Debug, Default)]
pub(super) struct SideData {
    pub form: FetchSlot<Vec<MatchResult>>,
    pub roster: FetchSlot<Vec<RosterEntry>>,
    pub maps: FetchSlot<Vec<MapStat>>,
}

#[derive(Debug)]
pub(super) struct Panels {
    results: SelectionController,
    head_to_head: SelectionController,
    form_a: SelectionController,
    form_b: SelectionController,
}

impl Panels {
    fn new() -> Self {
        Self {
            results: SelectionController::new(None),
            head_to_head: SelectionController::new(None),
            form_a: SelectionController::new(Some(Side::Left)),
            form_b: SelectionController::new(Some(Side::Right)),
        }
    }

    pub fn get(&self, panel: PanelId) -> &SelectionController {
        match panel {
            PanelId::Results => &self.results,
            PanelId::HeadToHead => &self.head_to_head,
            PanelId::FormA => &self.form_a,
            PanelId::FormB => &self.form_b,
        }
    }

    pub fn get_mut(&mut self, panel: PanelId) -> &mut SelectionController {
        match panel {
            PanelId::Results => &mut self.results,
            PanelId::HeadToHead => &mut self.head_to_head,
            PanelId::FormA => &mut self.form_a,
            PanelId::FormB => &mut self.form_b,
        }
    }

    fn reset_all(&mut self) {
        for panel in PanelId::ALL {
            self.get_mut(panel).reset();
        }
    }
}

/// One list-level fetch, with its parameters captured at issue time.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum ListJob {
    History { team: String, months: u32 },
    HeadToHead { team_a: String, team_b: String, query: ListQuery },
    Form { side: Side, team: String, query: ListQuery },
    Roster { side: Side, team: String, months: u32 },
    Maps { side: Side, team: String, months: u32 },
}

impl ListJob {
    /// Team A's history outlives opponent changes, so it has its own generation.
    pub fn is_history(&self) -> bool {
        matches!(self, ListJob::History { .. })
    }

    /// Jobs on different sides never touch the same slot.
    pub fn side(&self) -> Option<Side> {
        match self {
            ListJob::History { .. } | ListJob::HeadToHead { .. } => None,
            ListJob::Form { side, .. } | ListJob::Roster { side, .. } | ListJob::Maps { side, .. } => {
                Some(*side)
            }
        }
    }
}

impl fmt::Display for ListJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListJob::History { team, months } => write!(f, "history {} ({}mo)", team, months),
            ListJob::HeadToHead { team_a, team_b, query } => {
                write!(f, "head-to-head {} vs {} ({}mo)", team_a, team_b, query.months)
            }
            ListJob::Form { team, query, .. } => write!(f, "form {} ({}mo)", team, query.months),
            ListJob::Roster { team, months, .. } => write!(f, "roster {} ({}mo)", team, months),
            ListJob::Maps { team, months, .. } => write!(f, "maps {} ({}mo)", team, months),
        }
    }
}

/// Mark `slot` as loading if it is due for a fetch.
///
/// A normal pass only picks up slots never fetched; a retry pass only
/// picks up failed ones.
fn claim<T>(slot: &mut FetchSlot<T>, retry: bool) -> bool {
    let due = if retry {
        slot.is_failed()
    } else {
        matches!(slot, FetchSlot::Idle)
    };
    if due {
        *slot = FetchSlot::Loading;
    }
    due
}

/// Generations captured when a batch of list fetches is planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Stamp {
    pub history: u64,
    pub lists: u64,
}

impl Stamp {
    pub fn for_job(self, history: bool) -> u64 {
        if history {
            self.history
        } else {
            self.lists
        }
    }
}

/// Everything mutable about a session. Lives behind the session's lock.
#[derive(Debug)]
pub(super) struct SessionState {
    pub team_a: String,
    pub team_b: Option<String>,
    pub period_months: u32,
    pub sub_mode: SubMode,
    /// Bumped on every team, opponent or period change
    pub generation: u64,
    /// Bumped on Team A or period changes only
    pub history_generation: u64,
    pub history: FetchSlot<Vec<MatchResult>>,
    pub filter: ResultFilter,
    pub sort: SortState,
    pub head_to_head: FetchSlot<Vec<MatchResult>>,
    pub side_a: SideData,
    pub side_b: SideData,
    pub panels: Panels,
    pub labels: HashMap<String, Loadable<TeamInfo>>,
}

impl SessionState {
    pub fn new(team_a: String, team_b: Option<String>, period_months: u32, sub_mode: SubMode) -> Self {
        Self {
            team_a,
            team_b,
            period_months,
            sub_mode,
            generation: 0,
            history_generation: 0,
            history: FetchSlot::Idle,
            filter: ResultFilter::default(),
            sort: SortState::default(),
            head_to_head: FetchSlot::Idle,
            side_a: SideData::default(),
            side_b: SideData::default(),
            panels: Panels::new(),
            labels: HashMap::new(),
        }
    }

    pub fn side(&self, side: Side) -> &SideData {
        match side {
            Side::Left => &self.side_a,
            Side::Right => &self.side_b,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut SideData {
        match side {
            Side::Left => &mut self.side_a,
            Side::Right => &mut self.side_b,
        }
    }

    /// Drop every list and selection tied to the old Team A or period.
    ///
    /// Must run before any fetch for the new parameters is planned.
    pub fn invalidate(&mut self) {
        self.history_generation += 1;
        self.history = FetchSlot::Idle;
        self.invalidate_comparison();
    }

    /// Drop the comparison lists and every panel's selection after an
    /// opponent change. Team A's history stays.
    pub fn invalidate_comparison(&mut self) {
        self.generation += 1;
        self.head_to_head = FetchSlot::Idle;
        self.side_a = SideData::default();
        self.side_b = SideData::default();
        self.panels.reset_all();
    }

    fn teams(&self) -> Vec<(Side, String)> {
        let mut teams = vec![(Side::Left, self.team_a.clone())];
        if let Some(b) = &self.team_b {
            teams.push((Side::Right, b.clone()));
        }
        teams
    }

    pub fn stamp(&self) -> Stamp {
        Stamp {
            history: self.history_generation,
            lists: self.generation,
        }
    }

    /// Fetches needed by the results list and the active sub-mode.
    pub fn plan(&mut self, settings: &SessionSettings, retry: bool) -> Vec<ListJob> {
        let months = self.period_months;
        let mut jobs = Vec::new();

        if claim(&mut self.history, retry) {
            jobs.push(ListJob::History {
                team: self.team_a.clone(),
                months,
            });
        }

        match self.sub_mode {
            SubMode::HeadToHead => {
                if let Some(team_b) = self.team_b.clone() {
                    if claim(&mut self.head_to_head, retry) {
                        jobs.push(ListJob::HeadToHead {
                            team_a: self.team_a.clone(),
                            team_b,
                            query: ListQuery {
                                months,
                                limit: settings.h2h_limit,
                            },
                        });
                    }
                }
            }
            SubMode::Form => {
                for (side, team) in self.teams() {
                    let data = self.side_mut(side);
                    if claim(&mut data.form, retry) {
                        jobs.push(ListJob::Form {
                            side,
                            team: team.clone(),
                            query: ListQuery {
                                months,
                                limit: settings.form_limit,
                            },
                        });
                    }
                    if claim(&mut data.roster, retry) {
                        jobs.push(ListJob::Roster { side, team, months });
                    }
                }
            }
            SubMode::Maps => {
                for (side, team) in self.teams() {
                    if claim(&mut self.side_mut(side).maps, retry) {
                        jobs.push(ListJob::Maps { side, team, months });
                    }
                }
            }
        }

        jobs
    }

    /// Rows a panel currently lists. Empty until its list is ready.
    pub fn rows(&self, panel: PanelId) -> &[MatchResult] {
        let slot = match panel {
            PanelId::Results => &self.history,
            PanelId::HeadToHead => &self.head_to_head,
            PanelId::FormA => &self.side_a.form,
            PanelId::FormB => &self.side_b.form,
        };
        slot.ready().map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn find_row(&self, panel: PanelId, id: &str) -> Option<&MatchResult> {
        self.rows(panel).iter().find(|r| r.id == id)
    }

    /// Look up display labels for every tag on screen that isn't cached yet.
    pub fn refresh_labels(&mut self, directory: &dyn TeamDirectory) {
        let mut tags = vec![self.team_a.clone()];
        tags.extend(self.team_b.clone());
        for slot in [&self.history, &self.head_to_head, &self.side_a.form, &self.side_b.form] {
            if let Some(games) = slot.ready() {
                tags.extend(games.iter().map(|g| g.opponent_tag.clone()));
            }
        }

        for tag in tags {
            self.labels
                .entry(tag)
                .or_insert_with_key(|t| Loadable::from_option(directory.lookup(t)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::test_support::result;
    use crate::directory::StaticTeamDirectory;

    fn state(team_b: Option<&str>, sub_mode: SubMode) -> SessionState {
        SessionState::new("FOO".to_string(), team_b.map(str::to_string), 3, sub_mode)
    }

    #[test]
    fn test_plan_is_lazy_per_sub_mode() {
        let settings = SessionSettings::default();
        let mut s = state(Some("BAR"), SubMode::HeadToHead);

        let jobs = s.plan(&settings, false);
        assert_eq!(jobs.len(), 2);
        assert!(matches!(jobs[0], ListJob::History { .. }));
        assert!(matches!(jobs[1], ListJob::HeadToHead { .. }));
        assert!(matches!(s.side_a.form, FetchSlot::Idle));

        // Loading slots are not issued twice.
        assert!(s.plan(&settings, false).is_empty());
    }

    #[test]
    fn test_plan_form_covers_both_sides() {
        let settings = SessionSettings::default();
        let mut s = state(Some("BAR"), SubMode::Form);

        let jobs = s.plan(&settings, false);
        let left = jobs.iter().filter(|j| j.side() == Some(Side::Left)).count();
        let right = jobs.iter().filter(|j| j.side() == Some(Side::Right)).count();
        assert_eq!((left, right), (2, 2));
    }

    #[test]
    fn test_plan_without_opponent_skips_team_b() {
        let settings = SessionSettings::default();
        let mut s = state(None, SubMode::HeadToHead);
        let jobs = s.plan(&settings, false);
        assert_eq!(jobs.len(), 1);
        assert!(matches!(s.head_to_head, FetchSlot::Idle));

        let mut s = state(None, SubMode::Maps);
        let jobs = s.plan(&settings, false);
        assert!(jobs.iter().all(|j| j.side() != Some(Side::Right)));
    }

    #[test]
    fn test_retry_only_picks_failed_slots() {
        let settings = SessionSettings::default();
        let mut s = state(Some("BAR"), SubMode::Form);
        s.plan(&settings, false);
        s.history = FetchSlot::Ready(Vec::new());
        s.side_a.form = FetchSlot::Ready(Vec::new());
        s.side_a.roster = FetchSlot::Ready(Vec::new());
        s.side_b.form = FetchSlot::Failed("HTTP 503".to_string());
        s.side_b.roster = FetchSlot::Ready(Vec::new());

        let jobs = s.plan(&settings, true);
        assert_eq!(jobs.len(), 1);
        assert!(matches!(&jobs[0], ListJob::Form { side: Side::Right, team, .. } if team == "BAR"));
        assert!(matches!(s.side_b.form, FetchSlot::Loading));
    }

    #[test]
    fn test_invalidate_bumps_generation_and_clears() {
        let mut s = state(Some("BAR"), SubMode::HeadToHead);
        s.head_to_head = FetchSlot::Ready(vec![result("g1", "dm3", "BAR", 20, 15, 1)]);
        s.panels.get_mut(PanelId::HeadToHead).click("g1", Some("ref-g1"));

        s.invalidate();
        assert_eq!(s.stamp(), Stamp { history: 1, lists: 1 });
        assert!(matches!(s.head_to_head, FetchSlot::Idle));
        assert_eq!(s.panels.get(PanelId::HeadToHead).state().target_id, None);
    }

    #[test]
    fn test_opponent_invalidation_keeps_history() {
        let settings = SessionSettings::default();
        let mut s = state(Some("BAR"), SubMode::HeadToHead);
        s.history = FetchSlot::Ready(vec![result("g1", "dm3", "QUX", 20, 15, 1)]);
        s.head_to_head = FetchSlot::Ready(Vec::new());
        s.panels.get_mut(PanelId::Results).click("g1", None);

        s.invalidate_comparison();
        assert_eq!(s.stamp(), Stamp { history: 0, lists: 1 });
        assert!(s.history.ready().is_some());
        assert!(matches!(s.head_to_head, FetchSlot::Idle));
        assert_eq!(s.panels.get(PanelId::Results).state().target_id, None);

        let jobs = s.plan(&settings, false);
        assert_eq!(jobs.len(), 1);
        assert!(matches!(jobs[0], ListJob::HeadToHead { .. }));
    }

    #[test]
    fn test_rows_and_labels() {
        let mut s = state(Some("BAR"), SubMode::HeadToHead);
        assert!(s.find_row(PanelId::HeadToHead, "g1").is_none());

        s.history = FetchSlot::Ready(vec![result("g1", "dm3", "QUX", 20, 15, 1)]);
        assert!(s.find_row(PanelId::Results, "g1").is_some());

        let dir = StaticTeamDirectory::new(vec![TeamInfo {
            tag: "FOO".to_string(),
            name: "Foo Fighters".to_string(),
            logo: None,
        }]);
        s.refresh_labels(&dir);
        assert!(matches!(s.labels.get("FOO"), Some(Loadable::Present(_))));
        assert_eq!(s.labels.get("BAR"), Some(&Loadable::Absent));
        assert_eq!(s.labels.get("QUX"), Some(&Loadable::Absent));
    }
}
