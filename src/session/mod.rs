//! One "Team A vs Team B" comparison session.
//!
//! A session owns its list data, its selection panels and its stats cache.
//! Commands lock the state, transition, release the lock, await whatever
//! fetches they issued, then re-lock to apply the results. List results are
//! applied only if no team, opponent or period change happened meanwhile;
//! detail results go through the panel's own stale-fetch guard.

mod state;
mod view;

pub use view::{HeadToHeadView, ListView, PanelAggregates, ResultsView, SessionView, SideView, SlotStatus};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::StatsCache;
use crate::calculate::activity::ActivityBin;
use crate::calculate::filter::SortColumn;
use crate::calculate::maps::MergedMapRow;
use crate::directory::TeamDirectory;
use crate::fetch::FetchError;
use crate::models::{FetchSlot, MatchResult, StatCategory};
use crate::selection::{FetchOutcome, FetchTicket, SelectionState, Side};
use crate::source::StatsSource;

use state::{ListJob, SessionState, Stamp};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No row {id} in the {panel} panel")]
    UnknownRow { panel: PanelId, id: String },

    #[error("Period must be at least one month, got {0}")]
    InvalidPeriod(u32),

    #[error("Period of {months} months exceeds the {max} month limit")]
    PeriodTooLong { months: u32, max: u32 },

    #[error("Team tag must not be empty")]
    EmptyTeam,
}

/// Which comparison is on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubMode {
    #[default]
    HeadToHead,
    Form,
    Maps,
}

impl FromStr for SubMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "head_to_head" | "h2h" => Ok(SubMode::HeadToHead),
            "form" => Ok(SubMode::Form),
            "maps" => Ok(SubMode::Maps),
            other => Err(format!("unknown sub-mode: {}", other)),
        }
    }
}

/// A result list with its own selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelId {
    /// Team A's match history
    Results,
    HeadToHead,
    FormA,
    FormB,
}

impl PanelId {
    pub const ALL: [PanelId; 4] = [
        PanelId::Results,
        PanelId::HeadToHead,
        PanelId::FormA,
        PanelId::FormB,
    ];
}

impl FromStr for PanelId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "results" | "history" => Ok(PanelId::Results),
            "head_to_head" | "h2h" => Ok(PanelId::HeadToHead),
            "form_a" => Ok(PanelId::FormA),
            "form_b" => Ok(PanelId::FormB),
            other => Err(format!("unknown panel: {}", other)),
        }
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelId::Results => write!(f, "results"),
            PanelId::HeadToHead => write!(f, "head_to_head"),
            PanelId::FormA => write!(f, "form_a"),
            PanelId::FormB => write!(f, "form_b"),
        }
    }
}

/// Service-wide knobs every session shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub h2h_limit: Option<u32>,
    pub form_limit: Option<u32>,
    pub default_period_months: u32,
    pub max_period_months: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            h2h_limit: Some(10),
            form_limit: Some(10),
            default_period_months: 3,
            max_period_months: 24,
        }
    }
}

/// Parameters for opening a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionInit {
    pub team_a: String,
    #[serde(default)]
    pub team_b: Option<String>,
    #[serde(default)]
    pub period_months: Option<u32>,
    #[serde(default)]
    pub sub_mode: Option<SubMode>,
}

/// An imperative command from the view layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    SelectTeamA { team: String },
    SelectOpponent { team: Option<String> },
    ChangePeriod { months: u32 },
    SwitchSubMode { mode: SubMode },
    HoverResult { panel: PanelId, id: String },
    ClearHover { panel: PanelId, id: String },
    SelectResult { panel: PanelId, id: String },
    FilterByMap { map: Option<String> },
    FilterByOpponent { opponent: Option<String> },
    SortByColumn { column: SortColumn },
    Retry,
}

fn normalize_tag(tag: &str) -> Result<String, SessionError> {
    let tag = tag.trim();
    if tag.is_empty() {
        return Err(SessionError::EmptyTeam);
    }
    Ok(tag.to_string())
}

fn validate_period(months: u32, settings: &SessionSettings) -> Result<u32, SessionError> {
    if months == 0 {
        return Err(SessionError::InvalidPeriod(months));
    }
    if months > settings.max_period_months {
        return Err(SessionError::PeriodTooLong {
            months,
            max: settings.max_period_months,
        });
    }
    Ok(months)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A comparison session. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ComparisonSession {
    source: Arc<dyn StatsSource>,
    directory: Arc<dyn TeamDirectory>,
    cache: Arc<StatsCache>,
    settings: SessionSettings,
    state: Arc<RwLock<SessionState>>,
}

impl ComparisonSession {
    /// Open a session and load what its initial sub-mode needs.
    pub async fn open(
        source: Arc<dyn StatsSource>,
        directory: Arc<dyn TeamDirectory>,
        settings: SessionSettings,
        init: SessionInit,
    ) -> Result<Self, SessionError> {
        let team_a = normalize_tag(&init.team_a)?;
        let team_b = init.team_b.as_deref().map(normalize_tag).transpose()?;
        let period = validate_period(
            init.period_months.unwrap_or(settings.default_period_months),
            &settings,
        )?;

        let mut state = SessionState::new(team_a, team_b, period, init.sub_mode.unwrap_or_default());
        state.refresh_labels(directory.as_ref());

        info!(
            "Opening session {} vs {} ({} months, {:?}) on {}",
            state.team_a,
            state.team_b.as_deref().unwrap_or("-"),
            period,
            state.sub_mode,
            source.name()
        );

        let session = Self {
            source,
            directory,
            cache: Arc::new(StatsCache::new()),
            settings,
            state: Arc::new(RwLock::new(state)),
        };
        session.load(false).await;
        Ok(session)
    }

    /// The session's detail stats cache.
    pub fn cache(&self) -> &StatsCache {
        &self.cache
    }

    pub async fn execute(&self, command: Command) -> Result<(), SessionError> {
        debug!("Session command: {:?}", command);
        match command {
            Command::SelectTeamA { team } => self.select_team_a(&team).await,
            Command::SelectOpponent { team } => self.select_opponent(team.as_deref()).await,
            Command::ChangePeriod { months } => self.change_period(months).await,
            Command::SwitchSubMode { mode } => {
                self.switch_sub_mode(mode).await;
                Ok(())
            }
            Command::HoverResult { panel, id } => self.hover_result(panel, &id).await.map(|_| ()),
            Command::ClearHover { panel, id } => {
                self.clear_hover(panel, &id).await;
                Ok(())
            }
            Command::SelectResult { panel, id } => self.select_result(panel, &id).await,
            Command::FilterByMap { map } => {
                self.filter_by_map(map).await;
                Ok(())
            }
            Command::FilterByOpponent { opponent } => {
                self.filter_by_opponent(opponent).await;
                Ok(())
            }
            Command::SortByColumn { column } => {
                self.sort_by_column(column).await;
                Ok(())
            }
            Command::Retry => {
                self.retry().await;
                Ok(())
            }
        }
    }

    pub async fn select_team_a(&self, team: &str) -> Result<(), SessionError> {
        let team = normalize_tag(team)?;
        {
            let mut state = self.state.write().await;
            if state.team_a == team {
                return Ok(());
            }
            info!("Team A: {} -> {}", state.team_a, team);
            state.team_a = team;
            // The old filter values belong to the old team's history.
            state.filter = Default::default();
            state.invalidate();
            state.refresh_labels(self.directory.as_ref());
        }
        self.load(false).await;
        Ok(())
    }

    pub async fn select_opponent(&self, team: Option<&str>) -> Result<(), SessionError> {
        let team = team.map(normalize_tag).transpose()?;
        {
            let mut state = self.state.write().await;
            if state.team_b == team {
                return Ok(());
            }
            info!("Opponent: {:?} -> {:?}", state.team_b, team);
            state.team_b = team;
            state.invalidate_comparison();
            state.refresh_labels(self.directory.as_ref());
        }
        self.load(false).await;
        Ok(())
    }

    /// Change the lookback. Every list is refetched; the stats cache stays.
    pub async fn change_period(&self, months: u32) -> Result<(), SessionError> {
        let months = validate_period(months, &self.settings)?;
        {
            let mut state = self.state.write().await;
            if state.period_months == months {
                return Ok(());
            }
            info!("Period: {} -> {} months", state.period_months, months);
            state.period_months = months;
            state.invalidate();
        }
        self.load(false).await;
        Ok(())
    }

    /// Switch sub-mode, fetching its data the first time it is shown.
    pub async fn switch_sub_mode(&self, mode: SubMode) {
        self.state.write().await.sub_mode = mode;
        self.load(false).await;
    }

    /// Pointer entered a row.
    ///
    /// Returns the background stats fetch, if one was started. Nothing needs
    /// to await it; its result lands only if the row is still hovered.
    pub async fn hover_result(&self, panel: PanelId, id: &str) -> Result<Option<JoinHandle<()>>, SessionError> {
        let ticket = {
            let mut state = self.state.write().await;
            let stats_ref = self.row_stats_ref(&state, panel, id)?;
            let ticket = state.panels.get_mut(panel).pointer_enter(id, stats_ref.as_deref());
            self.prime(&mut state, panel, ticket)
        };

        Ok(ticket.map(|ticket| {
            let session = self.clone();
            tokio::spawn(async move { session.resolve(panel, ticket).await })
        }))
    }

    /// Pointer left a row.
    pub async fn clear_hover(&self, panel: PanelId, id: &str) {
        self.state.write().await.panels.get_mut(panel).pointer_leave(id);
    }

    /// Click a row: toggles its sticky selection and loads its stats.
    pub async fn select_result(&self, panel: PanelId, id: &str) -> Result<(), SessionError> {
        let ticket = {
            let mut state = self.state.write().await;
            let stats_ref = self.row_stats_ref(&state, panel, id)?;
            let ticket = state.panels.get_mut(panel).click(id, stats_ref.as_deref());
            self.prime(&mut state, panel, ticket)
        };

        if let Some(ticket) = ticket {
            self.resolve(panel, ticket).await;
        }
        Ok(())
    }

    pub async fn filter_by_map(&self, map: Option<String>) {
        self.state.write().await.filter.map = non_empty(map);
    }

    pub async fn filter_by_opponent(&self, opponent: Option<String>) {
        self.state.write().await.filter.opponent = non_empty(opponent);
    }

    pub async fn sort_by_column(&self, column: SortColumn) {
        self.state.write().await.sort.click(column);
    }

    /// Re-issue every failed list fetch of the active sub-mode and the
    /// results list. Lists that loaded are left alone.
    pub async fn retry(&self) {
        self.load(true).await;
    }

    pub async fn selection(&self, panel: PanelId) -> SelectionState {
        self.state.read().await.panels.get(panel).state().clone()
    }

    /// Team A's history after the current filter and sort.
    pub async fn results(&self) -> Vec<MatchResult> {
        self.state.read().await.visible_results()
    }

    pub async fn histogram(&self) -> Vec<ActivityBin> {
        self.state.read().await.histogram(Utc::now().date_naive())
    }

    pub async fn merged_maps(&self) -> Vec<MergedMapRow> {
        self.state.read().await.merged_maps()
    }

    pub async fn aggregates(&self, panel: PanelId, category: StatCategory) -> PanelAggregates {
        self.state.read().await.aggregates(panel, category)
    }

    pub async fn snapshot(&self) -> SessionView {
        self.state
            .read()
            .await
            .view(Utc::now().date_naive(), self.cache.len())
    }

    fn row_stats_ref(&self, state: &SessionState, panel: PanelId, id: &str) -> Result<Option<String>, SessionError> {
        state
            .find_row(panel, id)
            .map(|row| row.stats_ref.clone())
            .ok_or_else(|| SessionError::UnknownRow {
                panel,
                id: id.to_string(),
            })
    }

    /// Apply a cached blob right away; hand back the ticket only if it
    /// still needs a fetch.
    fn prime(&self, state: &mut SessionState, panel: PanelId, ticket: Option<FetchTicket>) -> Option<FetchTicket> {
        let ticket = ticket?;
        match self.cache.get(&ticket.key) {
            Some(blob) => {
                state.panels.get_mut(panel).prime(&ticket, blob);
                None
            }
            None => Some(ticket),
        }
    }

    /// Fetch a ticket's blob through the cache and offer it to the panel.
    async fn resolve(&self, panel: PanelId, ticket: FetchTicket) {
        let source = self.source.clone();
        let stats_ref = ticket.stats_ref.clone();
        let result = self
            .cache
            .get_or_fetch(&ticket.key, move || async move { source.game_stats(&stats_ref).await })
            .await;

        let mut state = self.state.write().await;
        let outcome = state
            .panels
            .get_mut(panel)
            .apply_fetch(&ticket, result.map_err(|e| e.to_string()));
        if outcome == FetchOutcome::Discarded {
            debug!("Stats for {} arrived after {} moved on", ticket.target_id, panel);
        }
    }

    async fn load(&self, retry: bool) {
        let (jobs, stamp) = {
            let mut state = self.state.write().await;
            let jobs = state.plan(&self.settings, retry);
            (jobs, state.stamp())
        };
        if jobs.is_empty() {
            return;
        }
        debug!("Issuing {} list fetches ({:?})", jobs.len(), stamp);

        let mut shared = Vec::new();
        let mut left = Vec::new();
        let mut right = Vec::new();
        for job in jobs {
            match job.side() {
                None => shared.push(job),
                Some(Side::Left) => left.push(job),
                Some(Side::Right) => right.push(job),
            }
        }

        tokio::join!(
            self.run_lane(shared, stamp),
            self.run_lane(left, stamp),
            self.run_lane(right, stamp)
        );
    }

    async fn run_lane(&self, jobs: Vec<ListJob>, stamp: Stamp) {
        for job in jobs {
            self.run_job(job, stamp).await;
        }
    }

    async fn run_job(&self, job: ListJob, stamp: Stamp) {
        let label = job.to_string();
        let history = job.is_history();
        match job {
            ListJob::History { team, months } => {
                let result = self.source.match_history(&team, months).await;
                self.store(stamp, history, &label, result, |s| &mut s.history).await;
            }
            ListJob::HeadToHead { team_a, team_b, query } => {
                let result = self
                    .source
                    .head_to_head(&team_a, &team_b, query)
                    .await
                    .map(|h| h.games);
                self.store(stamp, history, &label, result, |s| &mut s.head_to_head)
                    .await;
            }
            ListJob::Form { side, team, query } => {
                let result = self.source.form(&team, query).await.map(|f| f.games);
                self.store(stamp, history, &label, result, move |s| &mut s.side_mut(side).form)
                    .await;
            }
            ListJob::Roster { side, team, months } => {
                let result = self.source.roster(&team, months).await.map(|r| r.players);
                self.store(stamp, history, &label, result, move |s| &mut s.side_mut(side).roster)
                    .await;
            }
            ListJob::Maps { side, team, months } => {
                let result = self.source.maps(&team, months).await.map(|m| m.maps);
                self.store(stamp, history, &label, result, move |s| &mut s.side_mut(side).maps)
                    .await;
            }
        }
    }

    /// Write a list result into its slot, unless the session moved on.
    async fn store<T, F>(&self, stamp: Stamp, history: bool, label: &str, result: Result<T, FetchError>, slot: F)
    where
        F: FnOnce(&mut SessionState) -> &mut FetchSlot<T>,
    {
        let mut state = self.state.write().await;
        let generation = stamp.for_job(history);
        let current = state.stamp().for_job(history);
        if current != generation {
            debug!("Discarding {} from generation {} (now {})", label, generation, current);
            return;
        }

        *slot(&mut *state) = match result {
            Ok(value) => FetchSlot::Ready(value),
            Err(e) => {
                warn!("Fetching {} failed: {}", label, e);
                FetchSlot::Failed(e.to_string())
            }
        };
        state.refresh_labels(self.directory.as_ref());
    }
}
