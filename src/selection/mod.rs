//! Hover/sticky selection for one result list panel.
//!
//! State transitions are synchronous. Whenever a transition needs detailed
//! stats it hands back a `FetchTicket` naming the `(side, target_id)` it was
//! issued for; the caller runs the fetch and reports the outcome through
//! `apply_fetch`. An outcome is applied only while the panel still points at
//! the ticket's `(side, target_id)`, so the last selection wins no matter
//! in which order fetches complete.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{StatsBlob, StatsKey};

/// Which column of a two-sided comparison a panel belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    None,
    Hovered,
    Sticky,
}

/// What the panel's detail preview shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionState {
    pub mode: SelectionMode,
    pub side: Option<Side>,
    pub target_id: Option<String>,
    pub stats_loading: bool,
    pub stats_blob: Option<Arc<StatsBlob>>,
    /// Last detail fetch failure for the current target
    pub last_error: Option<String>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            mode: SelectionMode::None,
            side: None,
            target_id: None,
            stats_loading: false,
            stats_blob: None,
            last_error: None,
        }
    }
}

/// A detail fetch issued for one `(side, target_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub side: Option<Side>,
    pub target_id: String,
    pub stats_ref: String,
    pub key: StatsKey,
    /// Issued by a click rather than a hover
    pub foreground: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PointerRow {
    id: String,
    stats_ref: Option<String>,
}

/// Selection state machine for one panel.
#[derive(Debug, Clone)]
pub struct SelectionController {
    side: Option<Side>,
    state: SelectionState,
    pointer: Option<PointerRow>,
}

impl SelectionController {
    pub fn new(side: Option<Side>) -> Self {
        Self {
            side,
            state: SelectionState::default(),
            pointer: None,
        }
    }

    pub fn side(&self) -> Option<Side> {
        self.side
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn is_sticky(&self) -> bool {
        self.state.mode == SelectionMode::Sticky
    }

    fn target(&mut self, mode: SelectionMode, id: &str, stats_ref: Option<&str>) -> Option<FetchTicket> {
        let foreground = mode == SelectionMode::Sticky;
        self.state = SelectionState {
            mode,
            side: self.side,
            target_id: Some(id.to_string()),
            stats_loading: foreground && stats_ref.is_some(),
            stats_blob: None,
            last_error: None,
        };

        stats_ref.map(|r| FetchTicket {
            side: self.side,
            target_id: id.to_string(),
            stats_ref: r.to_string(),
            key: StatsKey::for_stats_ref(r),
            foreground,
        })
    }

    /// Pointer moved onto a row.
    ///
    /// Never overrides a sticky selection; otherwise previews the row and
    /// asks for its stats in the background.
    pub fn pointer_enter(&mut self, id: &str, stats_ref: Option<&str>) -> Option<FetchTicket> {
        self.pointer = Some(PointerRow {
            id: id.to_string(),
            stats_ref: stats_ref.map(str::to_string),
        });

        if self.is_sticky() {
            return None;
        }
        if self.state.mode == SelectionMode::Hovered
            && self.state.target_id.as_deref() == Some(id)
            && self.state.stats_blob.is_some()
        {
            return None;
        }

        self.target(SelectionMode::Hovered, id, stats_ref)
    }

    /// Pointer left a row. Sticky selections are unaffected.
    pub fn pointer_leave(&mut self, id: &str) {
        if self.pointer.as_ref().map(|p| p.id.as_str()) == Some(id) {
            self.pointer = None;
        }

        if self.state.mode == SelectionMode::Hovered && self.state.target_id.as_deref() == Some(id) {
            self.state = SelectionState::default();
        }
    }

    /// Row clicked: toggles a sticky selection.
    ///
    /// Clicking the sticky row again releases it and falls back to whatever
    /// the pointer rests on.
    pub fn click(&mut self, id: &str, stats_ref: Option<&str>) -> Option<FetchTicket> {
        if self.is_sticky() && self.state.target_id.as_deref() == Some(id) {
            debug!("Releasing sticky selection on {}", id);
            return match self.pointer.clone() {
                Some(p) => self.target(SelectionMode::Hovered, &p.id, p.stats_ref.as_deref()),
                None => {
                    self.state = SelectionState::default();
                    None
                }
            };
        }

        self.target(SelectionMode::Sticky, id, stats_ref)
    }

    /// Would a completion for `ticket` still be shown?
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.state.mode != SelectionMode::None
            && self.state.side == ticket.side
            && self.state.target_id.as_deref() == Some(ticket.target_id.as_str())
    }

    /// Apply a finished fetch, unless the selection has moved on.
    pub fn apply_fetch(&mut self, ticket: &FetchTicket, result: Result<Arc<StatsBlob>, String>) -> FetchOutcome {
        if !self.is_current(ticket) {
            debug!(
                "Discarding stale stats for {} (now on {:?})",
                ticket.target_id, self.state.target_id
            );
            return FetchOutcome::Discarded;
        }

        self.state.stats_loading = false;
        match result {
            Ok(blob) => {
                self.state.stats_blob = Some(blob);
                self.state.last_error = None;
            }
            Err(e) => {
                self.state.last_error = Some(e);
            }
        }
        FetchOutcome::Applied
    }

    /// Apply an already-cached blob without going through a fetch.
    pub fn prime(&mut self, ticket: &FetchTicket, blob: Arc<StatsBlob>) -> FetchOutcome {
        self.apply_fetch(ticket, Ok(blob))
    }

    /// Back to the initial state; used when the session changes teams or period.
    pub fn reset(&mut self) {
        self.state = SelectionState::default();
        self.pointer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(map: &str) -> Arc<StatsBlob> {
        Arc::new(StatsBlob {
            map: map.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_initial_state() {
        let ctl = SelectionController::new(None);
        assert_eq!(ctl.state(), &SelectionState::default());
    }

    #[test]
    fn test_hover_previews_and_requests_background_fetch() {
        let mut ctl = SelectionController::new(Some(Side::Left));
        let ticket = ctl.pointer_enter("g1", Some("r1")).unwrap();

        assert!(!ticket.foreground);
        assert_eq!(ticket.side, Some(Side::Left));
        assert_eq!(ticket.key, StatsKey::for_stats_ref("r1"));
        assert_eq!(ctl.state().mode, SelectionMode::Hovered);
        assert_eq!(ctl.state().side, Some(Side::Left));
        assert!(!ctl.state().stats_loading);

        assert_eq!(ctl.apply_fetch(&ticket, Ok(blob("dm3"))), FetchOutcome::Applied);
        assert_eq!(ctl.state().stats_blob.as_ref().unwrap().map, "dm3");
    }

    #[test]
    fn test_hover_without_stats_ref_issues_no_fetch() {
        let mut ctl = SelectionController::new(None);
        assert!(ctl.pointer_enter("legacy", None).is_none());
        assert_eq!(ctl.state().mode, SelectionMode::Hovered);
        assert!(ctl.state().stats_blob.is_none());
    }

    #[test]
    fn test_hover_never_overrides_sticky() {
        let mut ctl = SelectionController::new(None);
        ctl.click("g1", Some("r1"));
        assert!(ctl.pointer_enter("g2", Some("r2")).is_none());

        assert_eq!(ctl.state().mode, SelectionMode::Sticky);
        assert_eq!(ctl.state().target_id.as_deref(), Some("g1"));
    }

    #[test]
    fn test_pointer_leave_clears_matching_hover_only() {
        let mut ctl = SelectionController::new(None);
        ctl.pointer_enter("g1", Some("r1"));
        ctl.pointer_leave("g2");
        assert_eq!(ctl.state().mode, SelectionMode::Hovered);

        ctl.pointer_leave("g1");
        assert_eq!(ctl.state(), &SelectionState::default());
    }

    #[test]
    fn test_pointer_leave_never_affects_sticky() {
        let mut ctl = SelectionController::new(None);
        ctl.pointer_enter("g1", Some("r1"));
        ctl.click("g1", Some("r1"));
        ctl.pointer_leave("g1");
        assert_eq!(ctl.state().mode, SelectionMode::Sticky);
        assert_eq!(ctl.state().target_id.as_deref(), Some("g1"));
    }

    #[test]
    fn test_click_sets_sticky_and_loading() {
        let mut ctl = SelectionController::new(None);
        let ticket = ctl.click("g1", Some("r1")).unwrap();

        assert!(ticket.foreground);
        assert_eq!(ctl.state().mode, SelectionMode::Sticky);
        assert!(ctl.state().stats_loading);

        ctl.apply_fetch(&ticket, Ok(blob("dm3")));
        assert!(!ctl.state().stats_loading);
        assert!(ctl.state().stats_blob.is_some());
    }

    #[test]
    fn test_click_sticky_row_toggles_back_to_pointer_hover() {
        let mut ctl = SelectionController::new(None);
        ctl.pointer_enter("g1", Some("r1"));
        ctl.click("g1", Some("r1"));

        let ticket = ctl.click("g1", Some("r1")).unwrap();
        assert_eq!(ctl.state().mode, SelectionMode::Hovered);
        assert_eq!(ctl.state().target_id.as_deref(), Some("g1"));
        assert!(!ticket.foreground);
    }

    #[test]
    fn test_click_sticky_row_without_pointer_goes_to_none() {
        let mut ctl = SelectionController::new(None);
        ctl.click("g1", Some("r1"));
        assert!(ctl.click("g1", Some("r1")).is_none());
        assert_eq!(ctl.state(), &SelectionState::default());
    }

    #[test]
    fn test_click_other_row_moves_sticky() {
        let mut ctl = SelectionController::new(None);
        ctl.click("g1", Some("r1"));
        let ticket = ctl.click("g2", Some("r2")).unwrap();
        assert_eq!(ticket.target_id, "g2");
        assert_eq!(ctl.state().mode, SelectionMode::Sticky);
        assert_eq!(ctl.state().target_id.as_deref(), Some("g2"));
        assert!(ctl.state().stats_loading);
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut ctl = SelectionController::new(None);
        let ticket_a = ctl.click("A", Some("ra")).unwrap();
        let ticket_b = ctl.click("B", Some("rb")).unwrap();

        // A resolves late: must not touch B's view.
        assert_eq!(
            ctl.apply_fetch(&ticket_a, Ok(blob("dm3"))),
            FetchOutcome::Discarded
        );
        assert_eq!(ctl.state().target_id.as_deref(), Some("B"));
        assert!(ctl.state().stats_loading);
        assert!(ctl.state().stats_blob.is_none());

        assert_eq!(
            ctl.apply_fetch(&ticket_b, Ok(blob("e1m2"))),
            FetchOutcome::Applied
        );
        assert_eq!(ctl.state().stats_blob.as_ref().unwrap().map, "e1m2");

        // And a late A after B landed still changes nothing.
        ctl.apply_fetch(&ticket_a, Ok(blob("dm3")));
        assert_eq!(ctl.state().stats_blob.as_ref().unwrap().map, "e1m2");
    }

    #[test]
    fn test_stale_fetch_after_hover_moves_on() {
        let mut ctl = SelectionController::new(None);
        let t1 = ctl.pointer_enter("g1", Some("r1")).unwrap();
        ctl.pointer_leave("g1");
        let _t2 = ctl.pointer_enter("g2", Some("r2")).unwrap();

        assert_eq!(ctl.apply_fetch(&t1, Ok(blob("dm3"))), FetchOutcome::Discarded);
        assert!(ctl.state().stats_blob.is_none());
    }

    #[test]
    fn test_fetch_after_clear_is_discarded() {
        let mut ctl = SelectionController::new(None);
        let t = ctl.pointer_enter("g1", Some("r1")).unwrap();
        ctl.pointer_leave("g1");
        assert_eq!(ctl.apply_fetch(&t, Ok(blob("dm3"))), FetchOutcome::Discarded);
        assert_eq!(ctl.state(), &SelectionState::default());
    }

    #[test]
    fn test_foreground_failure_clears_loading() {
        let mut ctl = SelectionController::new(None);
        let t = ctl.click("g1", Some("r1")).unwrap();
        ctl.apply_fetch(&t, Err("HTTP 503".to_string()));

        assert!(!ctl.state().stats_loading);
        assert_eq!(ctl.state().last_error.as_deref(), Some("HTTP 503"));
        assert_eq!(ctl.state().mode, SelectionMode::Sticky);
    }

    #[test]
    fn test_two_controllers_are_independent() {
        let mut left = SelectionController::new(Some(Side::Left));
        let mut right = SelectionController::new(Some(Side::Right));

        let tl = left.click("g1", Some("r1")).unwrap();
        let tr = right.pointer_enter("g9", Some("r9")).unwrap();

        assert_eq!(left.state().mode, SelectionMode::Sticky);
        assert_eq!(right.state().mode, SelectionMode::Hovered);

        // A ticket from one side never applies to the other.
        assert_eq!(right.apply_fetch(&tl, Ok(blob("dm3"))), FetchOutcome::Discarded);
        assert_eq!(left.apply_fetch(&tr, Ok(blob("dm3"))), FetchOutcome::Discarded);
    }

    #[test]
    fn test_prime_skips_loading() {
        let mut ctl = SelectionController::new(None);
        let t = ctl.click("g1", Some("r1")).unwrap();
        assert_eq!(ctl.prime(&t, blob("dm3")), FetchOutcome::Applied);
        assert!(!ctl.state().stats_loading);
        assert!(ctl.state().stats_blob.is_some());
    }

    #[test]
    fn test_reset() {
        let mut ctl = SelectionController::new(Some(Side::Right));
        ctl.pointer_enter("g1", Some("r1"));
        ctl.click("g1", Some("r1"));
        ctl.reset();
        assert_eq!(ctl.state(), &SelectionState::default());

        // Pointer memory is gone too: hover then click-toggle goes to None.
        ctl.click("g2", Some("r2"));
        assert!(ctl.click("g2", Some("r2")).is_none());
        assert_eq!(ctl.state().mode, SelectionMode::None);
    }
}
